// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Scope table for OpenPulse programs: symbols, their kinds, and the stack of scopes
// the analyzer pushes while walking a program.

use crate::types::{IsConst, Type};
use hashbrown::HashMap;
use std::fmt;

// OQ3
// * "The lifetime of each identifier begins when it is declared, and ends
//    at the completion of the scope it was declared in."

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Top-level. Always present, never popped.
    Global,
    /// Body of `def`
    Subroutine,
    /// Body of `defcal`
    DefCal,
    /// Control flow blocks
    Local,
}

// Identity of a declared symbol. Doubles as the index of the symbol in the table's
// flat list, so ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

impl SymbolId {
    pub fn new() -> SymbolId {
        SymbolId(0)
    }

    /// Post-increment the value, and return the old value.
    pub fn post_increment(&mut self) -> SymbolId {
        let old_val = *self;
        self.0 += 1;
        old_val
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SymbolId> for usize {
    fn from(symid: SymbolId) -> usize {
        symid.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolError {
    MissingBinding,
    AlreadyBound,
    ScopeUnderflow,
}

pub type SymbolIdResult = Result<SymbolId, SymbolError>;

/// Parameter names and types plus the return type of something callable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    params: Vec<(String, Type)>,
    return_type: Option<Type>,
}

impl Signature {
    pub fn new(params: Vec<(String, Type)>, return_type: Option<Type>) -> Signature {
        Signature {
            params,
            return_type,
        }
    }

    pub fn params(&self) -> &[(String, Type)] {
        &self.params
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.return_type.as_ref()
    }

    /// Index of the parameter called `name`, if any.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|(n, _)| n == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Port,
    Frame,
    Waveform,
    Qubit,
    /// Classical values: variables, constants, inputs, loop variables, parameters.
    Classical(Type),
    /// `def` subroutines
    Subroutine(Signature),
    /// `defcal` calibration definitions, bound under their mangled name.
    DefCal(Signature),
    /// Waveform generator functions from the registry.
    Generator(Signature),
    /// Predefined constants such as `pi`.
    Builtin,
}

impl SymbolKind {
    pub fn symbol_type(&self) -> Type {
        match self {
            SymbolKind::Port => Type::Port,
            SymbolKind::Frame => Type::Frame,
            SymbolKind::Waveform => Type::Waveform,
            SymbolKind::Qubit => Type::Qubit,
            SymbolKind::Classical(ty) => ty.clone(),
            SymbolKind::Builtin => Type::Float(None, IsConst::True),
            SymbolKind::Subroutine(sig) | SymbolKind::DefCal(sig) | SymbolKind::Generator(sig) => {
                sig.return_type().cloned().unwrap_or(Type::Void)
            }
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Subroutine(_) | SymbolKind::DefCal(_) | SymbolKind::Generator(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
    scope: ScopeKind,
}

impl Symbol {
    fn new<T: ToString>(name: T, kind: SymbolKind, scope: ScopeKind) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            scope,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    /// The kind of scope the symbol was declared in.
    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    pub fn symbol_type(&self) -> Type {
        self.kind.symbol_type()
    }
}

/// What `SymbolTable::resolve` found for a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolRecord<'a> {
    symbol: &'a Symbol,
    symbol_id: SymbolId,
    scope_level: usize,
}

impl SymbolRecord<'_> {
    pub fn new(symbol: &Symbol, symbol_id: SymbolId, scope_level: usize) -> SymbolRecord<'_> {
        SymbolRecord {
            symbol,
            symbol_id,
            scope_level,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        self.symbol
    }

    pub fn symbol_id(&self) -> SymbolId {
        self.symbol_id
    }

    /// Depth of the scope that binds the name; the global scope is level 0.
    pub fn scope_level(&self) -> usize {
        self.scope_level
    }
}

/// Bindings made in one open scope.
#[derive(Clone, Debug, PartialEq, Eq)]
struct SymbolMap {
    table: HashMap<String, SymbolId>,
    scope_kind: ScopeKind,
}

impl SymbolMap {
    fn new(scope_kind: ScopeKind) -> SymbolMap {
        SymbolMap {
            table: HashMap::<String, SymbolId>::new(),
            scope_kind,
        }
    }

    fn insert<T: ToString>(&mut self, name: T, sym: SymbolId) {
        self.table.insert(name.to_string(), sym);
    }

    fn get_symbol_id(&self, name: &str) -> Option<&SymbolId> {
        self.table.get(name)
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn contains_name(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

/// Statement classes whose legality depends on the scope they appear in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StmtClass {
    /// `delay`, `play`, `capture`, frame updates and port/frame/waveform declarations.
    Calibration,
    /// `cal`, `def`, `defcal`, `defcalgrammar` and `input` declarations.
    TopLevel,
    /// `return`
    Return,
    /// Everything else, including `barrier`.
    Anywhere,
}

/// Where the traversal currently is, as far as statement legality is concerned.
/// `enclosing` is the kind of the innermost scope that is not `Local`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeState {
    pub enclosing: ScopeKind,
    pub local: bool,
    pub calibration: bool,
}

/// The transition table of legal statement classes per scope state.
pub fn is_legal(class: StmtClass, state: ScopeState) -> bool {
    use ScopeKind::*;
    match (class, state.enclosing) {
        (StmtClass::Anywhere, _) => true,
        (StmtClass::Calibration, DefCal) => true,
        (StmtClass::Calibration, Global) => state.calibration,
        (StmtClass::Calibration, Subroutine | Local) => false,
        (StmtClass::TopLevel, Global) => !state.local && !state.calibration,
        (StmtClass::TopLevel, _) => false,
        (StmtClass::Return, Global) => false,
        (StmtClass::Return, _) => true,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolTable {
    /// Open scopes, innermost last.
    symbol_table_stack: Vec<SymbolMap>,
    /// Every symbol ever declared, indexed by `SymbolId`.
    all_symbols: Vec<Symbol>,
    symbol_id_counter: SymbolId,
    /// Nesting depth of `cal` blocks. These do not open a scope.
    calibration_depth: usize,
}

// Constants bound in the global scope before anything is declared.
pub const BUILTIN_CONSTS: [(&str, f64); 6] = [
    ("pi", std::f64::consts::PI),
    ("π", std::f64::consts::PI),
    ("tau", std::f64::consts::TAU),
    ("τ", std::f64::consts::TAU),
    ("euler", std::f64::consts::E),
    ("ℇ", std::f64::consts::E),
];

/// Value of the builtin constant `name`.
pub fn builtin_value(name: &str) -> Option<f64> {
    BUILTIN_CONSTS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, value)| *value)
}

impl SymbolTable {
    /// Create a new `SymbolTable` and initialize with the global scope.
    pub fn new() -> SymbolTable {
        let mut symbol_table = SymbolTable {
            symbol_id_counter: SymbolId::new(),
            symbol_table_stack: vec![SymbolMap::new(ScopeKind::Global)],
            all_symbols: Vec::<Symbol>::new(),
            calibration_depth: 0,
        };
        symbol_table.make_builtins();
        symbol_table
    }

    fn make_builtins(&mut self) {
        for (name, _) in BUILTIN_CONSTS {
            let _ = self.declare(name, SymbolKind::Builtin);
        }
    }

    pub fn number_of_scopes(&self) -> usize {
        self.symbol_table_stack.len()
    }

    /// Push a new scope of kind `kind`.
    ///
    /// # Panics
    /// The unique global scope is created with the table; entering another is a bug.
    pub fn enter(&mut self, kind: ScopeKind) {
        assert!(
            kind != ScopeKind::Global,
            "The unique global scope must be the first scope."
        );
        log::trace!("enter scope {kind:?}");
        self.symbol_table_stack.push(SymbolMap::new(kind))
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn leave(&mut self) -> Result<ScopeKind, SymbolError> {
        if self.number_of_scopes() <= 1 {
            return Err(SymbolError::ScopeUnderflow);
        }
        let map = self
            .symbol_table_stack
            .pop()
            .ok_or(SymbolError::ScopeUnderflow)?;
        log::trace!("leave scope {:?}", map.scope_kind);
        Ok(map.scope_kind)
    }

    pub fn enter_calibration(&mut self) {
        self.calibration_depth += 1;
    }

    pub fn leave_calibration(&mut self) -> Result<(), SymbolError> {
        self.calibration_depth = self
            .calibration_depth
            .checked_sub(1)
            .ok_or(SymbolError::ScopeUnderflow)?;
        Ok(())
    }

    /// If a binding for `name` exists in the current scope, return `Err(AlreadyBound)`.
    /// Otherwise, create a new Symbol from `name` and `kind`, bind `name` to
    /// this Symbol in the current scope, and return its id.
    pub fn declare(&mut self, name: &str, kind: SymbolKind) -> Result<SymbolId, SymbolError> {
        if self.current_scope().contains_name(name) {
            return Err(SymbolError::AlreadyBound);
        }
        let scope = self.current_kind();
        self.all_symbols.push(Symbol::new(name, kind, scope));
        let current_symbol_id = self.symbol_id_counter.post_increment();
        self.current_scope_mut().insert(name, current_symbol_id);
        Ok(current_symbol_id)
    }

    // The stack is never empty: the global scope cannot be popped.
    fn current_scope_mut(&mut self) -> &mut SymbolMap {
        let top = self.symbol_table_stack.len() - 1;
        &mut self.symbol_table_stack[top]
    }

    fn current_scope(&self) -> &SymbolMap {
        &self.symbol_table_stack[self.symbol_table_stack.len() - 1]
    }

    /// Return the `ScopeKind` of the current, or top-most, scope.
    pub fn current_kind(&self) -> ScopeKind {
        self.current_scope().scope_kind
    }

    pub fn in_calibration(&self) -> bool {
        self.calibration_depth > 0
    }

    pub fn scope_state(&self) -> ScopeState {
        let enclosing = self
            .symbol_table_stack
            .iter()
            .rev()
            .map(|map| map.scope_kind)
            .find(|kind| *kind != ScopeKind::Local)
            .unwrap_or(ScopeKind::Global);
        ScopeState {
            enclosing,
            local: self.current_kind() == ScopeKind::Local,
            calibration: self.in_calibration(),
        }
    }

    /// Return `true` if statements of class `class` may appear at the current position.
    pub fn allows(&self, class: StmtClass) -> bool {
        is_legal(class, self.scope_state())
    }

    /// Return the length (number of bindings) in the current scope.
    pub fn len_current_scope(&self) -> usize {
        self.current_scope().len()
    }

    /// Look up `name` in the current scope only.
    pub fn lookup_current_scope(&self, name: &str) -> Option<SymbolId> {
        self.current_scope().get_symbol_id(name).copied()
    }

    /// Look up `name` in the stack of symbol tables, innermost first.
    pub fn resolve(&self, name: &str) -> Result<SymbolRecord<'_>, SymbolError> {
        for (scope_level_rev, table) in self.symbol_table_stack.iter().rev().enumerate() {
            if let Some(symbol_id) = table.get_symbol_id(name) {
                let symbol = &self.all_symbols[symbol_id.0];
                let scope_level = self.number_of_scopes() - scope_level_rev - 1;
                return Ok(SymbolRecord::new(symbol, *symbol_id, scope_level));
            }
        }
        Err(SymbolError::MissingBinding) // `name` not found in any scope.
    }

    /// All symbols ever declared, in order of declaration.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.all_symbols
            .iter()
            .enumerate()
            .map(|(i, sym)| (SymbolId(i), sym))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

use std::ops::Index;
impl Index<&SymbolId> for SymbolTable {
    type Output = Symbol;

    // Interface for retrieving `Symbol`s from `all_symbols`
    fn index(&self, symbol_id: &SymbolId) -> &Self::Output {
        &self.all_symbols[symbol_id.0]
    }
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::MissingBinding => write!(f, "name is not bound in any open scope"),
            SymbolError::AlreadyBound => write!(f, "name is already bound in this scope"),
            SymbolError::ScopeUnderflow => write!(f, "no scope to leave"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        let global = ScopeState {
            enclosing: ScopeKind::Global,
            local: false,
            calibration: false,
        };
        let global_cal = ScopeState {
            calibration: true,
            ..global
        };
        let loop_in_defcal = ScopeState {
            enclosing: ScopeKind::DefCal,
            local: true,
            calibration: false,
        };
        let subroutine = ScopeState {
            enclosing: ScopeKind::Subroutine,
            local: false,
            calibration: false,
        };
        assert!(!is_legal(StmtClass::Calibration, global));
        assert!(is_legal(StmtClass::Calibration, global_cal));
        assert!(is_legal(StmtClass::Calibration, loop_in_defcal));
        assert!(!is_legal(StmtClass::Calibration, subroutine));
        assert!(is_legal(StmtClass::TopLevel, global));
        assert!(!is_legal(StmtClass::TopLevel, global_cal));
        assert!(!is_legal(StmtClass::TopLevel, loop_in_defcal));
        assert!(!is_legal(StmtClass::Return, global));
        assert!(is_legal(StmtClass::Return, subroutine));
        assert!(is_legal(StmtClass::Anywhere, subroutine));
    }

    #[test]
    fn calibration_state_survives_local_scopes() {
        let mut table = SymbolTable::new();
        table.enter_calibration();
        table.enter(ScopeKind::Local);
        assert!(table.allows(StmtClass::Calibration));
        assert!(table.leave().is_ok());
        assert!(table.leave_calibration().is_ok());
        assert!(!table.allows(StmtClass::Calibration));
        assert_eq!(table.leave_calibration(), Err(SymbolError::ScopeUnderflow));
    }
}
