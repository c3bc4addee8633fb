// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use crate::asg::{Identifier, QubitOperand, StmtId};
use crate::builtins::GeneratorRegistry;
use crate::semantic_error::SemanticErrorKind::*;
use crate::semantic_error::{SemanticError, SemanticErrorKind, SemanticResult};
use crate::symbols::{Signature, SymbolId, SymbolKind, SymbolTable};
use crate::TextRange;
use hashbrown::HashMap;

/// A defcal overload, recorded so that invocations can be matched against it.
#[derive(Clone, Debug)]
pub(crate) struct DefCalOverload {
    pub(crate) qubits: Vec<Option<u32>>,
    pub(crate) symbol: SymbolId,
    pub(crate) signature: Signature,
}

/// State carried through one traversal of the semantic analyzer.
#[derive(Clone, Debug)]
pub struct Context {
    pub symbol_table: SymbolTable,
    pub(crate) defcals: HashMap<String, Vec<DefCalOverload>>,
    stmt_counter: u32,
}

impl Context {
    pub(crate) fn new(registry: &GeneratorRegistry) -> SemanticResult<Context> {
        let mut symbol_table = SymbolTable::new();
        for generator in registry.iter() {
            symbol_table
                .declare(
                    generator.name(),
                    SymbolKind::Generator(generator.signature().clone()),
                )
                .map_err(|err| {
                    SemanticError::new(
                        SemanticErrorKind::from_symbol_error(err, generator.name()),
                        TextRange::default(),
                    )
                })?;
        }
        Ok(Context {
            symbol_table,
            defcals: HashMap::new(),
            stmt_counter: 0,
        })
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub(crate) fn next_stmt_id(&mut self) -> StmtId {
        let id = StmtId::new(self.stmt_counter);
        self.stmt_counter += 1;
        id
    }

    /// Bind the name of `ident` in the current scope and annotate `ident` with the new symbol.
    pub(crate) fn declare(
        &mut self,
        ident: &mut Identifier,
        kind: SymbolKind,
    ) -> SemanticResult<SymbolId> {
        let symbol_id = self
            .symbol_table
            .declare(ident.name(), kind)
            .map_err(|err| {
                SemanticError::new(
                    SemanticErrorKind::from_symbol_error(err, ident.name()),
                    ident.range(),
                )
            })?;
        log::trace!("declare `{}` as {:?}", ident.name(), symbol_id);
        ident.set_symbol(symbol_id);
        Ok(symbol_id)
    }

    /// Look up the name of `ident` and annotate `ident` with the symbol found.
    pub(crate) fn resolve(&mut self, ident: &mut Identifier) -> SemanticResult<SymbolId> {
        let symbol_id = self
            .symbol_table
            .resolve(ident.name())
            .map_err(|err| {
                SemanticError::new(
                    SemanticErrorKind::from_symbol_error(err, ident.name()),
                    ident.range(),
                )
            })?
            .symbol_id();
        ident.set_symbol(symbol_id);
        Ok(symbol_id)
    }

    pub(crate) fn leave_scope(&mut self, range: TextRange) -> SemanticResult<()> {
        self.symbol_table
            .leave()
            .map(|_| ())
            .map_err(|_| SemanticError::new(ScopeUnderflow, range))
    }

    pub(crate) fn leave_calibration(&mut self, range: TextRange) -> SemanticResult<()> {
        self.symbol_table
            .leave_calibration()
            .map_err(|_| SemanticError::new(ScopeUnderflow, range))
    }

    pub(crate) fn record_defcal(
        &mut self,
        name: &str,
        qubits: &[QubitOperand],
        symbol: SymbolId,
        signature: Signature,
    ) {
        self.defcals
            .entry(name.to_string())
            .or_default()
            .push(DefCalOverload {
                qubits: qubits.iter().map(QubitOperand::hardware_index).collect(),
                symbol,
                signature,
            });
    }

    pub fn into_symbol_table(self) -> SymbolTable {
        self.symbol_table
    }
}

/// Run `$code` inside a new scope of kind `$scope`, leaving the scope afterwards.
/// `$code` evaluates to a `SemanticResult`, which is returned after the scope is left.
#[macro_export]
macro_rules! with_scope {
    ($ctxt:ident, $scope:path, $range:expr, $code:block) => {{
        $ctxt.symbol_table.enter($scope);
        let result = $code;
        $ctxt.leave_scope($range)?;
        result
    }};
}
