// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// The definition of the abstract semantic graph (ASG) for pulse programs, as well as the API
// for constructing and walking it.
//
// Programs arrive here already parsed. Every node that names something holds an `Identifier`,
// whose `symbol` slot is filled in by the semantic analyzer. Later passes only read that slot.
// The other annotation slots are `Stmt::duration`, `Barrier::sync_times` and
// `DeclareWaveform::table_index`; each is written by exactly one pass.

use crate::symbols::SymbolId;
use crate::types::Type;
use crate::TextRange;
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Program {
        Program {
            stmts: Vec::<Stmt>::new(),
        }
    }

    pub fn from_stmts(stmts: Vec<Stmt>) -> Program {
        Program { stmts }
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    pub fn stmts_mut(&mut self) -> &mut Vec<Stmt> {
        &mut self.stmts
    }

    pub fn insert_stmt(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    /// Visit every statement, including nested ones, in pre-order.
    pub fn walk<F: FnMut(&Stmt)>(&self, f: &mut F) {
        walk_stmts(&self.stmts, f);
    }

    /// Print the ASG using the pretty print `Debug` trait.
    pub fn print_asg_debug_pretty(&self) {
        for stmt in self.iter() {
            println!("{stmt:#?}");
        }
    }
}

// Forward `Vec` methods to the program statements.
impl std::ops::Deref for Program {
    type Target = Vec<Stmt>;

    fn deref(&self) -> &Self::Target {
        &self.stmts
    }
}

pub fn walk_stmts<'a, F: FnMut(&'a Stmt)>(stmts: &'a [Stmt], f: &mut F) {
    for stmt in stmts {
        f(stmt);
        for block in stmt.blocks() {
            walk_stmts(block.statements(), f);
        }
    }
}

/// Pre-order number of a statement, assigned by the semantic analyzer.
/// Ids survive cloning, so a statement keeps its id in every split program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    pub fn new(id: u32) -> StmtId {
        StmtId(id)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Duration of a statement in samples, over every time it was evaluated.
/// A statement inside a loop or a reused defcal may be evaluated with different durations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedDuration {
    pub min: u64,
    pub max: u64,
}

impl ResolvedDuration {
    pub fn fixed(samples: u64) -> ResolvedDuration {
        ResolvedDuration {
            min: samples,
            max: samples,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn include(&mut self, samples: u64) {
        self.min = self.min.min(samples);
        self.max = self.max.max(samples);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    id: StmtId,
    range: TextRange,
    kind: StmtKind,
    duration: Option<ResolvedDuration>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Stmt {
        Stmt {
            id: StmtId::default(),
            range: TextRange::default(),
            kind,
            duration: None,
        }
    }

    pub fn with_range(mut self, range: TextRange) -> Stmt {
        self.range = range;
        self
    }

    pub fn id(&self) -> StmtId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: StmtId) {
        self.id = id;
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn kind(&self) -> &StmtKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut StmtKind {
        &mut self.kind
    }

    pub fn duration(&self) -> Option<ResolvedDuration> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: ResolvedDuration) {
        self.duration = Some(duration);
    }

    /// Replace the kind, keeping id, range and annotations.
    pub fn with_kind(&self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.id,
            range: self.range,
            kind,
            duration: self.duration,
        }
    }

    /// Blocks directly owned by this statement.
    pub fn blocks(&self) -> Vec<&Block> {
        use StmtKind::*;
        match &self.kind {
            DefStmt(def) => vec![&def.body],
            DefCal(defcal) => vec![&defcal.body],
            Cal(block) => vec![block],
            ForStmt(for_stmt) => vec![&for_stmt.body],
            While(while_stmt) => vec![&while_stmt.body],
            If(if_stmt) => match &if_stmt.else_branch {
                Some(else_branch) => vec![&if_stmt.then_branch, else_branch],
                None => vec![&if_stmt.then_branch],
            },
            _ => Vec::new(),
        }
    }

    pub fn blocks_mut(&mut self) -> Vec<&mut Block> {
        use StmtKind::*;
        match &mut self.kind {
            DefStmt(def) => vec![&mut def.body],
            DefCal(defcal) => vec![&mut defcal.body],
            Cal(block) => vec![block],
            ForStmt(for_stmt) => vec![&mut for_stmt.body],
            While(while_stmt) => vec![&mut while_stmt.body],
            If(if_stmt) => match &mut if_stmt.else_branch {
                Some(else_branch) => vec![&mut if_stmt.then_branch, else_branch],
                None => vec![&mut if_stmt.then_branch],
            },
            _ => Vec::new(),
        }
    }

    /// The identifier introduced by a declaration, if this statement is one.
    pub fn declared_identifier(&self) -> Option<&Identifier> {
        use StmtKind::*;
        match &self.kind {
            DeclarePort(decl) => Some(&decl.name),
            DeclareFrame(decl) => Some(&decl.name),
            DeclareWaveform(decl) => Some(&decl.name),
            DeclareClassical(decl) => Some(&decl.name),
            InputDeclaration(decl) | OutputDeclaration(decl) => Some(&decl.name),
            DefStmt(def) => Some(&def.name),
            DefCal(defcal) => Some(&defcal.name),
            _ => None,
        }
    }

    /// Identifiers this statement refers to, not counting the name it declares
    /// or anything inside nested blocks.
    pub fn referenced_identifiers(&self) -> Vec<&Identifier> {
        use StmtKind::*;
        let mut refs = Vec::new();
        match &self.kind {
            CalibrationGrammar(_) | DeclarePort(_) | InputDeclaration(_) | OutputDeclaration(_) => {}
            DeclareFrame(decl) => {
                refs.push(&decl.port);
                decl.frequency.collect_identifiers(&mut refs);
                decl.phase.collect_identifiers(&mut refs);
            }
            DeclareWaveform(decl) => decl.value.collect_identifiers(&mut refs),
            DeclareClassical(decl) => {
                if let Some(init) = &decl.initializer {
                    init.collect_identifiers(&mut refs);
                }
            }
            DefStmt(_) | DefCal(_) | Cal(_) => {}
            GateCall(call) => {
                refs.push(&call.name);
                for arg in &call.args {
                    arg.collect_identifiers(&mut refs);
                }
                for qubit in &call.qubits {
                    if let QubitOperand::Named(ident) = qubit {
                        refs.push(ident);
                    }
                }
            }
            ExprStmt(expr) => expr.collect_identifiers(&mut refs),
            Assignment(assign) => {
                refs.push(&assign.target);
                assign.value.collect_identifiers(&mut refs);
            }
            Return(value) => {
                if let Some(value) = value {
                    value.collect_identifiers(&mut refs);
                }
            }
            ForStmt(for_stmt) => match &for_stmt.iterable {
                ForIterable::Range { start, step, stop } => {
                    start.collect_identifiers(&mut refs);
                    if let Some(step) = step {
                        step.collect_identifiers(&mut refs);
                    }
                    stop.collect_identifiers(&mut refs);
                }
                ForIterable::Set(values) => {
                    for value in values {
                        value.collect_identifiers(&mut refs);
                    }
                }
            },
            While(while_stmt) => while_stmt.condition.collect_identifiers(&mut refs),
            If(if_stmt) => if_stmt.condition.collect_identifiers(&mut refs),
            Delay(delay) => {
                delay.duration.collect_identifiers(&mut refs);
                refs.extend(delay.frames.iter());
            }
            Play(op) | Capture(op) => {
                refs.push(&op.frame);
                op.waveform.collect_identifiers(&mut refs);
            }
            Barrier(barrier) => {
                if let Some(frames) = &barrier.frames {
                    refs.extend(frames.iter());
                }
            }
            FrameUpdate(update) => {
                refs.push(&update.frame);
                update.value.collect_identifiers(&mut refs);
            }
        }
        refs
    }

    pub fn is_timed(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::Delay(_) | StmtKind::Play(_) | StmtKind::Capture(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    CalibrationGrammar(String),
    DeclarePort(DeclarePort),
    DeclareFrame(DeclareFrame),
    DeclareWaveform(DeclareWaveform),
    DeclareClassical(Box<DeclareClassical>),
    InputDeclaration(IODeclaration),
    OutputDeclaration(IODeclaration),
    DefStmt(DefStmt),
    DefCal(DefCal),
    Cal(Block),
    GateCall(GateCall), // Invocation of a defcal
    ExprStmt(Expr),
    Assignment(Assignment),
    Return(Option<Expr>),
    ForStmt(ForStmt),
    While(While),
    If(If),
    Delay(Delay),
    Play(PulseOp),
    Capture(PulseOp),
    Barrier(Barrier),
    FrameUpdate(FrameUpdate),
}

impl StmtKind {
    pub fn to_stmt(self) -> Stmt {
        Stmt::new(self)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Block {
        Block { statements }
    }

    pub fn statements(&self) -> &[Stmt] {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut Vec<Stmt> {
        &mut self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    name: String,
    range: TextRange,
    symbol: Option<SymbolId>,
}

impl Identifier {
    pub fn new<T: ToString>(name: T) -> Identifier {
        Identifier {
            name: name.to_string(),
            range: TextRange::default(),
            symbol: None,
        }
    }

    pub fn with_range(mut self, range: TextRange) -> Identifier {
        self.range = range;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    /// The symbol this identifier resolved to. `None` before semantic analysis.
    pub fn symbol(&self) -> Option<SymbolId> {
        self.symbol
    }

    pub(crate) fn set_symbol(&mut self, symbol: SymbolId) {
        self.symbol = Some(symbol);
    }

    pub fn to_expr(self) -> Expr {
        Expr::Identifier(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclarePort {
    pub name: Identifier,
}

impl DeclarePort {
    pub fn new(name: Identifier) -> DeclarePort {
        DeclarePort { name }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::DeclarePort(self))
    }
}

// frame name = newframe(port, frequency, phase);
#[derive(Clone, Debug, PartialEq)]
pub struct DeclareFrame {
    pub name: Identifier,
    pub port: Identifier,
    pub frequency: Expr,
    pub phase: Expr,
}

impl DeclareFrame {
    pub fn new(name: Identifier, port: Identifier, frequency: Expr, phase: Expr) -> DeclareFrame {
        DeclareFrame {
            name,
            port,
            frequency,
            phase,
        }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::DeclareFrame(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclareWaveform {
    pub name: Identifier,
    pub value: Expr,
    table_index: Option<u16>,
}

impl DeclareWaveform {
    pub fn new(name: Identifier, value: Expr) -> DeclareWaveform {
        DeclareWaveform {
            name,
            value,
            table_index: None,
        }
    }

    /// Command table index assigned to this waveform.
    pub fn table_index(&self) -> Option<u16> {
        self.table_index
    }

    pub fn set_table_index(&mut self, index: u16) {
        self.table_index = Some(index);
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::DeclareWaveform(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeclareClassical {
    pub name: Identifier,
    pub ty: Type,
    pub initializer: Option<Expr>,
}

impl DeclareClassical {
    pub fn new(name: Identifier, ty: Type, initializer: Option<Expr>) -> DeclareClassical {
        DeclareClassical {
            name,
            ty,
            initializer,
        }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::DeclareClassical(Box::new(self)))
    }
}

// Used for both `input` and `output` declarations.
#[derive(Clone, Debug, PartialEq)]
pub struct IODeclaration {
    pub name: Identifier,
    pub ty: Type,
}

impl IODeclaration {
    pub fn new(name: Identifier, ty: Type) -> IODeclaration {
        IODeclaration { name, ty }
    }

    pub fn to_input_stmt(self) -> Stmt {
        Stmt::new(StmtKind::InputDeclaration(self))
    }

    pub fn to_output_stmt(self) -> Stmt {
        Stmt::new(StmtKind::OutputDeclaration(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Identifier,
    pub ty: Type,
}

impl Param {
    pub fn new(name: Identifier, ty: Type) -> Param {
        Param { name, ty }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DefStmt {
    pub name: Identifier,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: Block,
}

impl DefStmt {
    pub fn new(
        name: Identifier,
        params: Vec<Param>,
        return_type: Option<Type>,
        body: Block,
    ) -> DefStmt {
        DefStmt {
            name,
            params,
            return_type,
            body,
        }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::DefStmt(self))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QubitOperand {
    Hardware(u32),
    Named(Identifier),
}

impl QubitOperand {
    pub fn hardware_index(&self) -> Option<u32> {
        match self {
            QubitOperand::Hardware(index) => Some(*index),
            QubitOperand::Named(_) => None,
        }
    }
}

impl fmt::Display for QubitOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QubitOperand::Hardware(index) => write!(f, "${index}"),
            QubitOperand::Named(ident) => write!(f, "{}", ident.name()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DefCal {
    pub name: Identifier,
    pub params: Vec<Param>,
    pub qubits: Vec<QubitOperand>,
    pub return_type: Option<Type>,
    pub body: Block,
}

impl DefCal {
    pub fn new(
        name: Identifier,
        params: Vec<Param>,
        qubits: Vec<QubitOperand>,
        return_type: Option<Type>,
        body: Block,
    ) -> DefCal {
        DefCal {
            name,
            params,
            qubits,
            return_type,
            body,
        }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::DefCal(self))
    }
}

// `measure $0;`, `x $1;` and so on.
#[derive(Clone, Debug, PartialEq)]
pub struct GateCall {
    pub name: Identifier,
    pub args: Vec<Expr>,
    pub qubits: Vec<QubitOperand>,
}

impl GateCall {
    pub fn new(name: Identifier, args: Vec<Expr>, qubits: Vec<QubitOperand>) -> GateCall {
        GateCall { name, args, qubits }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::GateCall(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub target: Identifier,
    /// `Some(op)` for compound assignment such as `+=`.
    pub op: Option<ArithOp>,
    pub value: Expr,
}

impl Assignment {
    pub fn new(target: Identifier, op: Option<ArithOp>, value: Expr) -> Assignment {
        Assignment { target, op, value }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::Assignment(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ForIterable {
    /// `[start:step:stop]`, stop inclusive.
    Range {
        start: Expr,
        step: Option<Expr>,
        stop: Expr,
    },
    /// `{a, b, c}`
    Set(Vec<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForStmt {
    pub var: Identifier,
    pub ty: Type,
    pub iterable: ForIterable,
    pub body: Block,
}

impl ForStmt {
    pub fn new(var: Identifier, ty: Type, iterable: ForIterable, body: Block) -> ForStmt {
        ForStmt {
            var,
            ty,
            iterable,
            body,
        }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::ForStmt(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct While {
    pub condition: Expr,
    pub body: Block,
}

impl While {
    pub fn new(condition: Expr, body: Block) -> While {
        While { condition, body }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::While(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct If {
    pub condition: Expr,
    pub then_branch: Block,
    pub else_branch: Option<Block>,
}

impl If {
    pub fn new(condition: Expr, then_branch: Block, else_branch: Option<Block>) -> If {
        If {
            condition,
            then_branch,
            else_branch,
        }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::If(self))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delay {
    pub duration: Expr,
    pub frames: Vec<Identifier>,
}

impl Delay {
    pub fn new(duration: Expr, frames: Vec<Identifier>) -> Delay {
        Delay { duration, frames }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::Delay(self))
    }
}

// Operands of `play(frame, waveform)` and `capture_v*(frame, waveform)`.
#[derive(Clone, Debug, PartialEq)]
pub struct PulseOp {
    pub frame: Identifier,
    pub waveform: Expr,
}

impl PulseOp {
    pub fn new(frame: Identifier, waveform: Expr) -> PulseOp {
        PulseOp { frame, waveform }
    }

    pub fn to_play_stmt(self) -> Stmt {
        Stmt::new(StmtKind::Play(self))
    }

    pub fn to_capture_stmt(self) -> Stmt {
        Stmt::new(StmtKind::Capture(self))
    }
}

// frames == None represents `barrier;`
#[derive(Clone, Debug, PartialEq)]
pub struct Barrier {
    pub frames: Option<Vec<Identifier>>,
    sync_times: Vec<u64>,
}

impl Barrier {
    pub fn new(frames: Option<Vec<Identifier>>) -> Barrier {
        Barrier {
            frames,
            sync_times: Vec::new(),
        }
    }

    /// Clock value the barrier synchronized to, once per evaluation, in order.
    pub fn sync_times(&self) -> &[u64] {
        &self.sync_times
    }

    pub fn set_sync_times(&mut self, sync_times: Vec<u64>) {
        self.sync_times = sync_times;
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::Barrier(self))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOp {
    SetFrequency,
    ShiftFrequency,
    SetPhase,
    ShiftPhase,
}

impl FrameOp {
    pub fn name(&self) -> &'static str {
        match self {
            FrameOp::SetFrequency => "set_frequency",
            FrameOp::ShiftFrequency => "shift_frequency",
            FrameOp::SetPhase => "set_phase",
            FrameOp::ShiftPhase => "shift_phase",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameUpdate {
    pub op: FrameOp,
    pub frame: Identifier,
    pub value: Expr,
}

impl FrameUpdate {
    pub fn new(op: FrameOp, frame: Identifier, value: Expr) -> FrameUpdate {
        FrameUpdate { op, frame, value }
    }

    pub fn to_stmt(self) -> Stmt {
        Stmt::new(StmtKind::FrameUpdate(self))
    }
}

// Expressions
//
// Expressions are not typed here. The analyzer computes types on the fly where it needs them
// to check arguments.

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(Identifier),
    BinaryExpr(Box<BinaryExpr>),
    UnaryExpr(Box<UnaryExpr>),
    Call(Call),
    ArrayLiteral(Vec<Expr>),
}

impl Expr {
    pub fn int(value: i64) -> Expr {
        Expr::Literal(Literal::Int(value))
    }

    pub fn float(value: f64) -> Expr {
        Expr::Literal(Literal::Float(value))
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Literal(Literal::Bool(value))
    }

    pub fn imaginary(value: f64) -> Expr {
        Expr::Literal(Literal::Imaginary(value))
    }

    pub fn duration(value: f64, unit: TimeUnit) -> Expr {
        Expr::Literal(Literal::Duration(DurationLiteral::new(value, unit)))
    }

    pub fn ident<T: ToString>(name: T) -> Expr {
        Expr::Identifier(Identifier::new(name))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::BinaryExpr(Box::new(BinaryExpr::new(op, left, right)))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::UnaryExpr(Box::new(UnaryExpr::new(op, operand)))
    }

    pub fn call<T: ToString>(name: T, args: Vec<Expr>) -> Expr {
        Expr::Call(Call::new(Identifier::new(name), args))
    }

    pub fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Identifier(ident) => out.push(ident),
            Expr::BinaryExpr(binary) => {
                binary.left.collect_identifiers(out);
                binary.right.collect_identifiers(out);
            }
            Expr::UnaryExpr(unary) => unary.operand.collect_identifiers(out),
            Expr::Call(call) => {
                out.push(&call.name);
                for arg in &call.args {
                    arg.collect_identifiers(out);
                }
            }
            Expr::ArrayLiteral(elements) => {
                for element in elements {
                    element.collect_identifiers(out);
                }
            }
        }
    }

    pub fn identifiers_mut(&mut self) -> Vec<&mut Identifier> {
        let mut out = Vec::new();
        self.collect_identifiers_mut(&mut out);
        out
    }

    fn collect_identifiers_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Identifier>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Identifier(ident) => out.push(ident),
            Expr::BinaryExpr(binary) => {
                let BinaryExpr { left, right, .. } = binary.as_mut();
                left.collect_identifiers_mut(out);
                right.collect_identifiers_mut(out);
            }
            Expr::UnaryExpr(unary) => unary.operand.collect_identifiers_mut(out),
            Expr::Call(call) => {
                out.push(&mut call.name);
                for arg in &mut call.args {
                    arg.collect_identifiers_mut(out);
                }
            }
            Expr::ArrayLiteral(elements) => {
                for element in elements {
                    element.collect_identifiers_mut(out);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Imaginary(f64),
    Duration(DurationLiteral),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// One sample period of the target hardware.
    Dt,
    NanoSecond,
    MicroSecond,
    MilliSecond,
    Second,
}

impl TimeUnit {
    /// Number of units in one second. `None` for `dt`, which is hardware dependent.
    pub fn per_second(&self) -> Option<f64> {
        match self {
            TimeUnit::Dt => None,
            TimeUnit::NanoSecond => Some(1e9),
            TimeUnit::MicroSecond => Some(1e6),
            TimeUnit::MilliSecond => Some(1e3),
            TimeUnit::Second => Some(1.0),
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Dt => "dt",
            TimeUnit::NanoSecond => "ns",
            TimeUnit::MicroSecond => "us",
            TimeUnit::MilliSecond => "ms",
            TimeUnit::Second => "s",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DurationLiteral {
    pub value: f64,
    pub unit: TimeUnit,
}

impl DurationLiteral {
    pub fn new(value: f64, unit: TimeUnit) -> DurationLiteral {
        DurationLiteral { value, unit }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Not,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
}

impl UnaryExpr {
    pub fn new(op: UnaryOp, operand: Expr) -> UnaryExpr {
        UnaryExpr { op, operand }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    ArithOp(ArithOp),
    CmpOp(CmpOp),
    BoolOp(BoolOp),
    // Waveform concatenation, `a ++ b`
    ConcatenationOp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
}

impl BinaryExpr {
    pub fn new(op: BinaryOp, left: Expr, right: Expr) -> BinaryExpr {
        BinaryExpr { op, left, right }
    }
}

// A call in expression position: subroutines and waveform generators.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub name: Identifier,
    pub args: Vec<Expr>,
}

impl Call {
    pub fn new(name: Identifier, args: Vec<Expr>) -> Call {
        Call { name, args }
    }

    pub fn to_expr(self) -> Expr {
        Expr::Call(self)
    }
}
