// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Duration resolution.
//!
//! The resolver executes an analyzed program virtually. Each frame has a clock counting
//! samples, held in a [`FrameClocks`] accumulator that is threaded through the walk.
//! Calls to defcals and subroutines execute their bodies with the arguments bound, and
//! `for` loops run over their statically known iteration values.
//!
//! Afterwards every evaluated statement carries its [`ResolvedDuration`] and every barrier
//! the clock values it synchronized to. [`replay`] walks a program again, forcing barriers to
//! their recorded synchronization times, and fails if a frame would have to go back in time.
//! This is how a split program is checked against the program it was split from.

use crate::const_eval::{ConstEnv, EvalError, Evaluator, Value};
use crate::timing::{TimingWarning, TimingWarningKind};
use crate::waveform::{WaveformInfo, WaveformKey};
use hashbrown::HashMap;
use oqp_semantics::asg::{
    walk_stmts, Barrier, BinaryOp, Block, Call, DefCal, DefStmt, Delay, Expr, ForIterable,
    ForStmt, FrameOp, FrameUpdate, Identifier, If, Param, Program, PulseOp, ResolvedDuration,
    Stmt, StmtId, StmtKind, While,
};
use oqp_semantics::builtins::{GeneratorRegistry, PLACEHOLDER};
use oqp_semantics::semantic_error::{SemanticError, SemanticErrorKind, SemanticResult};
use oqp_semantics::symbols::SymbolId;
use oqp_semantics::types::Type;
use oqp_semantics::TextRange;
use std::collections::BTreeMap;
use std::fmt;

/// Longest `for` range executed virtually. Longer timed loops are unresolved.
pub const MAX_LOOP_TRIPS: usize = 1 << 20;

/// Virtual clocks of the frames declared so far, in samples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameClocks {
    // Declaration order, used by `barrier;` and `delay[d];` without frames.
    frames: Vec<SymbolId>,
    clocks: HashMap<SymbolId, u64>,
}

impl FrameClocks {
    pub fn new() -> FrameClocks {
        FrameClocks::default()
    }

    /// Start a clock at zero. Declaring a frame again leaves its clock alone.
    pub fn declare(&mut self, frame: SymbolId) {
        if !self.clocks.contains_key(&frame) {
            self.frames.push(frame);
            self.clocks.insert(frame, 0);
        }
    }

    pub fn contains(&self, frame: SymbolId) -> bool {
        self.clocks.contains_key(&frame)
    }

    pub fn frames(&self) -> &[SymbolId] {
        &self.frames
    }

    pub fn get(&self, frame: SymbolId) -> u64 {
        self.clocks.get(&frame).copied().unwrap_or(0)
    }

    /// Advance `frame` by `samples`, returning the time it started at.
    /// Returns `None`, leaving the clock alone, if the clock would overflow.
    pub fn advance(&mut self, frame: SymbolId, samples: u64) -> Option<u64> {
        let clock = self.clocks.entry(frame).or_insert(0);
        let start = *clock;
        *clock = start.checked_add(samples)?;
        Some(start)
    }

    pub fn latest(&self, frames: &[SymbolId]) -> u64 {
        frames.iter().map(|f| self.get(*f)).max().unwrap_or(0)
    }

    pub fn earliest(&self, frames: &[SymbolId]) -> u64 {
        frames.iter().map(|f| self.get(*f)).min().unwrap_or(0)
    }

    pub fn sync(&mut self, frames: &[SymbolId], time: u64) {
        for frame in frames {
            self.clocks.insert(*frame, time);
        }
    }

    /// Largest advance of any frame since `earlier`.
    pub fn elapsed_since(&self, earlier: &FrameClocks) -> u64 {
        self.clocks
            .iter()
            .map(|(frame, clock)| clock.saturating_sub(earlier.get(*frame)))
            .max()
            .unwrap_or(0)
    }
}

/// Frequency and phase of a frame, when known at compile time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameState {
    pub frequency: Option<f64>,
    pub phase: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimedKind {
    Delay,
    Play,
    Capture,
}

impl fmt::Display for TimedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimedKind::Delay => "delay",
            TimedKind::Play => "play",
            TimedKind::Capture => "capture",
        };
        f.write_str(name)
    }
}

/// One evaluation of a timed statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedEvent {
    pub stmt: StmtId,
    pub range: TextRange,
    pub kind: TimedKind,
    pub frames: Vec<String>,
    pub start: u64,
    pub duration: u64,
}

/// One evaluation of a barrier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarrierSync {
    pub stmt: StmtId,
    pub frames: Vec<String>,
    pub time: u64,
    /// Largest wait inserted on any of the frames.
    pub padding: u64,
}

/// A waveform played or captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveformEvent {
    pub stmt: StmtId,
    pub frame: String,
    pub waveform: WaveformInfo,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClockReport {
    pub final_clocks: BTreeMap<String, u64>,
    pub frame_states: BTreeMap<String, FrameState>,
    pub barriers: Vec<BarrierSync>,
    pub events: Vec<TimedEvent>,
    pub waveforms: Vec<WaveformEvent>,
    /// Values of each evaluated waveform declaration.
    pub declared_waveforms: BTreeMap<StmtId, Vec<WaveformInfo>>,
    /// Largest trip count seen for each evaluated `for` loop.
    pub loop_trips: BTreeMap<StmtId, u64>,
    pub warnings: Vec<TimingWarning>,
}

impl ClockReport {
    pub fn clock(&self, frame: &str) -> Option<u64> {
        self.final_clocks.get(frame).copied()
    }

    /// Time at which the last frame finishes.
    pub fn total_duration(&self) -> u64 {
        self.final_clocks.values().copied().max().unwrap_or(0)
    }
}

/// Resolve the duration of every statement of `program`, which must have been analyzed.
/// Statement durations and barrier synchronization times are written back to the program.
pub fn resolve_durations(
    program: &mut Program,
    registry: &GeneratorRegistry,
    sample_rate: f64,
) -> SemanticResult<ClockReport> {
    let (report, annotations) = {
        let mut resolver = Resolver::new(registry, sample_rate, Mode::Record);
        resolver.exec_stmts(program.stmts())?;
        resolver.finish()
    };
    annotate(program.stmts_mut(), &annotations);
    Ok(report)
}

/// Walk `program` again, with every barrier forced to the synchronization times recorded on
/// it. `label` names the program in a `SplitTimingMismatch` error.
pub fn replay(
    program: &Program,
    registry: &GeneratorRegistry,
    sample_rate: f64,
    label: &str,
) -> SemanticResult<ClockReport> {
    let mut resolver = Resolver::new(registry, sample_rate, Mode::Replay(label.to_string()));
    resolver.exec_stmts(program.stmts())?;
    Ok(resolver.finish().0)
}

#[derive(Default)]
struct Annotations {
    durations: HashMap<StmtId, ResolvedDuration>,
    sync_times: HashMap<StmtId, Vec<u64>>,
}

fn annotate(stmts: &mut [Stmt], annotations: &Annotations) {
    for stmt in stmts.iter_mut() {
        let id = stmt.id();
        if let Some(duration) = annotations.durations.get(&id) {
            stmt.set_duration(*duration);
        }
        if let StmtKind::Barrier(barrier) = stmt.kind_mut() {
            if let Some(times) = annotations.sync_times.get(&id) {
                barrier.set_sync_times(times.clone());
            }
        }
        for block in stmt.blocks_mut() {
            annotate(block.statements_mut(), annotations);
        }
    }
}

enum Mode {
    Record,
    Replay(String),
}

#[derive(Clone, Copy)]
enum Callable<'p> {
    Def(&'p DefStmt),
    DefCal(&'p DefCal),
}

impl<'p> Callable<'p> {
    fn params(&self) -> &'p [Param] {
        match self {
            Callable::Def(def) => &def.params,
            Callable::DefCal(defcal) => &defcal.params,
        }
    }

    fn body(&self) -> &'p Block {
        match self {
            Callable::Def(def) => &def.body,
            Callable::DefCal(defcal) => &defcal.body,
        }
    }
}

// Everything a dynamic `if` has to restore before running its other branch.
#[derive(Clone, Default)]
struct State {
    clocks: FrameClocks,
    env: ConstEnv,
    frame_states: HashMap<SymbolId, FrameState>,
    // Frame parameters bound to the frames passed in.
    aliases: HashMap<SymbolId, SymbolId>,
}

struct Resolver<'p, 'r> {
    evaluator: Evaluator<'r>,
    mode: Mode,
    state: State,
    callables: HashMap<SymbolId, Callable<'p>>,
    call_stack: Vec<SymbolId>,
    frame_names: HashMap<SymbolId, String>,
    annotations: Annotations,
    replay_cursor: HashMap<StmtId, usize>,
    report: ClockReport,
}

fn unresolved(message: String, range: TextRange) -> SemanticError {
    SemanticError::new(SemanticErrorKind::UnresolvedDuration(message), range)
}

fn symbol_of(ident: &Identifier) -> SemanticResult<SymbolId> {
    ident.symbol().ok_or_else(|| {
        SemanticError::new(
            SemanticErrorKind::UndeclaredIdentifier(ident.name().to_string()),
            ident.range(),
        )
    })
}

impl<'p, 'r> Resolver<'p, 'r> {
    fn new(registry: &'r GeneratorRegistry, sample_rate: f64, mode: Mode) -> Self {
        Resolver {
            evaluator: Evaluator::new(registry, sample_rate),
            mode,
            state: State::default(),
            callables: HashMap::new(),
            call_stack: Vec::new(),
            frame_names: HashMap::new(),
            annotations: Annotations::default(),
            replay_cursor: HashMap::new(),
            report: ClockReport::default(),
        }
    }

    fn finish(mut self) -> (ClockReport, Annotations) {
        for frame in self.state.clocks.frames() {
            let name = self.frame_name(*frame);
            self.report
                .final_clocks
                .insert(name.clone(), self.state.clocks.get(*frame));
            let frame_state = self.state.frame_states.get(frame).copied().unwrap_or_default();
            self.report.frame_states.insert(name, frame_state);
        }
        (self.report, self.annotations)
    }

    fn frame_name(&self, frame: SymbolId) -> String {
        self.frame_names
            .get(&frame)
            .cloned()
            .unwrap_or_else(|| format!("{frame:?}"))
    }

    fn record_duration(&mut self, stmt: &Stmt, samples: u64) {
        self.annotations
            .durations
            .entry(stmt.id())
            .and_modify(|d| d.include(samples))
            .or_insert_with(|| ResolvedDuration::fixed(samples));
    }

    fn try_eval(&self, expr: &Expr) -> Option<Value> {
        match self.evaluator.eval(expr, &self.state.env) {
            Ok(value) => Some(value),
            Err(err) => {
                log::trace!("not folded: {err}");
                None
            }
        }
    }

    fn exec_stmts(&mut self, stmts: &'p [Stmt]) -> SemanticResult<()> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &'p Stmt) -> SemanticResult<()> {
        match stmt.kind() {
            StmtKind::CalibrationGrammar(_)
            | StmtKind::DeclarePort(_)
            | StmtKind::OutputDeclaration(_)
            | StmtKind::Return(_) => {}

            StmtKind::DeclareFrame(decl) => {
                let frame = symbol_of(&decl.name)?;
                self.state.clocks.declare(frame);
                self.frame_names.insert(frame, decl.name.name().to_string());
                let frame_state = FrameState {
                    frequency: self.try_eval(&decl.frequency).and_then(|v| v.as_f64()),
                    phase: self.try_eval(&decl.phase).and_then(|v| v.as_f64()),
                };
                self.state.frame_states.insert(frame, frame_state);
            }

            StmtKind::DeclareWaveform(decl) => {
                let symbol = symbol_of(&decl.name)?;
                let value = match self.waveform(&decl.value, decl.name.name()) {
                    Ok(info) => {
                        let values = self
                            .report
                            .declared_waveforms
                            .entry(stmt.id())
                            .or_default();
                        if !values.contains(&info) {
                            values.push(info.clone());
                        }
                        Some(Value::Waveform(info))
                    }
                    Err(err) => {
                        log::debug!("waveform `{}` is dynamic: {err}", decl.name.name());
                        None
                    }
                };
                self.state.env.insert(symbol, value);
            }

            StmtKind::DeclareClassical(decl) => {
                let symbol = symbol_of(&decl.name)?;
                let value = match &decl.initializer {
                    Some(init) => {
                        self.inline_call(init, stmt)?;
                        self.try_eval(init)
                    }
                    None => None,
                };
                self.state.env.insert(symbol, value);
            }

            StmtKind::InputDeclaration(decl) => {
                let symbol = symbol_of(&decl.name)?;
                self.state.env.insert(symbol, None);
            }

            StmtKind::DefStmt(def) => {
                self.callables.insert(symbol_of(&def.name)?, Callable::Def(def));
            }

            StmtKind::DefCal(defcal) => {
                self.callables
                    .insert(symbol_of(&defcal.name)?, Callable::DefCal(defcal));
            }

            StmtKind::Cal(block) => self.exec_stmts(block.statements())?,

            StmtKind::GateCall(call) => {
                let elapsed = self.invoke(&call.name, &call.args, stmt.range())?;
                self.record_duration(stmt, elapsed);
            }

            StmtKind::ExprStmt(expr) => {
                if let Some(elapsed) = self.inline_call(expr, stmt)? {
                    self.record_duration(stmt, elapsed);
                }
            }

            StmtKind::Assignment(assign) => {
                self.inline_call(&assign.value, stmt)?;
                let target = symbol_of(&assign.target)?;
                let value = match assign.op {
                    None => self.try_eval(&assign.value),
                    Some(op) => {
                        let combined = Expr::binary(
                            BinaryOp::ArithOp(op),
                            assign.target.clone().to_expr(),
                            assign.value.clone(),
                        );
                        self.try_eval(&combined)
                    }
                };
                self.state.env.insert(target, value);
            }

            StmtKind::ForStmt(for_stmt) => self.exec_for(stmt, for_stmt)?,
            StmtKind::While(while_stmt) => self.exec_while(stmt, while_stmt)?,
            StmtKind::If(if_stmt) => self.exec_if(stmt, if_stmt)?,
            StmtKind::Delay(delay) => self.exec_delay(stmt, delay)?,
            StmtKind::Play(op) => self.exec_pulse(stmt, op, TimedKind::Play)?,
            StmtKind::Capture(op) => self.exec_pulse(stmt, op, TimedKind::Capture)?,
            StmtKind::Barrier(barrier) => self.exec_barrier(stmt, barrier)?,
            StmtKind::FrameUpdate(update) => self.exec_frame_update(stmt, update)?,
        }
        Ok(())
    }

    // A placeholder has no content, so it is keyed by where it comes from.
    fn waveform(&self, expr: &Expr, declared_as: &str) -> Result<WaveformInfo, EvalError> {
        let mut info = self.evaluator.waveform(expr, &self.state.env)?;
        if let Expr::Call(Call { name, .. }) = expr {
            if name.name() == PLACEHOLDER {
                info.key = WaveformKey::placeholder(declared_as);
            }
        }
        Ok(info)
    }

    /// Execute `expr` if it is a call to a subroutine defined in the program.
    fn inline_call(&mut self, expr: &'p Expr, stmt: &Stmt) -> SemanticResult<Option<u64>> {
        let Expr::Call(call) = expr else {
            return Ok(None);
        };
        match call.name.symbol() {
            Some(symbol) if self.callables.contains_key(&symbol) => self
                .invoke(&call.name, &call.args, stmt.range())
                .map(Some),
            _ => Ok(None),
        }
    }

    fn invoke(
        &mut self,
        name: &Identifier,
        args: &'p [Expr],
        range: TextRange,
    ) -> SemanticResult<u64> {
        let symbol = symbol_of(name)?;
        let callable = *self.callables.get(&symbol).ok_or_else(|| {
            unresolved(format!("`{}` is called before it is defined", name.name()), range)
        })?;
        if self.call_stack.contains(&symbol) {
            return Err(unresolved(
                format!("recursive call to `{}`", name.name()),
                range,
            ));
        }
        for (param, arg) in callable.params().iter().zip(args) {
            let Some(param_symbol) = param.name.symbol() else {
                continue;
            };
            if param.ty == Type::Frame {
                if let Expr::Identifier(frame) = arg {
                    let frame = self.resolve_frame(frame)?;
                    self.state.aliases.insert(param_symbol, frame);
                }
            } else {
                let value = self.try_eval(arg);
                self.state.env.insert(param_symbol, value);
            }
        }
        log::trace!("entering `{}`", name.name());
        let before = self.state.clocks.clone();
        self.call_stack.push(symbol);
        let result = self.exec_stmts(callable.body().statements());
        self.call_stack.pop();
        result?;
        Ok(self.state.clocks.elapsed_since(&before))
    }

    fn resolve_frame(&self, ident: &Identifier) -> SemanticResult<SymbolId> {
        let symbol = symbol_of(ident)?;
        let symbol = self.state.aliases.get(&symbol).copied().unwrap_or(symbol);
        if self.state.clocks.contains(symbol) {
            Ok(symbol)
        } else {
            Err(unresolved(
                format!("frame `{}` is not bound to a declared frame", ident.name()),
                ident.range(),
            ))
        }
    }

    fn clock_overflow(&self, frame: SymbolId, range: TextRange) -> SemanticError {
        unresolved(format!("clock of `{}` overflows", self.frame_name(frame)), range)
    }

    fn resolve_frames(&self, frames: &[Identifier]) -> SemanticResult<Vec<SymbolId>> {
        frames.iter().map(|f| self.resolve_frame(f)).collect()
    }

    fn exec_delay(&mut self, stmt: &Stmt, delay: &Delay) -> SemanticResult<()> {
        let (samples, rounded) = self
            .evaluator
            .duration_samples(&delay.duration, &self.state.env)
            .map_err(|err| unresolved(err.to_string(), stmt.range()))?;
        if rounded {
            self.warn_non_integral(stmt, samples);
        }
        let frames = if delay.frames.is_empty() {
            self.state.clocks.frames().to_vec()
        } else {
            self.resolve_frames(&delay.frames)?
        };
        let start = self.state.clocks.latest(&frames);
        for frame in frames.iter() {
            let from = self
                .state
                .clocks
                .advance(*frame, samples)
                .ok_or_else(|| self.clock_overflow(*frame, stmt.range()))?;
            log::trace!("{} delayed {samples} from {from}", self.frame_name(*frame));
        }
        let names = frames.iter().map(|f| self.frame_name(*f)).collect();
        self.report.events.push(TimedEvent {
            stmt: stmt.id(),
            range: stmt.range(),
            kind: TimedKind::Delay,
            frames: names,
            start,
            duration: samples,
        });
        self.record_duration(stmt, samples);
        Ok(())
    }

    fn exec_pulse(&mut self, stmt: &Stmt, op: &PulseOp, kind: TimedKind) -> SemanticResult<()> {
        let frame = self.resolve_frame(&op.frame)?;
        let waveform = self
            .waveform(&op.waveform, &stmt.id().to_string())
            .map_err(|err| unresolved(err.to_string(), stmt.range()))?;
        let samples = waveform.samples;
        let start = self
            .state
            .clocks
            .advance(frame, samples)
            .ok_or_else(|| self.clock_overflow(frame, stmt.range()))?;
        let name = self.frame_name(frame);
        log::trace!("{kind} of {samples} on {name} from {start}");
        self.report.events.push(TimedEvent {
            stmt: stmt.id(),
            range: stmt.range(),
            kind,
            frames: vec![name.clone()],
            start,
            duration: samples,
        });
        self.report.waveforms.push(WaveformEvent {
            stmt: stmt.id(),
            frame: name,
            waveform,
        });
        self.record_duration(stmt, samples);
        Ok(())
    }

    fn exec_frame_update(&mut self, stmt: &Stmt, update: &FrameUpdate) -> SemanticResult<()> {
        let frame = self.resolve_frame(&update.frame)?;
        let value = self.try_eval(&update.value).and_then(|v| v.as_f64());
        let frame_state = self.state.frame_states.entry(frame).or_default();
        match update.op {
            FrameOp::SetFrequency => frame_state.frequency = value,
            FrameOp::ShiftFrequency => {
                frame_state.frequency = frame_state.frequency.zip(value).map(|(f, d)| f + d)
            }
            FrameOp::SetPhase => frame_state.phase = value,
            FrameOp::ShiftPhase => {
                frame_state.phase = frame_state.phase.zip(value).map(|(p, d)| p + d)
            }
        }
        self.record_duration(stmt, 0);
        Ok(())
    }

    fn exec_barrier(&mut self, stmt: &Stmt, barrier: &Barrier) -> SemanticResult<()> {
        let frames = match &barrier.frames {
            None => self.state.clocks.frames().to_vec(),
            Some(frames) => self.resolve_frames(frames)?,
        };
        let latest = self.state.clocks.latest(&frames);
        let time = match &self.mode {
            Mode::Record => latest,
            Mode::Replay(label) => {
                let cursor = self.replay_cursor.entry(stmt.id()).or_insert(0);
                let recorded = barrier.sync_times().get(*cursor).copied();
                *cursor += 1;
                match recorded {
                    Some(recorded) if recorded >= latest => recorded,
                    _ => {
                        log::debug!(
                            "barrier {} in {label} reached at {latest}, recorded {recorded:?}",
                            stmt.id()
                        );
                        return Err(SemanticError::new(
                            SemanticErrorKind::SplitTimingMismatch {
                                core: label.clone(),
                            },
                            stmt.range(),
                        ));
                    }
                }
            }
        };
        let padding = if frames.is_empty() {
            0
        } else {
            time - self.state.clocks.earliest(&frames)
        };
        self.state.clocks.sync(&frames, time);
        log::trace!("barrier {} synchronized {} frame(s) at {time}", stmt.id(), frames.len());
        self.annotations
            .sync_times
            .entry(stmt.id())
            .or_default()
            .push(time);
        let names = frames.iter().map(|f| self.frame_name(*f)).collect();
        self.report.barriers.push(BarrierSync {
            stmt: stmt.id(),
            frames: names,
            time,
            padding,
        });
        self.record_duration(stmt, padding);
        Ok(())
    }

    fn exec_for(&mut self, stmt: &'p Stmt, for_stmt: &'p ForStmt) -> SemanticResult<()> {
        let var = symbol_of(&for_stmt.var)?;
        let body = for_stmt.body.statements();
        let values = match self.iteration_values(&for_stmt.iterable) {
            Ok(values) => values,
            Err(err) => {
                if self.has_timing_effect(body) {
                    return Err(unresolved(
                        format!("trip count of a timed `for` loop: {err}"),
                        stmt.range(),
                    ));
                }
                self.state.env.insert(var, None);
                self.invalidate(body);
                return Ok(());
            }
        };
        let trips = values.len() as u64;
        let recorded = self.report.loop_trips.entry(stmt.id()).or_insert(0);
        *recorded = (*recorded).max(trips);
        let before = self.state.clocks.clone();
        for value in values {
            self.state.env.insert(var, Some(value));
            self.exec_stmts(body)?;
        }
        let elapsed = self.state.clocks.elapsed_since(&before);
        self.record_duration(stmt, elapsed);
        Ok(())
    }

    fn iteration_values(&self, iterable: &ForIterable) -> Result<Vec<Value>, EvalError> {
        let env = &self.state.env;
        match iterable {
            ForIterable::Set(values) => values.iter().map(|v| self.evaluator.eval(v, env)).collect(),
            ForIterable::Range { start, step, stop } => {
                let integer = |expr: &Expr| -> Result<i64, EvalError> {
                    let value = self.evaluator.eval(expr, env)?;
                    value.as_i64().ok_or_else(|| {
                        EvalError::Invalid(format!(
                            "range bound {} is not an integer",
                            value.key_fragment()
                        ))
                    })
                };
                let start = integer(start)?;
                let stop = integer(stop)?;
                let step = match step {
                    Some(step) => integer(step)?,
                    None => 1,
                };
                if step == 0 {
                    return Err(EvalError::Invalid("range step is zero".to_string()));
                }
                let in_range = |i: &i64| (step > 0 && *i <= stop) || (step < 0 && *i >= stop);
                let mut values = Vec::new();
                let mut next = Some(start);
                // Ranges include their stop value. Stepping past `i64::MAX` ends the range.
                while let Some(i) = next.filter(in_range) {
                    if values.len() == MAX_LOOP_TRIPS {
                        return Err(EvalError::Invalid(format!(
                            "range has more than {MAX_LOOP_TRIPS} iterations"
                        )));
                    }
                    values.push(Value::Int(i));
                    next = i.checked_add(step);
                }
                Ok(values)
            }
        }
    }

    fn exec_while(&mut self, stmt: &Stmt, while_stmt: &'p While) -> SemanticResult<()> {
        let body = while_stmt.body.statements();
        let condition = self.try_eval(&while_stmt.condition).and_then(|v| v.as_bool());
        if condition == Some(false) {
            self.record_duration(stmt, 0);
            return Ok(());
        }
        if self.has_timing_effect(body) {
            return Err(unresolved(
                "`while` loop with a timed body".to_string(),
                stmt.range(),
            ));
        }
        self.invalidate(body);
        self.record_duration(stmt, 0);
        Ok(())
    }

    fn exec_if(&mut self, stmt: &Stmt, if_stmt: &'p If) -> SemanticResult<()> {
        let before = self.state.clocks.clone();
        let condition = self.try_eval(&if_stmt.condition).and_then(|v| v.as_bool());
        match condition {
            Some(true) => self.exec_stmts(if_stmt.then_branch.statements())?,
            Some(false) => {
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.exec_stmts(else_branch.statements())?;
                }
            }
            None => {
                let saved = self.state.clone();
                self.exec_stmts(if_stmt.then_branch.statements())?;
                let after_then = std::mem::replace(&mut self.state, saved);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.exec_stmts(else_branch.statements())?;
                }
                if after_then.clocks != self.state.clocks {
                    return Err(unresolved(
                        "branches of an `if` with a dynamic condition take different times"
                            .to_string(),
                        stmt.range(),
                    ));
                }
                self.merge(after_then);
            }
        }
        let elapsed = self.state.clocks.elapsed_since(&before);
        self.record_duration(stmt, elapsed);
        Ok(())
    }

    // Keep only what both branches agree on.
    fn merge(&mut self, other: State) {
        for (symbol, value) in other.env {
            if self.state.env.get(&symbol) != Some(&value) {
                self.state.env.insert(symbol, None);
            }
        }
        for (frame, frame_state) in other.frame_states {
            let entry = self.state.frame_states.entry(frame).or_default();
            if *entry != frame_state {
                *entry = FrameState::default();
            }
        }
    }

    fn has_timing_effect(&self, stmts: &[Stmt]) -> bool {
        let mut found = false;
        walk_stmts(stmts, &mut |stmt| {
            found |= stmt.is_timed()
                || matches!(stmt.kind(), StmtKind::Barrier(_) | StmtKind::GateCall(_))
                || self.calls_subroutine(stmt);
        });
        found
    }

    fn calls_subroutine(&self, stmt: &Stmt) -> bool {
        let expr = match stmt.kind() {
            StmtKind::ExprStmt(expr) => Some(expr),
            StmtKind::Assignment(assign) => Some(&assign.value),
            StmtKind::DeclareClassical(decl) => decl.initializer.as_ref(),
            _ => None,
        };
        matches!(expr, Some(Expr::Call(call))
            if call.name.symbol().is_some_and(|s| self.callables.contains_key(&s)))
    }

    // Values written in a block that is not executed statically are unknown afterwards.
    fn invalidate(&mut self, stmts: &[Stmt]) {
        let mut written = Vec::new();
        let mut updated_frames = Vec::new();
        walk_stmts(stmts, &mut |stmt| match stmt.kind() {
            StmtKind::Assignment(assign) => written.extend(assign.target.symbol()),
            StmtKind::DeclareClassical(decl) => written.extend(decl.name.symbol()),
            StmtKind::FrameUpdate(update) => updated_frames.extend(update.frame.symbol()),
            _ => {}
        });
        for symbol in written {
            self.state.env.insert(symbol, None);
        }
        for frame in updated_frames {
            let frame = self.state.aliases.get(&frame).copied().unwrap_or(frame);
            self.state.frame_states.insert(frame, FrameState::default());
        }
    }

    fn warn_non_integral(&mut self, stmt: &Stmt, samples: u64) {
        let warning = TimingWarning::new(
            TimingWarningKind::NonIntegralDuration,
            stmt.id(),
            stmt.range(),
            samples,
        );
        if !self.report.warnings.contains(&warning) {
            self.report.warnings.push(warning);
        }
    }
}
