// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Split one program into one program per instrument core.
//!
//! Ports are mapped to cores by the setup, and frames follow their port. A core's program
//! keeps the declarations and timed statements on its own frames, everything without a
//! core affinity, and every barrier with its frame list narrowed. Calls that pass declared
//! frames stay on the cores of those frames. The recorded barrier synchronization times are
//! carried over, so each split program can be replayed against the timeline of the source
//! program.

use hashbrown::HashMap;
use oqp_semantics::asg::{
    walk_stmts, Block, DefCal, DefStmt, Delay, Expr, ForStmt, Identifier, If, Program, Stmt,
    StmtKind, While,
};
use oqp_semantics::semantic_error::{SemanticError, SemanticErrorKind, SemanticResult};
use oqp_semantics::symbols::SymbolId;
use oqp_setup::{Core, Setup};
use std::collections::{BTreeMap, BTreeSet};

/// Core of every declared port and frame.
#[derive(Clone, Debug, Default)]
pub struct CoreAffinity {
    ports: HashMap<SymbolId, Core>,
    frames: HashMap<SymbolId, Core>,
}

impl CoreAffinity {
    /// Map the ports declared in `program` through `setup`. Every declared port must map.
    pub fn from_program(program: &Program, setup: &dyn Setup) -> SemanticResult<CoreAffinity> {
        let mut affinity = CoreAffinity::default();
        let mut missing = None;
        walk_stmts(program.stmts(), &mut |stmt| {
            if missing.is_some() {
                return;
            }
            if let StmtKind::DeclarePort(decl) = stmt.kind() {
                match (decl.name.symbol(), setup.core(decl.name.name())) {
                    (Some(symbol), Some(core)) => {
                        log::debug!("port `{}` is on {core}", decl.name.name());
                        affinity.ports.insert(symbol, core);
                    }
                    (_, None) => {
                        missing = Some(SemanticError::new(
                            SemanticErrorKind::MissingSetupMapping(decl.name.name().to_string()),
                            stmt.range(),
                        ))
                    }
                    (None, Some(_)) => {}
                }
            }
        });
        if let Some(err) = missing {
            return Err(err);
        }
        walk_stmts(program.stmts(), &mut |stmt| {
            if let StmtKind::DeclareFrame(decl) = stmt.kind() {
                let port_core = decl.port.symbol().and_then(|p| affinity.ports.get(&p));
                if let (Some(frame), Some(core)) = (decl.name.symbol(), port_core) {
                    let core = core.clone();
                    affinity.frames.insert(frame, core);
                }
            }
        });
        Ok(affinity)
    }

    /// Cores with at least one declared port, in order.
    pub fn cores(&self) -> BTreeSet<Core> {
        self.ports.values().cloned().collect()
    }

    pub fn port_core(&self, port: &Identifier) -> Option<&Core> {
        port.symbol().and_then(|symbol| self.ports.get(&symbol))
    }

    pub fn frame_core(&self, frame: &Identifier) -> Option<&Core> {
        frame.symbol().and_then(|symbol| self.frames.get(&symbol))
    }
}

/// Split `program`, which must have been analyzed, into one program per core.
/// Cores whose ports carry no timed statements still get a program.
pub fn split_by_core(program: &Program, setup: &dyn Setup) -> SemanticResult<BTreeMap<Core, Program>> {
    let affinity = CoreAffinity::from_program(program, setup)?;
    let split = affinity
        .cores()
        .into_iter()
        .map(|core| {
            log::debug!("splitting program for {core}");
            let splitter = Splitter {
                core: &core,
                affinity: &affinity,
            };
            let stmts = splitter.filter_stmts(program.stmts());
            (core.clone(), Program::from_stmts(stmts))
        })
        .collect();
    Ok(split)
}

struct Splitter<'a> {
    core: &'a Core,
    affinity: &'a CoreAffinity,
}

impl Splitter<'_> {
    // Frames that are not declared frames, such as defcal parameters, are kept everywhere.
    fn frame_here(&self, frame: &Identifier) -> bool {
        self.affinity
            .frame_core(frame)
            .map_or(true, |core| core == self.core)
    }

    // A call that passes declared frames belongs to the cores of those frames. Elsewhere
    // the frames are not declared, so the call is dropped.
    fn call_here(&self, args: &[Expr]) -> bool {
        let mut idents = Vec::new();
        for arg in args {
            arg.collect_identifiers(&mut idents);
        }
        let mut cores = idents
            .into_iter()
            .filter_map(|ident| self.affinity.frame_core(ident))
            .peekable();
        cores.peek().is_none() || cores.any(|core| core == self.core)
    }

    fn filter_stmts(&self, stmts: &[Stmt]) -> Vec<Stmt> {
        stmts.iter().filter_map(|stmt| self.filter_stmt(stmt)).collect()
    }

    fn filter_block(&self, block: &Block) -> Block {
        Block::new(self.filter_stmts(block.statements()))
    }

    fn filter_stmt(&self, stmt: &Stmt) -> Option<Stmt> {
        let kept = match stmt.kind() {
            StmtKind::DeclarePort(decl) => self
                .affinity
                .port_core(&decl.name)
                .map_or(true, |core| core == self.core)
                .then(|| stmt.clone()),
            StmtKind::DeclareFrame(decl) => self.frame_here(&decl.name).then(|| stmt.clone()),
            StmtKind::Play(op) | StmtKind::Capture(op) => {
                self.frame_here(&op.frame).then(|| stmt.clone())
            }
            StmtKind::FrameUpdate(update) => self.frame_here(&update.frame).then(|| stmt.clone()),
            StmtKind::Delay(delay) if !delay.frames.is_empty() => {
                let frames: Vec<Identifier> = delay
                    .frames
                    .iter()
                    .filter(|f| self.frame_here(f))
                    .cloned()
                    .collect();
                (!frames.is_empty()).then(|| {
                    stmt.with_kind(StmtKind::Delay(Delay::new(delay.duration.clone(), frames)))
                })
            }
            StmtKind::Barrier(barrier) => {
                let mut narrowed = barrier.clone();
                if let Some(frames) = narrowed.frames.as_mut() {
                    frames.retain(|f| self.frame_here(f));
                }
                Some(stmt.with_kind(StmtKind::Barrier(narrowed)))
            }
            // `cal` opens no scope, so what is declared in it may be used anywhere later.
            StmtKind::Cal(block) => {
                let body = self.filter_block(block);
                (!body.is_empty()).then(|| stmt.with_kind(StmtKind::Cal(body)))
            }
            StmtKind::DefCal(defcal) => {
                let body = self.filter_block(&defcal.body);
                has_effect(body.statements()).then(|| {
                    stmt.with_kind(StmtKind::DefCal(DefCal {
                        body,
                        ..defcal.clone()
                    }))
                })
            }
            // Calls to a subroutine are kept on every core, so the definition is too.
            // Unused ones are left to the dead-code eliminator.
            StmtKind::DefStmt(def) => Some(stmt.with_kind(StmtKind::DefStmt(DefStmt {
                body: self.filter_block(&def.body),
                ..def.clone()
            }))),
            StmtKind::ForStmt(for_stmt) => {
                let body = self.filter_block(&for_stmt.body);
                has_effect(body.statements()).then(|| {
                    stmt.with_kind(StmtKind::ForStmt(ForStmt {
                        body,
                        ..for_stmt.clone()
                    }))
                })
            }
            StmtKind::While(while_stmt) => {
                let body = self.filter_block(&while_stmt.body);
                has_effect(body.statements()).then(|| {
                    stmt.with_kind(StmtKind::While(While::new(
                        while_stmt.condition.clone(),
                        body,
                    )))
                })
            }
            StmtKind::If(if_stmt) => {
                let then_branch = self.filter_block(&if_stmt.then_branch);
                let else_branch = if_stmt.else_branch.as_ref().map(|b| self.filter_block(b));
                let effect = has_effect(then_branch.statements())
                    || else_branch
                        .as_ref()
                        .is_some_and(|b| has_effect(b.statements()));
                effect.then(|| {
                    stmt.with_kind(StmtKind::If(If::new(
                        if_stmt.condition.clone(),
                        then_branch,
                        else_branch,
                    )))
                })
            }
            StmtKind::GateCall(call) => self.call_here(&call.args).then(|| stmt.clone()),
            StmtKind::ExprStmt(Expr::Call(call)) => {
                self.call_here(&call.args).then(|| stmt.clone())
            }
            _ => Some(stmt.clone()),
        };
        if kept.is_none() {
            log::debug!("{} dropped from {}", stmt.id(), self.core);
        }
        kept
    }
}

/// Whether a filtered body still does something on this core. Declarations of values,
/// and returns, do not count.
fn has_effect(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| {
        !matches!(
            stmt.kind(),
            StmtKind::CalibrationGrammar(_)
                | StmtKind::DeclareWaveform(_)
                | StmtKind::DeclareClassical(_)
                | StmtKind::InputDeclaration(_)
                | StmtKind::OutputDeclaration(_)
                | StmtKind::Return(_)
        )
    })
}
