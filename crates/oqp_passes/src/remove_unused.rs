// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Dead-code elimination for split programs.
//!
//! A pass removes declarations nothing refers to, calls to defcals that are not in the
//! program, and loops, conditionals and `cal` blocks left with nothing in them. Removing
//! one declaration can leave another unreferenced, so passes are repeated.

use hashbrown::HashSet;
use itertools::Itertools;
use oqp_semantics::asg::{walk_stmts, Expr, Program, Stmt, StmtKind};
use oqp_semantics::symbols::SymbolId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationPolicy {
    /// Repeat until a pass removes nothing.
    #[default]
    FixedPoint,
    /// Run at most this many passes.
    Bounded(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EliminationReport {
    pub passes: usize,
    /// What was removed, in order of removal.
    pub removed: Vec<String>,
    /// Whether the last pass removed nothing.
    pub converged: bool,
}

pub fn remove_unused(program: &mut Program, policy: EliminationPolicy) -> EliminationReport {
    let limit = match policy {
        EliminationPolicy::FixedPoint => usize::MAX,
        EliminationPolicy::Bounded(passes) => passes,
    };
    let mut report = EliminationReport::default();
    while report.passes < limit {
        report.passes += 1;
        let removed = eliminate_once(program);
        log::debug!("pass {} removed {} item(s)", report.passes, removed.len());
        if removed.is_empty() {
            report.converged = true;
            break;
        }
        report.removed.extend(removed);
    }
    report
}

struct Usage {
    defcals: HashSet<SymbolId>,
    subroutines: HashSet<SymbolId>,
    referenced: HashSet<SymbolId>,
}

impl Usage {
    fn of(program: &Program) -> Usage {
        let mut usage = Usage {
            defcals: HashSet::new(),
            subroutines: HashSet::new(),
            referenced: HashSet::new(),
        };
        walk_stmts(program.stmts(), &mut |stmt| {
            match stmt.kind() {
                StmtKind::DefCal(defcal) => usage.defcals.extend(defcal.name.symbol()),
                StmtKind::DefStmt(def) => usage.subroutines.extend(def.name.symbol()),
                _ => {}
            }
            usage.referenced.extend(
                stmt.referenced_identifiers()
                    .into_iter()
                    .filter_map(|ident| ident.symbol()),
            );
        });
        usage
    }

    fn is_referenced(&self, stmt: &Stmt) -> bool {
        stmt.declared_identifier()
            .and_then(|ident| ident.symbol())
            .map_or(true, |symbol| self.referenced.contains(&symbol))
    }

    // An initializer that runs a subroutine may take time, so it is kept.
    fn calls_subroutine(&self, expr: &Expr) -> bool {
        let mut idents = Vec::new();
        expr.collect_identifiers(&mut idents);
        idents
            .iter()
            .filter_map(|ident| ident.symbol())
            .any(|symbol| self.subroutines.contains(&symbol))
    }
}

fn eliminate_once(program: &mut Program) -> Vec<String> {
    let usage = Usage::of(program);
    let mut removed = Vec::new();
    retain_stmts(program.stmts_mut(), &usage, &mut removed);
    removed
}

fn retain_stmts(stmts: &mut Vec<Stmt>, usage: &Usage, removed: &mut Vec<String>) {
    stmts.retain_mut(|stmt| {
        for block in stmt.blocks_mut() {
            retain_stmts(block.statements_mut(), usage, removed);
        }
        match removal(stmt, usage) {
            Some(what) => {
                log::debug!("removing {what} ({})", stmt.id());
                removed.push(what);
                false
            }
            None => true,
        }
    });
}

/// Describe `stmt` if it is dead.
fn removal(stmt: &Stmt, usage: &Usage) -> Option<String> {
    let unreferenced = || {
        let ident = stmt.declared_identifier()?;
        (!usage.is_referenced(stmt)).then(|| ident.name().to_string())
    };
    match stmt.kind() {
        StmtKind::GateCall(call) => {
            let symbol = call.name.symbol()?;
            if usage.defcals.contains(&symbol) {
                return None;
            }
            Some(format!("call `{} {}`", call.name.name(), call.qubits.iter().join(", ")))
        }
        StmtKind::DeclarePort(_)
        | StmtKind::DeclareFrame(_)
        | StmtKind::DeclareWaveform(_)
        | StmtKind::InputDeclaration(_)
        | StmtKind::DefStmt(_)
        | StmtKind::DefCal(_) => unreferenced(),
        StmtKind::DeclareClassical(decl) => {
            let effectful = decl
                .initializer
                .as_ref()
                .is_some_and(|init| usage.calls_subroutine(init));
            if effectful {
                None
            } else {
                unreferenced()
            }
        }
        StmtKind::Cal(block) if block.is_empty() => Some("empty `cal` block".to_string()),
        StmtKind::ForStmt(for_stmt) if for_stmt.body.is_empty() => {
            Some("empty `for` loop".to_string())
        }
        StmtKind::While(while_stmt) if while_stmt.body.is_empty() => {
            Some("empty `while` loop".to_string())
        }
        StmtKind::If(if_stmt)
            if if_stmt.then_branch.is_empty()
                && if_stmt.else_branch.as_ref().map_or(true, |b| b.is_empty()) =>
        {
            Some("empty `if`".to_string())
        }
        _ => None,
    }
}
