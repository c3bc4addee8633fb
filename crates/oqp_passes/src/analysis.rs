// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Whole-program figures read off a program after duration resolution.

use crate::duration::ClockReport;
use oqp_semantics::asg::{walk_stmts, Expr, Literal, Program, Stmt, StmtKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the defcal whose delays bound the readout latency.
pub const MEASURE: &str = "measure";
const N_SHOTS: &str = "n_shots";
const N_STEPS: &str = "n_steps";

/// Number of shots and sweep steps, as declared by the `n_shots` and `n_steps` constants.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ShotsSignature {
    pub shots: u64,
    pub steps: Vec<u64>,
}

impl Default for ShotsSignature {
    fn default() -> Self {
        ShotsSignature {
            shots: 1,
            steps: vec![1],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProgramReport {
    pub shots: ShotsSignature,
    /// Largest product of trip counts along any nest of `for` loops.
    pub repetitions: u64,
    /// Elapsed samples per frame at the end of the program.
    pub frame_elapsed: BTreeMap<String, u64>,
    /// Longest delay inside a `measure` defcal, in samples.
    pub max_measure_delay: Option<u64>,
}

pub fn analyze_program(program: &Program, clocks: &ClockReport) -> ProgramReport {
    ProgramReport {
        shots: extract_shots(program),
        repetitions: repetitions(program.stmts(), clocks),
        frame_elapsed: clocks.final_clocks.clone(),
        max_measure_delay: max_measure_delay(program),
    }
}

pub fn extract_shots(program: &Program) -> ShotsSignature {
    let mut signature = ShotsSignature::default();
    walk_stmts(program.stmts(), &mut |stmt| {
        let StmtKind::DeclareClassical(decl) = stmt.kind() else {
            return;
        };
        let Some(init) = &decl.initializer else {
            return;
        };
        match decl.name.name() {
            N_SHOTS => match literal_count(init) {
                Some(shots) => signature.shots = shots,
                None => log::debug!("`{N_SHOTS}` is not an integer literal"),
            },
            N_STEPS => {
                let steps = match init {
                    Expr::ArrayLiteral(values) => values.iter().map(literal_count).collect(),
                    value => literal_count(value).map(|n| vec![n]),
                };
                match steps {
                    Some(steps) => signature.steps = steps,
                    None => log::debug!("`{N_STEPS}` is not made of integer literals"),
                }
            }
            _ => {}
        }
    });
    signature
}

fn literal_count(expr: &Expr) -> Option<u64> {
    match expr {
        Expr::Literal(Literal::Int(n)) => u64::try_from(*n).ok(),
        _ => None,
    }
}

fn repetitions(stmts: &[Stmt], clocks: &ClockReport) -> u64 {
    stmts
        .iter()
        .map(|stmt| {
            let inner = stmt
                .blocks()
                .into_iter()
                .map(|block| repetitions(block.statements(), clocks))
                .max()
                .unwrap_or(1);
            match stmt.kind() {
                StmtKind::ForStmt(_) => {
                    let trips = clocks.loop_trips.get(&stmt.id()).copied().unwrap_or(1);
                    trips.saturating_mul(inner)
                }
                _ => inner,
            }
        })
        .max()
        .unwrap_or(1)
}

/// Delays in `measure` defcals that were never invoked have no resolved duration and are
/// not counted.
pub fn max_measure_delay(program: &Program) -> Option<u64> {
    let mut max_delay = None;
    walk_stmts(program.stmts(), &mut |stmt| {
        let StmtKind::DefCal(defcal) = stmt.kind() else {
            return;
        };
        if defcal.name.name() != MEASURE {
            return;
        }
        walk_stmts(defcal.body.statements(), &mut |inner| {
            if let (StmtKind::Delay(_), Some(duration)) = (inner.kind(), inner.duration()) {
                max_delay = max_delay.max(Some(duration.max));
            }
        });
    });
    max_delay
}
