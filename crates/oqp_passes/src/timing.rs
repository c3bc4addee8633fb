// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Hardware timing constraints on played, captured and delayed durations.
//!
//! Violations are warnings. A caller that wants them fatal promotes them.

use crate::duration::{ClockReport, TimedEvent};
use hashbrown::HashSet;
use oqp_semantics::asg::StmtId;
use oqp_semantics::TextRange;
use oqp_source_file::{ErrorTrait, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Constraints in samples. Both are properties of the sequencer hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub minimum_length: u64,
    pub granularity: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            minimum_length: 32,
            granularity: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimingWarningKind {
    BelowMinimumLength { minimum: u64 },
    Misaligned { granularity: u64 },
    /// A duration given in time units is not a whole number of samples.
    NonIntegralDuration,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimingWarning {
    kind: TimingWarningKind,
    stmt: StmtId,
    range: TextRange,
    duration: u64,
}

impl TimingWarning {
    pub fn new(kind: TimingWarningKind, stmt: StmtId, range: TextRange, duration: u64) -> Self {
        TimingWarning {
            kind,
            stmt,
            range,
            duration,
        }
    }

    pub fn kind(&self) -> TimingWarningKind {
        self.kind
    }

    pub fn stmt(&self) -> StmtId {
        self.stmt
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }
}

impl fmt::Display for TimingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TimingWarningKind::BelowMinimumLength { minimum } => write!(
                f,
                "duration of {} samples is below the minimum of {minimum}",
                self.duration
            ),
            TimingWarningKind::Misaligned { granularity } => write!(
                f,
                "duration of {} samples is not a multiple of {granularity}",
                self.duration
            ),
            TimingWarningKind::NonIntegralDuration => write!(
                f,
                "duration is not a whole number of samples, rounded to {}",
                self.duration
            ),
        }
    }
}

impl ErrorTrait for TimingWarning {
    fn message(&self) -> String {
        self.to_string()
    }

    fn range(&self) -> TextRange {
        self.range
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }
}

/// Check every timed event of `report`. A statement evaluated several times with the same
/// duration is reported once.
pub fn check_timing(report: &ClockReport, config: &TimingConfig) -> Vec<TimingWarning> {
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    for event in report.events.iter() {
        if !seen.insert((event.stmt, event.duration)) {
            continue;
        }
        warnings.extend(check_event(event, config));
    }
    warnings
}

fn check_event(event: &TimedEvent, config: &TimingConfig) -> Vec<TimingWarning> {
    let mut warnings = Vec::new();
    // An empty waveform or a zero delay emits nothing, so it cannot violate anything.
    if event.duration == 0 {
        return warnings;
    }
    if event.duration < config.minimum_length {
        warnings.push(TimingWarning::new(
            TimingWarningKind::BelowMinimumLength {
                minimum: config.minimum_length,
            },
            event.stmt,
            event.range,
            event.duration,
        ));
    }
    if config.granularity > 0 && event.duration % config.granularity != 0 {
        warnings.push(TimingWarning::new(
            TimingWarningKind::Misaligned {
                granularity: config.granularity,
            },
            event.stmt,
            event.range,
            event.duration,
        ));
    }
    if !warnings.is_empty() {
        log::debug!("{} {} violates timing constraints", event.kind, event.stmt);
    }
    warnings
}
