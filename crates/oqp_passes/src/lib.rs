// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Passes over analyzed OpenPulse programs.
//!
//! The passes run in this order:
//! * [`duration::resolve_durations`] times every statement against virtual frame clocks.
//! * [`timing::check_timing`] reports durations the hardware cannot realize.
//! * [`analysis::analyze_program`] collects shots, repetitions and measure delays.
//! * [`core_splitter::split_by_core`] makes one program per instrument core.
//! * [`remove_unused::remove_unused`] and [`command_table::assign_resources`] then run on each
//!   split program independently.

pub mod analysis;
pub mod command_table;
pub mod const_eval;
pub mod core_splitter;
pub mod duration;
pub mod remove_unused;
pub mod timing;
pub mod waveform;

pub use analysis::{analyze_program, ProgramReport, ShotsSignature};
pub use command_table::{assign_resources, CommandTable, CommandTableEntry};
pub use core_splitter::split_by_core;
pub use duration::{replay, resolve_durations, ClockReport, FrameClocks};
pub use remove_unused::{remove_unused, EliminationPolicy, EliminationReport};
pub use timing::{check_timing, TimingConfig, TimingWarning, TimingWarningKind};
pub use waveform::{WaveformInfo, WaveformKey};
