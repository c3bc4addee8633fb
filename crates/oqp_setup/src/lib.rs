// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! The instrument setup.
//!
//! A setup names the instruments of an experiment, and assigns every port to one core of one
//! instrument. Frames belong to a port and so to the port's core. The compiler splits a
//! program into one program per core.

mod config;
mod cores;

pub use crate::config::{
    CoreConfig, FrameConfig, Instrument, InstrumentType, PortConfig, SetupConfig, SetupError,
};
pub use crate::cores::{Core, CoreKind};

use std::collections::BTreeSet;

/// Read-only view of a setup, as consumed by the core splitter.
pub trait Setup {
    /// The core that the port or frame called `name` lives on.
    fn core(&self, name: &str) -> Option<Core>;

    /// Every core that some port is assigned to.
    fn cores(&self) -> BTreeSet<Core>;

    /// Serial number of the instrument called `instrument`.
    fn serial(&self, instrument: &str) -> Option<&str>;
}
