// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// JSON setup files, laid out as
//
// {
//   "Instruments": { "hdawg1": { "type": "HDAWG8", "serial": "DEV8835" } },
//   "Ports": { "ch1": { "instrument": "hdawg1", "core": { "type": "HD", "index": 1, "channels": [1] } } },
//   "Frames": { "frame1": { "port": "ch1", "frequency": 5e9, "phase": 0.0 } }
// }

use crate::cores::{Core, CoreKind};
use crate::Setup;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not read setup file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed setup: {0}")]
    Json(#[from] serde_json::Error),
    #[error("port `{port}` refers to unknown instrument `{instrument}`")]
    UnknownInstrument { port: String, instrument: String },
    #[error("frame `{frame}` refers to unknown port `{port}`")]
    UnknownPort { frame: String, port: String },
    #[error("port `{0}` has no channels")]
    NoChannels(String),
    #[error("instrument `{instrument}` has no {kind} core {index}")]
    NoSuchCore {
        instrument: String,
        kind: CoreKind,
        index: u32,
    },
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentType {
    HDAWG8,
    HDAWG4,
    SHFSG8,
    SHFSG4,
    SHFQA4,
    SHFQA2,
    SHFQC6,
    SHFQC4,
    SHFQC2,
    SHFQC,
    PQSC,
}

impl InstrumentType {
    /// Number of cores of each kind on the instrument.
    pub fn cores(&self) -> &'static [(u32, CoreKind)] {
        use CoreKind::*;
        use InstrumentType::*;
        match self {
            HDAWG8 => &[(4, Output)],
            HDAWG4 => &[(2, Output)],
            SHFSG8 => &[(8, Output)],
            SHFSG4 => &[(4, Output)],
            SHFQA4 => &[(4, Input)],
            SHFQA2 => &[(2, Input)],
            SHFQC6 => &[(6, Output), (1, Input)],
            SHFQC4 => &[(4, Output), (1, Input)],
            SHFQC2 | SHFQC => &[(2, Output), (1, Input)],
            PQSC => &[],
        }
    }

    /// Return true if the instrument has a core of `kind` numbered `index`.
    /// Core indices start at 1 for each kind, except that mixed cores may be
    /// declared on any instrument with both kinds.
    fn has_core(&self, kind: CoreKind, index: u32) -> bool {
        let count = |wanted: CoreKind| {
            self.cores()
                .iter()
                .filter(|(_, k)| *k == wanted)
                .map(|(n, _)| *n)
                .sum::<u32>()
        };
        let available = match kind {
            CoreKind::Mixed => count(CoreKind::Output).min(count(CoreKind::Input)),
            other => count(other),
        };
        index >= 1 && index <= available
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    #[serde(rename = "type")]
    pub instrument_type: InstrumentType,
    pub serial: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(rename = "type")]
    pub kind: CoreKind,
    pub index: u32,
    pub channels: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    pub instrument: String,
    pub core: CoreConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub port: String,
    #[serde(default)]
    pub frequency: f64,
    #[serde(default)]
    pub phase: f64,
}

/// A setup read from JSON. Maps are ordered so that serializing a setup is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(rename = "Instruments")]
    pub instruments: BTreeMap<String, Instrument>,
    #[serde(rename = "Ports")]
    pub ports: BTreeMap<String, PortConfig>,
    #[serde(rename = "Frames", default)]
    pub frames: BTreeMap<String, FrameConfig>,
}

impl SetupConfig {
    pub fn from_json(json: &str) -> Result<SetupConfig, SetupError> {
        let setup: SetupConfig = serde_json::from_str(json)?;
        setup.validate()?;
        log::debug!(
            "setup with {} instruments, {} ports, {} frames",
            setup.instruments.len(),
            setup.ports.len(),
            setup.frames.len()
        );
        Ok(setup)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<SetupConfig, SetupError> {
        let json = std::fs::read_to_string(path)?;
        SetupConfig::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, SetupError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check that every reference in the setup resolves.
    pub fn validate(&self) -> Result<(), SetupError> {
        for (name, port) in &self.ports {
            let instrument = self.instruments.get(&port.instrument).ok_or_else(|| {
                SetupError::UnknownInstrument {
                    port: name.clone(),
                    instrument: port.instrument.clone(),
                }
            })?;
            if port.core.channels.is_empty() {
                return Err(SetupError::NoChannels(name.clone()));
            }
            if !instrument
                .instrument_type
                .has_core(port.core.kind, port.core.index)
            {
                return Err(SetupError::NoSuchCore {
                    instrument: port.instrument.clone(),
                    kind: port.core.kind,
                    index: port.core.index,
                });
            }
        }
        for (name, frame) in &self.frames {
            if !self.ports.contains_key(&frame.port) {
                return Err(SetupError::UnknownPort {
                    frame: name.clone(),
                    port: frame.port.clone(),
                });
            }
        }
        Ok(())
    }

    fn port_core(port: &PortConfig) -> Core {
        Core::new(&port.instrument, port.core.index, port.core.kind)
    }
}

impl Setup for SetupConfig {
    fn core(&self, name: &str) -> Option<Core> {
        let port = match self.ports.get(name) {
            Some(port) => port,
            None => self.ports.get(&self.frames.get(name)?.port)?,
        };
        Some(SetupConfig::port_core(port))
    }

    fn cores(&self) -> BTreeSet<Core> {
        self.ports.values().map(SetupConfig::port_core).collect()
    }

    fn serial(&self, instrument: &str) -> Option<&str> {
        self.instruments
            .get(instrument)
            .map(|instrument| instrument.serial.as_str())
    }
}
