// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Compiler configuration, read from JSON. Every field has a default, so `{}` is a
// valid configuration.

use oqp_passes::command_table::DEFAULT_CAPACITY;
use oqp_passes::{EliminationPolicy, TimingConfig};
use oqp_semantics::inputs::Inputs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sample rate must be positive, found {0}")]
    SampleRate(f64),
    #[error("command table capacity must be between 1 and 65536, found {0}")]
    Capacity(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Samples per second of every core.
    pub sample_rate: f64,
    pub timing: TimingConfig,
    pub command_table_capacity: usize,
    pub elimination: EliminationPolicy,
    /// Fail the compilation if any timing warning is reported.
    pub warnings_as_errors: bool,
    /// Replay every split program against the barrier times of the source program.
    pub verify_split: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            sample_rate: 2e9,
            timing: TimingConfig::default(),
            command_table_capacity: DEFAULT_CAPACITY,
            elimination: EliminationPolicy::default(),
            warnings_as_errors: false,
            verify_split: true,
        }
    }
}

impl CompilerConfig {
    pub fn from_json(json: &str) -> Result<CompilerConfig, ConfigError> {
        let config: CompilerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CompilerConfig, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        CompilerConfig::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate > 0.0 && self.sample_rate.is_finite()) {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        // Table indices are u16.
        if self.command_table_capacity == 0 || self.command_table_capacity > 1 << 16 {
            return Err(ConfigError::Capacity(self.command_table_capacity));
        }
        Ok(())
    }
}

/// Read program inputs from a JSON object mapping input names to values.
pub fn inputs_from_json(json: &str) -> Result<Inputs, ConfigError> {
    Ok(serde_json::from_str(json)?)
}
