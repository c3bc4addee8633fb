// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Compile-time identity of a waveform.
//
// Sample values are never computed. A waveform is identified by a canonical rendering of
// what produces it: the generator name with its folded arguments, the literal samples, or the
// name under which a placeholder was declared. Two waveforms with the same key have the same
// content and may share a command table entry.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WaveformKey(String);

impl WaveformKey {
    pub fn generated(name: &str, args: &[String]) -> WaveformKey {
        WaveformKey(format!("{name}({})", args.join(", ")))
    }

    pub fn samples(values: &[String]) -> WaveformKey {
        WaveformKey(format!("[{}]", values.join(", ")))
    }

    /// Placeholders have no content at compile time, so they are told apart by the name
    /// they were declared under.
    pub fn placeholder(declared_as: &str) -> WaveformKey {
        WaveformKey(format!("placeholder:{declared_as}"))
    }

    pub fn concat(left: &WaveformKey, right: &WaveformKey) -> WaveformKey {
        WaveformKey(format!("{} ++ {}", left.0, right.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WaveformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WaveformInfo {
    pub key: WaveformKey,
    pub samples: u64,
}

impl WaveformInfo {
    pub fn new(key: WaveformKey, samples: u64) -> WaveformInfo {
        WaveformInfo { key, samples }
    }

    pub fn concat(&self, other: &WaveformInfo) -> WaveformInfo {
        WaveformInfo {
            key: WaveformKey::concat(&self.key, &other.key),
            samples: self.samples.saturating_add(other.samples),
        }
    }
}
