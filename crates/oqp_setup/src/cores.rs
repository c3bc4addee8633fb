// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a core can do. Setup files name cores by sequencer type; those names are
/// accepted as aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoreKind {
    /// DAC only: plays waveforms.
    #[serde(alias = "HD", alias = "SG", alias = "output")]
    Output,
    /// ADC and DAC: plays and captures.
    #[serde(alias = "QA", alias = "input")]
    Input,
    #[serde(alias = "QC", alias = "mixed")]
    Mixed,
}

impl CoreKind {
    pub fn can_capture(&self) -> bool {
        !matches!(self, CoreKind::Output)
    }
}

impl fmt::Display for CoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoreKind::Output => "output",
            CoreKind::Input => "input",
            CoreKind::Mixed => "mixed",
        };
        write!(f, "{name}")
    }
}

/// One sequencer core of one instrument. The unit of splitting.
/// Ordered by instrument, then index, then kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Core {
    instrument: String,
    index: u32,
    kind: CoreKind,
}

impl Core {
    pub fn new<T: ToString>(instrument: T, index: u32, kind: CoreKind) -> Core {
        Core {
            instrument: instrument.to_string(),
            index,
            kind,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn kind(&self) -> CoreKind {
        self.kind
    }
}

impl fmt::Display for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.instrument, self.index, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cores_order_by_instrument_then_index() {
        let a = Core::new("hdawg1", 1, CoreKind::Output);
        let b = Core::new("hdawg1", 2, CoreKind::Output);
        let c = Core::new("shfqa1", 0, CoreKind::Input);
        assert!(a < b && b < c);
        assert_eq!(c.to_string(), "(shfqa1, 0, input)");
    }

    #[test]
    fn sequencer_names_are_aliases() {
        let kind: CoreKind = serde_json::from_str("\"QA\"").unwrap();
        assert_eq!(kind, CoreKind::Input);
        let kind: CoreKind = serde_json::from_str("\"SG\"").unwrap();
        assert_eq!(kind, CoreKind::Output);
        assert!(!kind.can_capture());
    }
}
