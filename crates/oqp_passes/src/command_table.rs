// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Command table resource assignment.
//!
//! The sequencer addresses waveforms by an index into a fixed-size table. Waveforms with the
//! same content share one entry.

use crate::duration::ClockReport;
use crate::waveform::{WaveformInfo, WaveformKey};
use hashbrown::HashMap;
use oqp_semantics::asg::{Program, Stmt, StmtId, StmtKind};
use oqp_semantics::semantic_error::{SemanticError, SemanticErrorKind, SemanticResult};
use oqp_semantics::TextRange;
use serde::Serialize;

/// Number of entries in a ZI sequencer command table.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandTableEntry {
    pub index: u16,
    pub waveform: WaveformKey,
    pub samples: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandTable {
    capacity: usize,
    entries: Vec<CommandTableEntry>,
    #[serde(skip)]
    index: HashMap<WaveformKey, u16>,
}

impl CommandTable {
    pub fn new(capacity: usize) -> CommandTable {
        CommandTable {
            capacity,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CommandTableEntry] {
        &self.entries
    }

    pub fn get(&self, key: &WaveformKey) -> Option<u16> {
        self.index.get(key).copied()
    }

    /// Return the index of `waveform`, adding an entry if its content is new.
    pub fn insert(&mut self, waveform: &WaveformInfo, range: TextRange) -> SemanticResult<u16> {
        if let Some(index) = self.get(&waveform.key) {
            return Ok(index);
        }
        let full = || {
            SemanticError::new(
                SemanticErrorKind::CommandTableCapacityExceeded {
                    capacity: self.capacity,
                },
                range,
            )
        };
        if self.entries.len() >= self.capacity {
            return Err(full());
        }
        let index = u16::try_from(self.entries.len()).map_err(|_| full())?;
        log::trace!("command table entry {index} for {}", waveform.key);
        self.entries.push(CommandTableEntry {
            index,
            waveform: waveform.key.clone(),
            samples: waveform.samples,
        });
        self.index.insert(waveform.key.clone(), index);
        Ok(index)
    }
}

/// Assign table indices to the waveforms declared or played in `program`, in program order.
///
/// Waveform values are looked up by statement id in `clocks`, which is the report of the
/// program that `program` was split from. Declarations that were never evaluated get no index.
pub fn assign_resources(
    program: &mut Program,
    clocks: &ClockReport,
    capacity: usize,
) -> SemanticResult<CommandTable> {
    let mut played: HashMap<StmtId, Vec<&WaveformInfo>> = HashMap::new();
    for event in clocks.waveforms.iter() {
        let waveforms = played.entry(event.stmt).or_default();
        if !waveforms.contains(&&event.waveform) {
            waveforms.push(&event.waveform);
        }
    }
    let mut table = CommandTable::new(capacity);
    assign(program.stmts_mut(), clocks, &played, &mut table)?;
    Ok(table)
}

fn assign(
    stmts: &mut [Stmt],
    clocks: &ClockReport,
    played: &HashMap<StmtId, Vec<&WaveformInfo>>,
    table: &mut CommandTable,
) -> SemanticResult<()> {
    for stmt in stmts.iter_mut() {
        let id = stmt.id();
        let range = stmt.range();
        match stmt.kind_mut() {
            StmtKind::DeclareWaveform(decl) => match clocks.declared_waveforms.get(&id) {
                Some(values) => {
                    let mut first = None;
                    for value in values {
                        let index = table.insert(value, range)?;
                        first.get_or_insert(index);
                    }
                    if let Some(index) = first {
                        decl.set_table_index(index);
                    }
                }
                None => log::debug!("waveform `{}` was never evaluated", decl.name.name()),
            },
            StmtKind::Play(_) | StmtKind::Capture(_) => {
                for waveform in played.get(&id).into_iter().flatten() {
                    table.insert(waveform, range)?;
                }
            }
            _ => {}
        }
        for block in stmt.blocks_mut() {
            assign(block.statements_mut(), clocks, played, table)?;
        }
    }
    Ok(())
}
