//! Per-cycle signal history.
//!
//! The processor appends one [`CycleRecord`] for every clock cycle it
//! executes. Records are never edited or removed except by a processor
//! reset, so a waveform viewer can hold on to indices between steps.

use crate::cpu::execute::ControlState;
use crate::logic::Word4;
use serde::{Serialize, Deserialize};

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    Read,
    Write,
}

/// A memory access performed during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemAccess {
    pub kind: AccessKind,
    pub addr: Word4,
    pub value: Word4,
}

/// Snapshot of the observable signals for one clock cycle.
///
/// Register outputs (`pc`, `instruction`, `alu_result`, `alu_carry`) are
/// sampled on the edge that starts the cycle, before the state executes.
/// `access` is whatever the state did to memory during the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// 1-based cycle number.
    pub cycle: u64,
    /// The FSM state that executed during this cycle.
    pub state: ControlState,
    pub pc: usize,
    /// Instruction register contents as an 11-bit word.
    pub instruction: u16,
    pub alu_result: Word4,
    pub alu_carry: bool,
    /// Only LOAD (read) and STORE (write) touch memory.
    pub access: Option<MemAccess>,
}

impl CycleRecord {
    /// Clock level for waveform display; toggles every cycle.
    pub const fn clk(&self) -> u8 {
        (self.cycle % 2) as u8
    }
}

/// A plottable signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Clk,
    Pc,
    State,
    AluOut,
    RamAddr,
    RamData,
}

impl Signal {
    /// Signals in the order a waveform viewer stacks them.
    pub const ALL: [Signal; 6] = [
        Signal::Clk,
        Signal::Pc,
        Signal::State,
        Signal::AluOut,
        Signal::RamAddr,
        Signal::RamData,
    ];

    /// Short label.
    pub const fn name(self) -> &'static str {
        match self {
            Signal::Clk => "CLK",
            Signal::Pc => "PC",
            Signal::State => "State",
            Signal::AluOut => "ALU",
            Signal::RamAddr => "ADDR",
            Signal::RamData => "DATA",
        }
    }

    /// Value range, for scaling plots.
    pub const fn range(self) -> (u64, u64) {
        match self {
            Signal::Clk => (0, 1),
            Signal::State => (0, 4),
            Signal::Pc | Signal::AluOut | Signal::RamAddr | Signal::RamData => (0, 15),
        }
    }

    /// Sample this signal from a record. Memory signals are `None` on
    /// cycles that do not access memory.
    pub fn sample(self, record: &CycleRecord) -> Option<u64> {
        match self {
            Signal::Clk => Some(u64::from(record.clk())),
            Signal::Pc => Some(record.pc as u64),
            Signal::State => Some(u64::from(record.state.ordinal())),
            Signal::AluOut => Some(u64::from(record.alu_result.value())),
            Signal::RamAddr => record.access.map(|a| u64::from(a.addr.value())),
            Signal::RamData => record.access.map(|a| u64::from(a.value.value())),
        }
    }
}

/// Append-only cycle history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    records: Vec<CycleRecord>,
}

impl Trace {
    /// Create an empty history.
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub(crate) fn push(&mut self, record: CycleRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[CycleRecord] {
        &self.records
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&CycleRecord> {
        self.records.last()
    }

    /// The trailing `n` records (fewer if the history is shorter).
    pub fn window(&self, n: usize) -> &[CycleRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Number of recorded cycles.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One signal across the whole history, for plotting.
    pub fn series(&self, signal: Signal) -> Vec<Option<u64>> {
        self.records.iter().map(|r| signal.sample(r)).collect()
    }

    /// Every memory access in order, the way a RAM timing view shows them.
    pub fn accesses(&self) -> impl Iterator<Item = &MemAccess> + '_ {
        self.records.iter().filter_map(|r| r.access.as_ref())
    }

    /// Serialize the history as a JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
