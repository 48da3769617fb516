//! # Fourbit
//!
//! A cycle-accurate model of a small 4-bit processor.
//!
//! The datapath is assembled bottom-up from its own gates: an XOR built
//! from AND/OR/NOT, a full adder using that XOR, a ripple-carry adder of
//! four full adders and a seven-operation ALU. A five-state control FSM
//! fetches 11-bit instructions, reads 16 four-bit memory cells, runs the
//! ALU and writes results back, one state per clock cycle.

pub mod logic;
pub mod cpu;
pub mod asm;
pub mod lint;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use logic::{Word4, WordError, AluOp, AluOutput};
pub use cpu::{Processor, ControlState, StepOutcome, RunOutcome, Memory, Instruction, Opcode, Trace, CycleRecord};
pub use asm::{assemble, disassemble, AssemblerError};
pub use lint::{RtlChecker, Report, LintError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
