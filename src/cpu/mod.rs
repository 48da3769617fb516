//! Processor model.
//!
//! This module implements the complete machine:
//! - 16 four-bit memory cells
//! - PC, 11-bit instruction register, ALU result/carry registers
//! - a 5-state INIT/FETCH/LOAD/EXECUTE/STORE control FSM
//! - a per-cycle signal history for waveform viewers

pub mod memory;
pub mod decode;
pub mod execute;
pub mod trace;

pub use memory::{Memory, MEMORY_SIZE};
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Processor, ControlState, Decoded, StepOutcome, RunOutcome};
pub use trace::{CycleRecord, MemAccess, AccessKind, Signal, Trace};
