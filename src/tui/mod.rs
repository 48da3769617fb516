//! TUI debugger for the 4-bit processor.
//!
//! Provides an interactive terminal-based debugger with:
//! - FSM state and datapath registers
//! - Memory view in hex and binary, highlighting the last access
//! - Cycle-by-cycle log and signal waveforms
//! - Step/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
