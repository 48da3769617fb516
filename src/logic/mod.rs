//! Gate-level datapath primitives.
//!
//! This module provides the building blocks of the datapath, leaves first:
//! - [`gates`] - XOR from AND/OR/NOT and the 1-bit full adder
//! - [`adder`] - the 4-bit ripple-carry adder
//! - [`alu`] - the 7-operation ALU
//! - [`Word4`] - the 4-bit value carried on every bus

mod word;
pub mod gates;
pub mod adder;
pub mod alu;

pub use word::{Word4, WordError};
pub use gates::{xor1, full_adder1};
pub use adder::add4;
pub use alu::{AluOp, AluOutput};
