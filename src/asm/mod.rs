//! Assembler and disassembler for 4-bit processor programs.
//!
//! This module provides:
//! - A line-oriented assembler (text → instructions / 11-bit words)
//! - A disassembler (words → readable text)
//! - The built-in sample programs

pub mod assembler;
pub mod disasm;
pub mod programs;

pub use assembler::{assemble, assemble_words, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use programs::{default_program, Sample, SAMPLES};
