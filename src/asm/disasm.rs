//! Disassembler for 4-bit processor programs.
//!
//! Converts 11-bit machine words back to assembly text.

use crate::cpu::decode::{decode, Instruction};

/// Disassemble a single instruction to text.
pub fn disassemble_instruction(instr: &Instruction) -> String {
    instr.to_string()
}

/// Disassemble a raw machine word.
pub fn disassemble_word(word: u16) -> String {
    match decode(word) {
        Ok(instr) => disassemble_instruction(&instr),
        Err(_) => format!("??? ; 0x{word:X}"),
    }
}

/// Disassemble a program into a listing with addresses and encodings.
pub fn disassemble(program: &[Instruction]) -> String {
    let mut output = String::new();
    output.push_str("// 4-bit processor disassembly\n");
    output.push_str("// ----------------------------\n\n");

    for (addr, instr) in program.iter().enumerate() {
        let word = instr.encode();
        output.push_str(&format!(
            "{:02X}: {:<14} // {:011b} 0x{:03X}\n",
            addr,
            disassemble_instruction(instr),
            word,
            word
        ));
    }

    output
}
