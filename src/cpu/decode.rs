//! Instruction format.
//!
//! Instructions are 11-bit words:
//!
//! ```text
//!  10  9  8 | 7  6  5  4 | 3  2  1  0
//!   opcode  |    addr    |    imm
//! ```
//!
//! `addr` names a memory cell that is both the source operand and the
//! destination; `imm` is the second operand.

use std::fmt;
use crate::logic::{AluOp, Word4};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Width of an instruction word in bits.
pub const INSTRUCTION_BITS: u32 = 11;

/// Largest valid instruction word.
pub const MAX_WORD: u16 = (1 << INSTRUCTION_BITS) - 1;

/// Instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Opcode {
    /// `M[addr] := imm`
    #[default]
    Sto,
    /// `M[addr] := M[addr] + imm`
    Add,
    /// `M[addr] := M[addr] - imm`
    Sub,
    /// `M[addr] := M[addr] & imm`
    And,
    /// `M[addr] := M[addr] | imm`
    Or,
    /// `M[addr] := M[addr] xor imm`
    Xor,
    /// `M[addr] := !M[addr]`
    Not,
    /// Opcode 7. Never emitted by the assembler; executes as
    /// `M[addr] := 0` through the ALU's undefined select code.
    Reserved,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 8] = [
        Opcode::Sto,
        Opcode::Add,
        Opcode::Sub,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Not,
        Opcode::Reserved,
    ];

    /// Decode the 3-bit opcode field.
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[usize::from(bits & 0b111)]
    }

    /// The 3-bit encoding.
    pub const fn bits(self) -> u8 {
        match self {
            Opcode::Sto => 0,
            Opcode::Add => 1,
            Opcode::Sub => 2,
            Opcode::And => 3,
            Opcode::Or => 4,
            Opcode::Xor => 5,
            Opcode::Not => 6,
            Opcode::Reserved => 7,
        }
    }

    /// Assembly mnemonic. The reserved opcode has none.
    pub const fn mnemonic(self) -> Option<&'static str> {
        match self {
            Opcode::Sto => Some("STO"),
            Opcode::Add => Some("ADD"),
            Opcode::Sub => Some("SUB"),
            Opcode::And => Some("AND"),
            Opcode::Or => Some("OR"),
            Opcode::Xor => Some("XOR"),
            Opcode::Not => Some("NOT"),
            Opcode::Reserved => None,
        }
    }

    /// Look up an opcode by mnemonic, case-insensitively.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().is_some_and(|m| m.eq_ignore_ascii_case(text)))
    }

    /// The ALU operation this opcode drives.
    pub const fn alu_op(self) -> AluOp {
        match self {
            Opcode::Sto => AluOp::Transfer,
            Opcode::Add => AluOp::Add,
            Opcode::Sub => AluOp::Sub,
            Opcode::And => AluOp::And,
            Opcode::Or => AluOp::Or,
            Opcode::Xor => AluOp::Xor,
            Opcode::Not => AluOp::Not,
            Opcode::Reserved => AluOp::Undefined,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic().unwrap_or("???"))
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub addr: Word4,
    pub imm: Word4,
}

impl Instruction {
    /// Build an instruction from its fields.
    pub const fn new(opcode: Opcode, addr: Word4, imm: Word4) -> Self {
        Self { opcode, addr, imm }
    }

    /// Encode to an 11-bit word.
    pub fn encode(&self) -> u16 {
        encode(self)
    }
}

/// The all-zeros word, `STO 0x0, 0x0`. This is what the instruction
/// register holds after reset.
impl Default for Instruction {
    fn default() -> Self {
        Self::new(Opcode::Sto, Word4::ZERO, Word4::ZERO)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0x{:X}, 0x{:X}", self.opcode, self.addr, self.imm)
    }
}

/// Decode an 11-bit instruction word.
///
/// Every 11-bit pattern is a valid instruction (opcode 7 decodes to
/// [`Opcode::Reserved`]); only words with bits above bit 10 are rejected.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    if word > MAX_WORD {
        return Err(DecodeError::WordTooWide(word));
    }

    Ok(Instruction {
        opcode: Opcode::from_bits((word >> 8) as u8),
        addr: Word4::truncate_u16(word >> 4),
        imm: Word4::truncate_u16(word),
    })
}

/// Encode an instruction to an 11-bit word.
pub fn encode(instr: &Instruction) -> u16 {
    (u16::from(instr.opcode.bits()) << 8)
        | (u16::from(instr.addr.value()) << 4)
        | u16::from(instr.imm.value())
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("instruction word 0x{0:X} is wider than 11 bits")]
    WordTooWide(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u8) -> Word4 {
        Word4::truncate(v)
    }

    #[test]
    fn test_decode_fields() {
        // NOT 0xF, 0x0
        let instr = decode(0b110_1111_0000).unwrap();
        assert_eq!(instr.opcode, Opcode::Not);
        assert_eq!(instr.addr.value(), 0xF);
        assert_eq!(instr.imm.value(), 0x0);

        // SUB 0x1, 0x7
        let instr = decode(0b010_0001_0111).unwrap();
        assert_eq!(instr, Instruction::new(Opcode::Sub, w(1), w(7)));
    }

    #[test]
    fn test_encode_matches_reference_program() {
        let program = [
            (Instruction::new(Opcode::Sto, w(0x4), w(0x5)), 0b000_0100_0101),
            (Instruction::new(Opcode::Add, w(0x4), w(0x6)), 0b001_0100_0110),
            (Instruction::new(Opcode::Sto, w(0x1), w(0xF)), 0b000_0001_1111),
            (Instruction::new(Opcode::Sub, w(0x1), w(0x7)), 0b010_0001_0111),
            (Instruction::new(Opcode::Not, w(0xF), w(0x0)), 0b110_1111_0000),
        ];

        for (instr, word) in program {
            assert_eq!(instr.encode(), word, "{instr}");
        }
    }

    #[test]
    fn test_every_word_roundtrips() {
        for word in 0..=MAX_WORD {
            assert_eq!(encode(&decode(word).unwrap()), word);
        }
    }

    #[test]
    fn test_opcode_seven_is_reserved() {
        let instr = decode(0x7A3).unwrap();
        assert_eq!(instr.opcode, Opcode::Reserved);
        assert_eq!(instr.opcode.alu_op(), AluOp::Undefined);
        assert_eq!(instr.to_string(), "??? 0xA, 0x3");
    }

    #[test]
    fn test_wide_word_rejected() {
        assert_eq!(decode(0x800), Err(DecodeError::WordTooWide(0x800)));
    }

    #[test]
    fn test_mnemonic_lookup() {
        assert_eq!(Opcode::from_mnemonic("xor"), Some(Opcode::Xor));
        assert_eq!(Opcode::from_mnemonic("Or"), Some(Opcode::Or));
        assert_eq!(Opcode::from_mnemonic("JMP"), None);
        assert_eq!(Opcode::from_mnemonic("???"), None);
    }
}
