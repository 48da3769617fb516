//! Built-in demonstration programs.

use crate::asm::assembler::{assemble, AssemblerError};
use crate::cpu::decode::{Instruction, Opcode};
use crate::logic::Word4;

/// A named sample program.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub name: &'static str,
    pub source: &'static str,
}

impl Sample {
    /// Assemble the sample.
    pub fn program(&self) -> Result<Vec<Instruction>, AssemblerError> {
        assemble(self.source)
    }
}

/// The demonstration programs, in menu order.
pub const SAMPLES: [Sample; 8] = [
    Sample {
        name: "Basic arithmetic",
        source: "\
STO 0x4, 0x5    // M[4] = 5
ADD 0x4, 0x6    // 5 + 6 = 11
STO 0x1, 0xF    // M[1] = 15
SUB 0x1, 0x7    // 15 - 7 = 8
NOT 0xF, 0x0    // ~0 = 15
XOR 0x4, 0x3    // 11 ^ 3 = 8",
    },
    Sample {
        name: "Bitwise logic",
        source: "\
STO 0x2, 0xA    // 1010
AND 0x2, 0x3    // & 0011 -> 0010
STO 0x3, 0xC    // 1100
OR  0x3, 0x5    // | 0101 -> 1101
STO 0x5, 0x9    // 1001
XOR 0x5, 0x6    // ^ 0110 -> 1111
NOT 0x2, 0x0    // ~0010 -> 1101",
    },
    Sample {
        name: "Arithmetic chain",
        source: "\
STO 0x0, 0x1    // F0 = 1
STO 0x1, 0x1    // F1 = 1
ADD 0x0, 0x1    // F0 = 2
ADD 0x1, 0x2    // F1 = 3
ADD 0x0, 0x3    // F0 = 5
ADD 0x1, 0x5    // F1 = 8
SUB 0x0, 0x3    // F0 = 2",
    },
    Sample {
        name: "Memory copy and transform",
        source: "\
STO 0x8, 0x7    // 0111
ADD 0x8, 0x0    // read M[8] back unchanged
STO 0x9, 0x7    // copy to M[9]
NOT 0x8, 0x0    // -> 1000
XOR 0x9, 0xF    // 0111 ^ 1111 -> 1000
AND 0x8, 0x9    // 1000 & 1001 -> 1000",
    },
    Sample {
        name: "Overflow and underflow",
        source: "\
STO 0xA, 0xF    // 15
ADD 0xA, 0x1    // 15 + 1 -> 0, carry
STO 0xB, 0x0    // 0
SUB 0xB, 0x1    // 0 - 1 -> 15
ADD 0xA, 0x8    // 0 + 8 = 8
ADD 0xB, 0x7    // 15 + 7 -> 6, carry",
    },
    Sample {
        name: "Pattern generation",
        source: "\
STO 0xC, 0x5    // 0101
XOR 0xC, 0xA    // -> 1111
AND 0xC, 0x6    // -> 0110
OR  0xC, 0x9    // -> 1111
NOT 0xC, 0x0    // -> 0000
STO 0xD, 0x3    // 0011
XOR 0xD, 0xC    // 0011 ^ 1100 -> 1111",
    },
    Sample {
        name: "Nested arithmetic",
        source: "\
STO 0x6, 0x2    // a = 2
STO 0x7, 0x3    // b = 3
ADD 0x6, 0x4    // a = 6
ADD 0x7, 0x5    // b = 8
SUB 0x6, 0x2    // a = 4
SUB 0x7, 0x3    // b = 5
AND 0x6, 0x7    // a = 4 & 7 = 4",
    },
    Sample {
        name: "Complete ISA test",
        source: "\
STO 0xE, 0x8    // 8
ADD 0xE, 0x4    // 12
SUB 0xE, 0x3    // 9
AND 0xE, 0xD    // 1001 & 1101 = 1001
OR  0xE, 0x2    // 1001 | 0010 = 1011
XOR 0xE, 0x5    // 1011 ^ 0101 = 1110
NOT 0xE, 0x0    // ~1110 = 0001",
    },
];

/// Look up a sample by 1-based menu number.
pub fn sample(number: usize) -> Option<&'static Sample> {
    number.checked_sub(1).and_then(|i| SAMPLES.get(i))
}

/// The default five-instruction program.
pub fn default_program() -> Vec<Instruction> {
    let w = Word4::truncate;
    vec![
        Instruction::new(Opcode::Sto, w(0x4), w(0x5)),
        Instruction::new(Opcode::Add, w(0x4), w(0x6)),
        Instruction::new(Opcode::Sto, w(0x1), w(0xF)),
        Instruction::new(Opcode::Sub, w(0x1), w(0x7)),
        Instruction::new(Opcode::Not, w(0xF), w(0x0)),
    ]
}

/// Memory contents the default program must leave behind, as
/// `(address, value)` pairs.
pub const DEFAULT_EXPECTED: [(u8, u8); 3] = [(0x1, 0x8), (0x4, 0xB), (0xF, 0xF)];
