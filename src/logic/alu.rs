//! 4-bit combinational ALU.
//!
//! Built from one [`add4`] ripple adder (shared by add and subtract) and
//! four parallel [`xor1`] gates. The unit is a pure function of its
//! inputs and is total over every select code.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::logic::Word4;
use crate::logic::adder::add4;
use crate::logic::gates::xor1;

/// ALU operation, selected by a 3-bit control code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluOp {
    /// `000`: pass A through.
    Transfer,
    /// `001`: A + B + cin.
    Add,
    /// `010`: A - B, as A + !B with carry-in forced high.
    Sub,
    /// `011`: A & B.
    And,
    /// `100`: A | B.
    Or,
    /// `101`: A xor B, one gate per bit.
    Xor,
    /// `110`: !A. B is ignored.
    Not,
    /// `111`: unused code. Outputs zero with no carry.
    Undefined,
}

impl AluOp {
    /// All operations in select-code order.
    pub const ALL: [AluOp; 8] = [
        AluOp::Transfer,
        AluOp::Add,
        AluOp::Sub,
        AluOp::And,
        AluOp::Or,
        AluOp::Xor,
        AluOp::Not,
        AluOp::Undefined,
    ];

    /// Decode a select code. Only the low 3 bits are wired.
    pub fn from_select(select: u8) -> Self {
        Self::ALL[usize::from(select & 0b111)]
    }

    /// The 3-bit select code.
    pub const fn select(self) -> u8 {
        match self {
            AluOp::Transfer => 0b000,
            AluOp::Add => 0b001,
            AluOp::Sub => 0b010,
            AluOp::And => 0b011,
            AluOp::Or => 0b100,
            AluOp::Xor => 0b101,
            AluOp::Not => 0b110,
            AluOp::Undefined => 0b111,
        }
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b}", self.select())
    }
}

/// The two ALU outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AluOutput {
    pub result: Word4,
    pub carry: bool,
}

impl AluOutput {
    const fn logic(result: Word4) -> Self {
        Self { result, carry: false }
    }
}

/// Evaluate the ALU.
///
/// `cin` only reaches the adder for [`AluOp::Add`]; subtraction always
/// forces it high to complete the two's complement of B.
pub fn compute(a: Word4, b: Word4, op: AluOp, cin: bool) -> AluOutput {
    match op {
        AluOp::Transfer => AluOutput::logic(a),
        AluOp::Add => {
            let (result, carry) = add4(a, b, cin);
            AluOutput { result, carry }
        }
        AluOp::Sub => {
            let (result, carry) = add4(a, b.complement(), true);
            AluOutput { result, carry }
        }
        AluOp::And => AluOutput::logic(a & b),
        AluOp::Or => AluOutput::logic(a | b),
        AluOp::Xor => {
            let (x, y) = (a.bits(), b.bits());
            let bits = [
                xor1(x[0], y[0]),
                xor1(x[1], y[1]),
                xor1(x[2], y[2]),
                xor1(x[3], y[3]),
            ];
            AluOutput::logic(Word4::from_bits(bits))
        }
        AluOp::Not => AluOutput::logic(!a),
        AluOp::Undefined => AluOutput::logic(Word4::ZERO),
    }
}
