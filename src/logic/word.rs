//! Fixed-width 4-bit words.
//!
//! Every datapath value in the machine (memory cells, ALU operands and
//! results, instruction address/immediate fields) is a [`Word4`]. The
//! invariant `value <= 0xF` is held by construction: checked constructors
//! reject wider values, truncating constructors mask them.

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// A 4-bit unsigned value in the range `0..=15`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Word4(u8);

impl Word4 {
    /// Number of bits in a word.
    pub const WIDTH: usize = 4;

    /// Bit mask covering the word.
    pub const MASK: u8 = 0xF;

    /// The all-zeros word.
    pub const ZERO: Word4 = Word4(0);

    /// The all-ones word (`0xF`).
    pub const MAX: Word4 = Word4(0xF);

    /// Create a word, rejecting values that do not fit in 4 bits.
    pub fn new(value: u8) -> Result<Self, WordError> {
        if value > Self::MASK {
            return Err(WordError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Create a word from the low 4 bits of `value`.
    #[inline]
    pub const fn truncate(value: u8) -> Self {
        Self(value & Self::MASK)
    }

    /// Create a word from the low 4 bits of a wider value.
    #[inline]
    pub const fn truncate_u16(value: u16) -> Self {
        Self((value & Self::MASK as u16) as u8)
    }

    /// The numeric value, always in `0..=15`.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The value as a memory index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Read bit `i` (0 = LSB).
    #[inline]
    pub const fn bit(self, i: usize) -> bool {
        (self.0 >> i) & 1 == 1
    }

    /// Split into bits, LSB first.
    pub fn bits(self) -> [bool; 4] {
        [self.bit(0), self.bit(1), self.bit(2), self.bit(3)]
    }

    /// Assemble a word from bits, LSB first.
    pub fn from_bits(bits: [bool; 4]) -> Self {
        let value = bits
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << i));
        Self(value)
    }

    /// One's complement within 4 bits.
    #[inline]
    pub const fn complement(self) -> Self {
        Self(!self.0 & Self::MASK)
    }

    /// Check if all bits are clear.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Iterate over all sixteen words in ascending order.
    pub fn all() -> impl Iterator<Item = Word4> {
        (0..=Self::MASK).map(Word4)
    }
}

impl std::ops::BitAnd for Word4 {
    type Output = Word4;

    fn bitand(self, rhs: Self) -> Word4 {
        Word4(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for Word4 {
    type Output = Word4;

    fn bitor(self, rhs: Self) -> Word4 {
        Word4(self.0 | rhs.0)
    }
}

impl std::ops::Not for Word4 {
    type Output = Word4;

    fn not(self) -> Word4 {
        self.complement()
    }
}

impl TryFrom<u8> for Word4 {
    type Error = WordError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Word4::new(value)
    }
}

impl From<Word4> for u8 {
    fn from(word: Word4) -> u8 {
        word.0
    }
}

impl fmt::Debug for Word4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word4(0x{:X}={:04b})", self.0, self.0)
    }
}

/// Displays as a single uppercase hex digit, the way the machine's
/// memory dumps show cells.
impl fmt::Display for Word4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl fmt::UpperHex for Word4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::Binary for Word4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

/// Errors from checked word construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    #[error("value {0} does not fit in 4 bits (0-15)")]
    OutOfRange(u8),
}
