//! Data memory.
//!
//! Sixteen 4-bit cells, addressed by the 4-bit `addr` field of an
//! instruction. Because addresses are [`Word4`] values every access is in
//! range and no access can fail.

use crate::logic::Word4;
use serde::{Serialize, Deserialize};

/// The number of memory cells.
pub const MEMORY_SIZE: usize = 16;

/// 16 × 4-bit memory.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Memory {
    cells: [Word4; MEMORY_SIZE],
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: [Word4::ZERO; MEMORY_SIZE],
        }
    }

    /// Read a cell.
    #[inline]
    pub fn read(&self, addr: Word4) -> Word4 {
        self.cells[addr.index()]
    }

    /// Write a cell.
    #[inline]
    pub fn write(&mut self, addr: Word4, value: Word4) {
        self.cells[addr.index()] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells = [Word4::ZERO; MEMORY_SIZE];
    }

    /// All cells, address 0 first.
    pub fn cells(&self) -> &[Word4; MEMORY_SIZE] {
        &self.cells
    }

    /// Cells as plain bytes, for consumers that do not know [`Word4`].
    pub fn to_bytes(&self) -> [u8; MEMORY_SIZE] {
        self.cells.map(Word4::value)
    }

    /// Addresses and values of every non-zero cell.
    pub fn non_zero(&self) -> Vec<(Word4, Word4)> {
        Word4::all()
            .map(|addr| (addr, self.read(addr)))
            .filter(|(_, value)| !value.is_zero())
            .collect()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cells: String = self.cells.iter().map(|c| format!("{c}")).collect();
        f.debug_struct("Memory")
            .field("cells", &cells)
            .finish()
    }
}
