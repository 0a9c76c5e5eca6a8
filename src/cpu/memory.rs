//! Basic Computer memory subsystem.
//!
//! A flat store of 4096 sixteen-bit words. The datapath always presents a
//! 12-bit address, so its accessors are infallible; host-facing accessors
//! take a `usize` and reject anything past the last word.

use crate::word::ADDR_MASK;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of words in memory.
pub const MEMORY_SIZE: usize = 4096;

/// Basic Computer memory: 4096 sixteen-bit words.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u16>,
}

impl Memory {
    /// Create a new memory with all words zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a word on behalf of the datapath. Only the low 12 bits of
    /// `addr` are used.
    #[inline]
    pub fn read(&self, addr: u16) -> u16 {
        self.cells[(addr & ADDR_MASK) as usize]
    }

    /// Write a word on behalf of the datapath.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) {
        self.cells[(addr & ADDR_MASK) as usize] = value;
    }

    /// Read a word for inspection by a host.
    pub fn peek(&self, addr: usize) -> Result<u16, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(addr))
    }

    /// Store a word from a host, before or between runs.
    pub fn load(&mut self, addr: usize, value: u16) -> Result<(), MemoryError> {
        let cell = self.cells
            .get_mut(addr)
            .ok_or(MemoryError::AddressOutOfRange(addr))?;
        *cell = value;
        Ok(())
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load a contiguous block of words starting at `start_addr`.
    pub fn load_program(&mut self, start_addr: usize, program: &[u16]) -> Result<(), MemoryError> {
        if start_addr >= MEMORY_SIZE || program.len() > MEMORY_SIZE - start_addr {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE.saturating_sub(start_addr),
            });
        }

        self.cells[start_addr..start_addr + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u16)> {
        let start = start.min(MEMORY_SIZE);
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }

    /// Addresses and values of every non-zero word.
    pub fn non_zero(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w != 0)
            .map(|(i, &w)| (i, w))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("non_zero_cells", &self.non_zero().count())
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during host memory access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("memory address {0} out of range (0-4095)")]
    AddressOutOfRange(usize),
    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
