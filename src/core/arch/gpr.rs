//! General-Purpose Register file.
//!
//! Each process owns a register file inside its saved CPU state. Register
//! fields in an instruction are four bits wide, so at most sixteen registers
//! are addressable; the configured count may be smaller, in which case an
//! out-of-range field is an execution error.

use crate::common::SimError;

/// General-Purpose Register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gpr {
    regs: Vec<i64>,
}

impl Gpr {
    /// Creates a register file with all registers initialized to zero.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of registers
    pub fn new(count: usize) -> Self {
        Self {
            regs: vec![0; count],
        }
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    /// Returns `true` for a register file with no registers.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// Reads a general-purpose register value.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index
    ///
    /// # Returns
    ///
    /// The stored value, or `SimError::InvalidRegister` for an index past
    /// the end of the file.
    pub fn read(&self, idx: usize) -> Result<i64, SimError> {
        self.regs.get(idx).copied().ok_or(SimError::InvalidRegister {
            index: idx,
            count: self.regs.len(),
        })
    }

    /// Writes a value to a general-purpose register.
    ///
    /// There is no hardwired zero register; every register is writable.
    pub fn write(&mut self, idx: usize, val: i64) -> Result<(), SimError> {
        let count = self.regs.len();
        let slot = self
            .regs
            .get_mut(idx)
            .ok_or(SimError::InvalidRegister { index: idx, count })?;
        *slot = val;
        Ok(())
    }

    /// Formats the registers two per line, for trace output.
    pub fn dump(&self) -> Vec<String> {
        self.regs
            .chunks(2)
            .enumerate()
            .map(|(row, pair)| {
                pair.iter()
                    .enumerate()
                    .map(|(col, v)| format!("r{:<2}={:#010x}", row * 2 + col, *v as u32))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}
