//! Saved architectural state of a process.
//!
//! A process carries its program counter, register file and most recently
//! decoded instruction between CPU bursts. A CPU copies the state out when a
//! process is dispatched and stores it back when the burst ends.

use crate::core::arch::gpr::Gpr;
use crate::isa::Instruction;

/// Program counter, registers and current instruction of one process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CpuState {
    /// Word address of the next instruction to fetch.
    pub pc: usize,
    /// General-purpose registers.
    pub regs: Gpr,
    /// Last decoded instruction; re-decoding overwrites it.
    pub instruction: Instruction,
}

impl CpuState {
    /// Creates a zeroed state with `register_count` registers.
    pub fn new(register_count: usize) -> Self {
        Self {
            pc: 0,
            regs: Gpr::new(register_count),
            instruction: Instruction::default(),
        }
    }
}
