//! Architectural state components.
//!
//! This module contains the register file and the per-process saved CPU
//! state that a CPU loads on dispatch and stores back after each burst.

/// General-Purpose Register file implementation.
pub mod gpr;

/// Saved program counter, registers and current instruction.
pub mod state;

pub use gpr::Gpr;
pub use state::CpuState;
