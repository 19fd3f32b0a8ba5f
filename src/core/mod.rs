//! CPU core: architectural state, functional units and the execution engine.

/// Register file and saved CPU state.
pub mod arch;

/// Fetch-decode-execute worker.
pub mod cpu;

/// ALU, process cache and MMU.
pub mod units;

pub use cpu::{Cpu, Flow};
