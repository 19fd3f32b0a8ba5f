//! Instruction Set Architecture definitions.
//!
//! The simulated machine has a fixed 32-bit instruction word. The top two
//! bits select one of four formats, the next six bits the opcode, and the
//! remaining 24 bits carry format-dependent register and address fields.

/// Instruction word decoding and encoding.
pub mod instruction;

/// Opcode tables, one per instruction format.
pub mod opcodes;

pub use instruction::{Format, Instruction};
pub use opcodes::{ArithmeticOp, BranchOp, IoOp, JumpOp};
