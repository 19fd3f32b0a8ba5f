//! Common utilities and types used throughout the operating-system simulator.
//!
//! This module provides the fundamental value types (memory words and
//! logical addresses), the simulator-wide constants, the access
//! classification used when touching memory, and the crate error type.

/// Logical address translation (linear word address to page/offset).
pub mod addr;

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types and error classification.
pub mod error;

/// Lock helpers shared by every lock-protected structure.
pub mod sync;

/// The 32-bit memory word.
pub mod word;

pub use addr::LogicalAddress;
pub use data::AccessType;
pub use error::{ErrorKind, SimError};
pub use word::Word;
