//! Memory Access Types.
//!
//! This module defines the classification of memory accesses performed by a
//! CPU on behalf of a process. The MMU uses it to tag fault registrations so
//! that debug output shows whether a miss came from an instruction fetch or
//! from a data access.

/// Type of memory access operation.
///
/// Used to distinguish between instruction fetches, data reads,
/// and data writes when the MMU classifies a cache miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access.
    ///
    /// Used when fetching the word at the program counter.
    Fetch,

    /// Data read access.
    ///
    /// Used by load and input-buffer read instructions.
    Read,

    /// Data write access.
    ///
    /// Used by store and output-buffer write instructions. A completed write
    /// marks the touched cache slot dirty.
    Write,
}

impl AccessType {
    /// Returns a short lowercase label for log output.
    pub fn label(self) -> &'static str {
        match self {
            AccessType::Fetch => "fetch",
            AccessType::Read => "read",
            AccessType::Write => "write",
        }
    }
}
