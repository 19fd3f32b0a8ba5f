//! Functional units used by the CPUs.

/// Integer arithmetic and branch conditions.
pub mod alu;

/// Per-process cache of resident pages.
pub mod cache;

/// Fault classification and cache/RAM transfers.
pub mod mmu;
