//! Simulation harness: loader, schedulers, memory daemons and wiring.

/// DMA channel daemon (RAM to cache).
pub mod dma;

/// Core dump collaborator.
pub mod dump;

/// Program file parser.
pub mod loader;

/// Initial program load.
pub mod long_scheduler;

/// Page manager daemon (disk to RAM).
pub mod page_manager;

/// Dispatcher bank.
pub mod short_scheduler;

/// Top-level `Simulator`.
pub mod simulator;

pub use simulator::{RunSummary, Simulator};
