//! Multi-CPU Operating System Simulator Library.
//!
//! This crate simulates a small multiprocessor operating system: jobs
//! written in a toy 32-bit instruction set are loaded onto a disk, admitted
//! by a kernel in FIFO, shortest-job-first or priority order, and executed
//! by several CPU worker threads. Memory is a three-tier hierarchy (disk,
//! RAM frames, per-process cache) kept consistent by two daemons that
//! service page faults and I/O faults.
//!
//! # Architecture
//!
//! * **Core**: per-CPU fetch-decode-execute engine, ALU, MMU and process cache.
//! * **Memory**: disk, RAM with a free-frame pool, per-process page tables.
//! * **Kernel**: PCBs, the process table and the two fault queues.
//! * **Scheduling**: long-term loader, short-term dispatchers, page manager
//!   and DMA daemons.
//!
//! # Modules
//!
//! * `common`: Shared types, constants, and error handling.
//! * `config`: Configuration loading and parsing.
//! * `core`: CPU core implementation.
//! * `isa`: Instruction Set Architecture definitions.
//! * `kernel`: Process table, PCBs and fault queues.
//! * `sim`: Schedulers, daemons, loader and simulator wiring.
//! * `soc`: Storage tiers.
//! * `stats`: Statistics collection and reporting.

/// Shared types, constants, and error handling.
///
/// Provides the memory word, logical address translation and the crate
/// error type used throughout the simulator.
pub mod common;

/// Configuration system for CPU, scheduling and memory geometry.
///
/// Loads and parses TOML configuration files; every field has a default.
pub mod config;

/// CPU core implementation including the MMU and execution units.
pub mod core;

/// Instruction Set Architecture definitions and decoders.
pub mod isa;

/// Process Control Blocks, fault queues and the process table.
pub mod kernel;

/// Simulation harness: loader, schedulers, daemons and dumps.
///
/// Coordinates the CPU worker threads and the memory daemons for one run.
pub mod sim;

/// Disk, RAM, pages and page tables.
pub mod soc;

/// Statistics collection and reporting.
///
/// Times every process state transition and builds the per-job report.
pub mod stats;
