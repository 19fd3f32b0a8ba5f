//! Simulator-wide constants.
//!
//! Defaults for the configurable geometry live here so that the
//! configuration defaults and the component constructors agree.

/// Default number of words held by one page.
pub const DEFAULT_PAGE_SIZE: usize = 4;

/// Number of general-purpose registers addressable by a 4-bit field.
pub const REGISTER_COUNT: usize = 16;

/// Bytes per word. Instruction address fields are byte addresses and are
/// divided by this value to obtain word addresses.
pub const WORD_BYTES: usize = 4;

/// Default RAM capacity in words.
pub const DEFAULT_RAM_WORDS: usize = 1024;

/// Default disk capacity in words.
///
/// Pages are never shared between jobs, so the disk carries headroom for
/// the unused tail slots of each job's last page.
pub const DEFAULT_DISK_WORDS: usize = 2048 + 400;

/// Largest job (instructions plus data) the per-process cache must hold.
pub const DEFAULT_MAX_JOB_WORDS: usize = 72;

/// Default number of CPU workers.
pub const DEFAULT_CPU_COUNT: usize = 4;

/// Default number of pages the long scheduler loads eagerly per job.
pub const DEFAULT_INITIAL_LOAD_PAGES: usize = 4;

/// Poll interval used by daemons and workers while waiting on a condition.
pub const WAIT_SLICE_MS: u64 = 2;
