//! Memory hierarchy storage tiers.
//!
//! Pages flow from the `Disk` (loaded once per job) into `Ram` frames (by the
//! long scheduler and the page manager) and from RAM into a process cache
//! (by the DMA channel). Each process's `PageTable` records which frame holds
//! which of its virtual pages.

/// Backing store.
pub mod disk;

/// Fixed-size block of words.
pub mod page;

/// Per-process virtual page to frame map.
pub mod page_table;

/// Main memory and the free-frame pool.
pub mod ram;

/// Common interface of page-array storage.
pub mod traits;

pub use disk::{Disk, DiskExtent};
pub use page::Page;
pub use page_table::PageTable;
pub use ram::{FramePool, Ram};
pub use traits::PageStore;
