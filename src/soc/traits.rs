//! Storage Traits.
//!
//! Disk and RAM are both flat arrays of pages behind a lock. This trait lets
//! the dump collaborator and the statistics code walk either one without
//! caring which tier it is.

use crate::common::SimError;
use crate::soc::page::Page;

/// A lock-protected array of pages.
pub trait PageStore: Send + Sync {
    /// Returns the user-friendly name of the store.
    ///
    /// Used for logging and dump headers.
    fn name(&self) -> &str;

    /// Returns the number of pages (disk pages or RAM frames).
    fn page_count(&self) -> usize;

    /// Returns a copy of one page.
    fn read_page(&self, index: usize) -> Result<Page, SimError>;

    /// Returns a copy of every page in index order.
    ///
    /// The default implementation reads pages one by one; stores override
    /// it to take their lock once.
    fn snapshot(&self) -> Result<Vec<Page>, SimError> {
        (0..self.page_count()).map(|i| self.read_page(i)).collect()
    }
}
