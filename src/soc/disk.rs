//! Disk: the backing store.
//!
//! Jobs are written onto the disk once, at load time, by appending their
//! words to fresh pages. A job's last page is never shared with the next
//! job, so the disk extent of a job maps one-to-one onto its virtual pages.

use crate::common::sync::lock;
use crate::common::{SimError, Word};
use crate::soc::page::Page;
use crate::soc::traits::PageStore;
use std::sync::Mutex;

/// Inclusive range of disk pages owned by one job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiskExtent {
    /// First disk page of the job (virtual page 0).
    pub begin: usize,
    /// Last disk page of the job.
    pub end: usize,
}

impl DiskExtent {
    /// Number of pages in the extent.
    pub fn len(&self) -> usize {
        self.end + 1 - self.begin
    }

    /// Always `false`; an extent holds at least one page.
    pub fn is_empty(&self) -> bool {
        false
    }
}

struct DiskInner {
    pages: Vec<Page>,
    next_free_page: usize,
}

/// Fixed pool of pages, append-allocated at load time.
pub struct Disk {
    page_size: usize,
    inner: Mutex<DiskInner>,
}

impl Disk {
    /// Creates an empty disk.
    ///
    /// # Arguments
    ///
    /// * `page_count` - Number of pages on the disk
    /// * `page_size` - Words per page
    pub fn new(page_count: usize, page_size: usize) -> Self {
        Self {
            page_size,
            inner: Mutex::new(DiskInner {
                pages: (0..page_count).map(|_| Page::new(page_size)).collect(),
                next_free_page: 0,
            }),
        }
    }

    /// Words per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Index of the first page not yet handed to a job.
    pub fn next_free_page(&self) -> usize {
        lock(&self.inner).next_free_page
    }

    /// Appends a job's words on contiguous fresh pages.
    ///
    /// # Arguments
    ///
    /// * `words` - Instruction and data words of the job, in address order
    ///
    /// # Returns
    ///
    /// The extent the job now occupies, or `SimError::DiskFull` if there are
    /// not enough free pages left. An empty job still reserves one page.
    pub fn append_job(&self, words: &[Word]) -> Result<DiskExtent, SimError> {
        let mut inner = lock(&self.inner);
        let needed = words.len().div_ceil(self.page_size).max(1);
        let begin = inner.next_free_page;
        let available = inner.pages.len() - begin;
        if needed > available {
            return Err(SimError::DiskFull {
                requested: needed,
                available,
            });
        }

        for (i, word) in words.iter().enumerate() {
            inner.pages[begin + i / self.page_size].write(i % self.page_size, *word)?;
        }
        inner.next_free_page = begin + needed;

        Ok(DiskExtent {
            begin,
            end: begin + needed - 1,
        })
    }
}

impl PageStore for Disk {
    fn name(&self) -> &str {
        "disk"
    }

    fn page_count(&self) -> usize {
        lock(&self.inner).pages.len()
    }

    fn read_page(&self, index: usize) -> Result<Page, SimError> {
        let inner = lock(&self.inner);
        inner
            .pages
            .get(index)
            .cloned()
            .ok_or(SimError::PageOutOfRange {
                structure: "disk page",
                index,
                len: inner.pages.len(),
            })
    }

    fn snapshot(&self) -> Result<Vec<Page>, SimError> {
        Ok(lock(&self.inner).pages.clone())
    }
}
