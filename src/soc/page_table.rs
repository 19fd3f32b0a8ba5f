//! Per-process page table.
//!
//! Maps each virtual page of a job to the RAM frame holding it. An entry
//! carries a frame index only while its validity bit is set; clearing an
//! entry resets both, so clearing twice is harmless.

use crate::common::SimError;

/// Virtual page to RAM frame map with validity bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTable {
    frames: Vec<Option<usize>>,
    valid: Vec<bool>,
}

impl PageTable {
    /// Creates a table with `page_count` unmapped entries.
    pub fn new(page_count: usize) -> Self {
        Self {
            frames: vec![None; page_count],
            valid: vec![false; page_count],
        }
    }

    /// Creates a table large enough for `word_count` words.
    pub fn for_words(word_count: usize, page_size: usize) -> Self {
        Self::new(word_count.div_ceil(page_size))
    }

    /// Number of virtual pages.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` for a job with no pages.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn check(&self, page: usize) -> Result<(), SimError> {
        if page < self.frames.len() {
            Ok(())
        } else {
            Err(SimError::PageOutOfRange {
                structure: "page table",
                index: page,
                len: self.frames.len(),
            })
        }
    }

    /// Maps a virtual page to a frame and marks it valid.
    pub fn map(&mut self, page: usize, frame: usize) -> Result<(), SimError> {
        self.check(page)?;
        self.frames[page] = Some(frame);
        self.valid[page] = true;
        Ok(())
    }

    /// Returns the frame backing a page, if mapped.
    pub fn frame(&self, page: usize) -> Result<Option<usize>, SimError> {
        self.check(page)?;
        Ok(self.frames[page])
    }

    /// Returns the validity bit of a page.
    pub fn is_valid(&self, page: usize) -> Result<bool, SimError> {
        self.check(page)?;
        Ok(self.valid[page])
    }

    /// Unmaps a page and clears its validity bit.
    ///
    /// # Returns
    ///
    /// The frame that was mapped, if any.
    pub fn clear(&mut self, page: usize) -> Result<Option<usize>, SimError> {
        self.check(page)?;
        self.valid[page] = false;
        Ok(self.frames[page].take())
    }

    /// Iterates over `(page, frame)` for every mapped page.
    pub fn mapped(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.frames
            .iter()
            .enumerate()
            .filter_map(|(page, frame)| frame.map(|f| (page, f)))
    }

    /// Number of mapped pages.
    pub fn mapped_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }
}
