//! Fixed-capacity page of words.
//!
//! A page is the unit of transfer between disk, RAM and a process cache.
//! Each slot is either empty or holds one word, and the page counts how many
//! slots are occupied. Slots are overwritten in place; a page never shrinks.

use crate::common::{SimError, Word};

/// A block of `page_size` word slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    words: Vec<Option<Word>>,
    used: usize,
}

impl Page {
    /// Creates an empty page.
    ///
    /// # Arguments
    ///
    /// * `page_size` - Number of word slots
    pub fn new(page_size: usize) -> Self {
        Self {
            words: vec![None; page_size],
            used: 0,
        }
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Returns the number of occupied slots.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Returns `true` once every slot holds a word.
    pub fn is_full(&self) -> bool {
        self.used == self.words.len()
    }

    /// Returns `true` if the slot has never been written.
    pub fn is_free(&self, offset: usize) -> bool {
        matches!(self.words.get(offset), Some(None))
    }

    /// Reads a slot.
    ///
    /// # Returns
    ///
    /// `Ok(None)` for an empty slot, or `SimError::PageOutOfRange` if the
    /// offset is past the end of the page.
    pub fn read(&self, offset: usize) -> Result<Option<Word>, SimError> {
        self.words
            .get(offset)
            .copied()
            .ok_or(SimError::PageOutOfRange {
                structure: "page slot",
                index: offset,
                len: self.words.len(),
            })
    }

    /// Writes a slot, counting it as occupied if it was empty.
    pub fn write(&mut self, offset: usize, word: Word) -> Result<(), SimError> {
        let len = self.words.len();
        let slot = self.words.get_mut(offset).ok_or(SimError::PageOutOfRange {
            structure: "page slot",
            index: offset,
            len,
        })?;
        if slot.is_none() {
            self.used += 1;
        }
        *slot = Some(word);
        Ok(())
    }

    /// Copies every occupied slot of `other` into this page.
    ///
    /// Empty slots in `other` leave the corresponding slot untouched.
    pub fn copy_from(&mut self, other: &Page) -> Result<(), SimError> {
        for (offset, word) in other.words.iter().enumerate() {
            if let Some(word) = word {
                self.write(offset, *word)?;
            }
        }
        Ok(())
    }

    /// Iterates over all slots in order.
    pub fn slots(&self) -> impl Iterator<Item = Option<Word>> + '_ {
        self.words.iter().copied()
    }
}
