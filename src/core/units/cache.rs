//! Per-process cache.
//!
//! The cache is the CPU-visible working set of one process. It has one slot
//! per virtual page of the largest supported job; slot `n` only ever holds
//! virtual page `n`. A slot becomes valid once the DMA channel has copied
//! the page in from RAM, and becomes dirty when the CPU writes into it.

use crate::common::{LogicalAddress, SimError, Word};
use crate::soc::page::Page;

/// Resident pages of one process with valid and dirty bits per slot.
#[derive(Clone, Debug)]
pub struct Cache {
    slots: Vec<Page>,
    valid: Vec<bool>,
    dirty: Vec<bool>,
}

impl Cache {
    /// Creates a cache with every slot empty, invalid and clean.
    ///
    /// # Arguments
    ///
    /// * `slot_count` - Number of page slots
    /// * `page_size` - Words per slot
    pub fn new(slot_count: usize, page_size: usize) -> Self {
        Self {
            slots: (0..slot_count).map(|_| Page::new(page_size)).collect(),
            valid: vec![false; slot_count],
            dirty: vec![false; slot_count],
        }
    }

    /// Number of page slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn check(&self, index: usize) -> Result<(), SimError> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(SimError::PageOutOfRange {
                structure: "cache",
                index,
                len: self.slots.len(),
            })
        }
    }

    /// Returns the valid bit of a slot.
    pub fn is_slot_valid(&self, index: usize) -> Result<bool, SimError> {
        self.check(index)?;
        Ok(self.valid[index])
    }

    /// Returns the valid bit of the slot holding `addr`'s page.
    pub fn is_page_valid(&self, addr: LogicalAddress) -> Result<bool, SimError> {
        self.is_slot_valid(addr.page_number())
    }

    /// Returns the dirty bit of a slot.
    pub fn is_slot_modified(&self, index: usize) -> Result<bool, SimError> {
        self.check(index)?;
        Ok(self.dirty[index])
    }

    /// Returns the dirty bit of the slot holding `addr`'s page.
    pub fn is_page_modified(&self, addr: LogicalAddress) -> Result<bool, SimError> {
        self.is_slot_modified(addr.page_number())
    }

    /// Reads the word at a logical address.
    ///
    /// # Returns
    ///
    /// The word, or `SimError::UninitializedWord` if the slot is empty.
    pub fn read(&self, addr: LogicalAddress) -> Result<Word, SimError> {
        self.check(addr.page_number())?;
        self.slots[addr.page_number()]
            .read(addr.page_offset())?
            .ok_or(SimError::UninitializedWord {
                page: addr.page_number(),
                offset: addr.page_offset(),
            })
    }

    /// Writes the word at a logical address and marks the slot dirty.
    pub fn write(&mut self, addr: LogicalAddress, word: Word) -> Result<(), SimError> {
        self.check(addr.page_number())?;
        self.slots[addr.page_number()].write(addr.page_offset(), word)?;
        self.dirty[addr.page_number()] = true;
        Ok(())
    }

    /// Loads a page copied from RAM into its slot, valid and clean.
    pub fn fill(&mut self, index: usize, page: &Page) -> Result<(), SimError> {
        self.check(index)?;
        self.slots[index].copy_from(page)?;
        self.valid[index] = true;
        self.dirty[index] = false;
        Ok(())
    }

    /// Returns copies of every slot that is both valid and dirty.
    pub fn dirty_pages(&self) -> Vec<(usize, Page)> {
        (0..self.slots.len())
            .filter(|&i| self.valid[i] && self.dirty[i])
            .map(|i| (i, self.slots[i].clone()))
            .collect()
    }
}
