//! Memory Management Unit.
//!
//! The MMU sits between a CPU and the process cache. Before every memory
//! access the CPU asks it whether the target page is resident; a miss is
//! classified by the page table:
//!
//! * page not mapped to a RAM frame: **page fault**, serviced by the page
//!   manager (disk to RAM);
//! * page mapped but not cached: **I/O fault**, serviced by the DMA
//!   channel (RAM to cache).
//!
//! Either way the process is registered on the matching kernel queue and
//! moved to WAITING.

use crate::common::{AccessType, LogicalAddress, SimError, Word};
use crate::kernel::pcb::{Pcb, ProcessState};
use crate::kernel::Kernel;
use crate::soc::Ram;
use crate::stats::Statistics;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Kind of miss reported by [`Mmu::check_for_interrupt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The page has no RAM frame yet.
    Page,
    /// The page is in RAM but not in the process cache.
    Io,
}

/// Fault classifier and cache/RAM transfer unit shared by every CPU.
pub struct Mmu {
    kernel: Arc<Kernel>,
    ram: Arc<Ram>,
    stats: Arc<Statistics>,
}

impl Mmu {
    pub fn new(kernel: Arc<Kernel>, ram: Arc<Ram>, stats: Arc<Statistics>) -> Self {
        Self { kernel, ram, stats }
    }

    /// Words per page.
    pub fn page_size(&self) -> usize {
        self.ram.page_size()
    }

    /// Checks whether an access to `addr` can proceed.
    ///
    /// # Arguments
    ///
    /// * `addr` - Logical address about to be accessed
    /// * `access` - What the CPU is about to do with it
    /// * `pcb` - Process performing the access
    ///
    /// # Returns
    ///
    /// `None` if the page is cached. Otherwise the fault kind; the process
    /// has then been queued and moved to WAITING.
    pub fn check_for_interrupt(
        &self,
        addr: LogicalAddress,
        access: AccessType,
        pcb: &Arc<Pcb>,
    ) -> Result<Option<Fault>, SimError> {
        if pcb.cache().is_page_valid(addr)? {
            return Ok(None);
        }

        let page = addr.page_number();
        let mapped = pcb.page_table().is_valid(page)?;
        let fault = if mapped {
            self.kernel.io_faults().register(pcb, page);
            self.stats.io_faults.fetch_add(1, Ordering::Relaxed);
            Fault::Io
        } else {
            self.kernel.page_faults().register(pcb, page);
            self.stats.page_faults.fetch_add(1, Ordering::Relaxed);
            Fault::Page
        };
        log::debug!(
            "process {}: {:?} fault on {} at {}",
            pcb.id(),
            fault,
            access.label(),
            addr
        );
        pcb.set_state(ProcessState::Waiting, &self.stats)?;
        Ok(Some(fault))
    }

    /// Reads a word from the process cache.
    pub fn read_cache(&self, addr: LogicalAddress, pcb: &Pcb) -> Result<Word, SimError> {
        pcb.cache().read(addr)
    }

    /// Writes a word into the process cache, marking the slot dirty.
    pub fn write_cache(&self, addr: LogicalAddress, word: Word, pcb: &Pcb) -> Result<(), SimError> {
        pcb.cache().write(addr, word)
    }

    /// Flushes every valid and dirty cache slot back to its RAM frame.
    ///
    /// # Returns
    ///
    /// The number of pages written back.
    pub fn write_to_ram(&self, pcb: &Pcb) -> Result<usize, SimError> {
        let dirty = pcb.cache().dirty_pages();
        for (index, page) in &dirty {
            let frame = pcb
                .page_table()
                .frame(*index)?
                .ok_or(SimError::QueueConsistency {
                    queue: "page table",
                    pid: pcb.id(),
                    detail: "dirty cache page has no RAM frame",
                })?;
            self.ram.write_frame(frame, page)?;
        }
        if !dirty.is_empty() {
            log::debug!(
                "process {}: wrote {} dirty pages back to RAM",
                pcb.id(),
                dirty.len()
            );
        }
        Ok(dirty.len())
    }
}
