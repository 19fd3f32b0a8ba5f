//! Long-term scheduler: initial program load.
//!
//! Before dispatching starts, every admitted process gets its first pages
//! copied from disk into RAM, bypassing the fault path. Frames are handed
//! out by a bump allocator that runs across the whole load, starting at
//! frame 0.

use crate::common::SimError;
use crate::kernel::pcb::ProcessState;
use crate::kernel::Kernel;
use crate::soc::{Disk, PageStore, Ram};
use crate::stats::Statistics;

/// Eager loader for the first pages of each job.
pub struct LongScheduler<'a> {
    kernel: &'a Kernel,
    disk: &'a Disk,
    ram: &'a Ram,
    stats: &'a Statistics,
    pages_per_job: usize,
    next_frame: usize,
}

impl<'a> LongScheduler<'a> {
    pub fn new(
        kernel: &'a Kernel,
        disk: &'a Disk,
        ram: &'a Ram,
        stats: &'a Statistics,
        pages_per_job: usize,
    ) -> Self {
        Self {
            kernel,
            disk,
            ram,
            stats,
            pages_per_job,
            next_frame: 0,
        }
    }

    /// Loads every admitted process, in table order, and marks it READY.
    ///
    /// A job shorter than the configured page count only loads the pages it
    /// has.
    ///
    /// # Returns
    ///
    /// The number of frames used, or `SimError::OutOfFrames` when RAM is
    /// exhausted.
    pub fn run(&mut self) -> Result<usize, SimError> {
        let frames = self.ram.frame_count();
        for pcb in self.kernel.snapshot() {
            let pages = self.pages_per_job.min(pcb.page_table().len());
            for page in 0..pages {
                if self.next_frame >= frames {
                    return Err(SimError::OutOfFrames {
                        requested: self.next_frame + 1,
                        frames,
                    });
                }
                let data = self.disk.read_page(pcb.disk().begin + page)?;
                self.ram.write_frame(self.next_frame, &data)?;
                pcb.page_table().map(page, self.next_frame)?;
                self.next_frame += 1;
            }
            pcb.set_state(ProcessState::Ready, self.stats)?;
        }
        log::info!(
            "long scheduler loaded {} jobs into {} frames",
            self.kernel.process_count(),
            self.next_frame
        );
        Ok(self.next_frame)
    }
}
