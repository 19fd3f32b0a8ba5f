//! Page manager daemon.
//!
//! Services the kernel's page-fault queue: every page a process is waiting
//! for is copied from its disk extent into a free RAM frame and mapped in
//! the process's page table. Also returns the frames of finished processes
//! to the free pool.

use crate::common::constants::WAIT_SLICE_MS;
use crate::common::SimError;
use crate::kernel::{CpuId, FaultBatch, Kernel, Pcb};
use crate::soc::{Disk, PageStore, Ram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Disk-to-RAM daemon.
pub struct PageManager {
    kernel: Arc<Kernel>,
    disk: Arc<Disk>,
    ram: Arc<Ram>,
    /// CPUs whose dispatchers could free frames by running a process.
    cpus: Vec<CpuId>,
    running: AtomicBool,
}

impl PageManager {
    pub fn new(kernel: Arc<Kernel>, disk: Arc<Disk>, ram: Arc<Ram>, cpus: Vec<CpuId>) -> Self {
        Self {
            kernel,
            disk,
            ram,
            cpus,
            running: AtomicBool::new(true),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Asks the daemon loop to exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.kernel.page_faults().wake_all();
        self.ram.pool().wake_all();
    }

    /// Daemon loop; returns after [`PageManager::stop`].
    pub fn run(&self) -> Result<(), SimError> {
        let slice = Duration::from_millis(WAIT_SLICE_MS);
        let queue = self.kernel.page_faults();
        while self.is_running() {
            if !queue.wait_for_work(slice) {
                continue;
            }
            let Some(batch) = queue.dequeue() else {
                continue;
            };
            self.service(&batch)?;
            queue.complete(batch.pcb.id())?;
            log::trace!("{} queue: process {} serviced", queue.name(), batch.pcb.id());
        }
        log::debug!("page manager stopped");
        Ok(())
    }

    /// Loads every page of one dequeued batch.
    ///
    /// Waits for frames to be released when the pool runs dry part way.
    ///
    /// # Returns
    ///
    /// `SimError::FrameStarvation` when the pool stays empty for two wait
    /// slices in a row while no process can run without a page fault being
    /// serviced first.
    pub fn service(&self, batch: &FaultBatch) -> Result<(), SimError> {
        let pcb = &batch.pcb;
        for &page in &batch.pages {
            let Some(frame) = self.next_frame(pcb)? else {
                return Ok(());
            };
            let data = self.disk.read_page(pcb.disk().begin + page)?;
            self.ram.write_frame(frame, &data)?;
            pcb.page_table().map(page, frame)?;
            pcb.record_page_fault();
            log::debug!("page manager: process {} page {} -> frame {}", pcb.id(), page, frame);
        }
        Ok(())
    }

    fn next_frame(&self, pcb: &Pcb) -> Result<Option<usize>, SimError> {
        let slice = Duration::from_millis(WAIT_SLICE_MS);
        let mut stalls = 0;
        loop {
            if let Some(frame) = self.ram.pool().take() {
                return Ok(Some(frame));
            }
            if !self.is_running() {
                return Ok(None);
            }
            if self.ram.pool().wait_for_frame(slice) {
                stalls = 0;
                continue;
            }
            // Frames only come back when a process ends.
            if self.kernel.page_fault_stalled(&self.cpus) {
                stalls += 1;
            } else {
                stalls = 0;
            }
            if stalls >= 2 {
                return Err(SimError::FrameStarvation {
                    pid: pcb.id(),
                    frames: self.ram.frame_count(),
                });
            }
        }
    }

    /// Unmaps every page of a finished process and frees its frames.
    ///
    /// Clearing is idempotent: running it twice frees nothing the second
    /// time.
    ///
    /// # Returns
    ///
    /// The number of frames returned to the pool.
    pub fn clean_page_table(&self, pcb: &Pcb) -> Result<usize, SimError> {
        let frames = {
            let mut table = pcb.page_table();
            let mut frames = Vec::new();
            for page in 0..table.len() {
                if let Some(frame) = table.clear(page)? {
                    frames.push(frame);
                }
            }
            frames
        };
        for &frame in &frames {
            self.ram.pool().release(frame);
        }
        Ok(frames.len())
    }
}
