//! DMA channel daemon.
//!
//! Services the kernel's I/O-fault queue by copying RAM frames into the
//! waiting process's cache.

use crate::common::constants::WAIT_SLICE_MS;
use crate::common::SimError;
use crate::kernel::{FaultBatch, Kernel};
use crate::soc::{PageStore, Ram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// RAM-to-cache daemon.
pub struct DmaChannel {
    kernel: Arc<Kernel>,
    ram: Arc<Ram>,
    running: AtomicBool,
}

impl DmaChannel {
    pub fn new(kernel: Arc<Kernel>, ram: Arc<Ram>) -> Self {
        Self {
            kernel,
            ram,
            running: AtomicBool::new(true),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.kernel.io_faults().wake_all();
    }

    /// Daemon loop; returns after [`DmaChannel::stop`].
    pub fn run(&self) -> Result<(), SimError> {
        let slice = Duration::from_millis(WAIT_SLICE_MS);
        let queue = self.kernel.io_faults();
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
        log::debug!("DMA channel stopped");
        Ok(())
    }

    /// Copies every page of one dequeued batch into the process cache.
    pub fn service(&self, batch: &FaultBatch) -> Result<(), SimError> {
        let pcb = &batch.pcb;
        for &page in &batch.pages {
            let frame = pcb
                .page_table()
                .frame(page)?
                .ok_or(SimError::QueueConsistency {
                    queue: "I/O",
                    pid: pcb.id(),
                    detail: "cached page has no RAM frame",
                })?;
            let data = self.ram.read_page(frame)?;
            pcb.cache().fill(page, &data)?;
            pcb.record_io_operation();
            log::debug!("DMA: process {} frame {} -> cache slot {}", pcb.id(), frame, page);
        }
        Ok(())
    }
}
