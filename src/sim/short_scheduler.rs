//! Short-term scheduler and dispatcher.
//!
//! Owns the CPU bank and both memory daemons for the duration of a run.
//! One dispatcher thread per CPU scans the kernel's process table and drives
//! every process it claims through its lifecycle:
//!
//! * READY: moved to RUNNING and handed to the CPU;
//! * WAITING: moved back to READY once neither fault queue holds it;
//! * ENDED: dumped, reported, its frames released and the process retired.
//!
//! The run ends when the process table is empty, or as soon as any worker
//! reports an error.

use crate::common::SimError;
use crate::core::Cpu;
use crate::kernel::pcb::{CpuId, Pcb, ProcessState};
use crate::kernel::Kernel;
use crate::sim::dma::DmaChannel;
use crate::sim::dump::DumpSink;
use crate::sim::page_manager::PageManager;
use crate::soc::Ram;
use crate::stats::Statistics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Dispatcher bank plus the daemons it runs alongside.
pub struct ShortScheduler {
    kernel: Arc<Kernel>,
    ram: Arc<Ram>,
    stats: Arc<Statistics>,
    dump: Arc<dyn DumpSink>,
    cpus: Vec<Arc<Cpu>>,
    page_manager: Arc<PageManager>,
    dma: Arc<DmaChannel>,
    abort: AtomicBool,
}

impl ShortScheduler {
    pub fn new(
        kernel: Arc<Kernel>,
        ram: Arc<Ram>,
        stats: Arc<Statistics>,
        dump: Arc<dyn DumpSink>,
        cpus: Vec<Arc<Cpu>>,
        page_manager: Arc<PageManager>,
        dma: Arc<DmaChannel>,
    ) -> Self {
        Self {
            kernel,
            ram,
            stats,
            dump,
            cpus,
            page_manager,
            dma,
            abort: AtomicBool::new(false),
        }
    }

    pub fn cpus(&self) -> &[Arc<Cpu>] {
        &self.cpus
    }

    fn aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    fn raise_abort(&self) {
        self.abort.store(true, Ordering::Release);
    }

    /// Runs every process to completion.
    ///
    /// Starts the daemons and one worker plus one dispatcher per CPU, joins
    /// the dispatchers, then stops the CPUs and daemons.
    ///
    /// # Returns
    ///
    /// The first error raised by any dispatcher, CPU or daemon.
    pub fn run(&self) -> Result<(), SimError> {
        log::info!("short scheduler starting {} CPUs", self.cpus.len());
        thread::scope(|s| {
            let daemons = [
                s.spawn(|| self.watch(self.page_manager.run())),
                s.spawn(|| self.watch(self.dma.run())),
            ];
            let workers: Vec<_> = self
                .cpus
                .iter()
                .map(|cpu| s.spawn(move || cpu.run()))
                .collect();
            let dispatchers: Vec<_> = self
                .cpus
                .iter()
                .map(|cpu| s.spawn(move || self.watch(self.dispatch(cpu))))
                .collect();

            let mut first_error = None;
            for handle in dispatchers {
                let result = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }

            for cpu in &self.cpus {
                cpu.shutdown();
            }
            self.page_manager.stop();
            self.dma.stop();

            for handle in workers {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            }
            for handle in daemons {
                let result = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }

            match first_error {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
    }

    /// Raises the abort flag when a worker fails.
    fn watch(&self, result: Result<(), SimError>) -> Result<(), SimError> {
        if result.is_err() {
            self.raise_abort();
        }
        result
    }

    /// Dispatcher loop for one CPU.
    fn dispatch(&self, cpu: &Cpu) -> Result<(), SimError> {
        while !self.kernel.is_empty() && !self.aborted() {
            let Some(pcb) = self.kernel.claim_next(cpu.id()) else {
                // Our own process may still be RUNNING after a failed burst.
                cpu.wait_idle()?;
                thread::yield_now();
                continue;
            };
            cpu.wait_idle()?;

            match pcb.state() {
                ProcessState::Ready => {
                    pcb.set_state(ProcessState::Running, &self.stats)?;
                    cpu.dispatch(pcb);
                }
                ProcessState::Waiting => {
                    if self.kernel.has_pending_fault(pcb.id()) {
                        thread::yield_now();
                    } else {
                        pcb.set_state(ProcessState::Ready, &self.stats)?;
                    }
                }
                ProcessState::Ended => self.retire(&pcb, cpu.id())?,
                ProcessState::New | ProcessState::Running => thread::yield_now(),
            }
        }
        cpu.wait_idle()
    }

    /// Reports, cleans up and removes a finished process.
    fn retire(&self, pcb: &Arc<Pcb>, cpu: CpuId) -> Result<(), SimError> {
        self.dump.process_ended(pcb, cpu, &self.ram)?;
        let row = self.stats.record_job(pcb, cpu);
        let freed = self.page_manager.clean_page_table(pcb)?;
        self.kernel.retire(pcb.id())?;
        log::debug!(
            "process {} retired on cpu {}: {} page faults, {} I/O ops, {} frames freed",
            row.job_id,
            cpu,
            row.page_faults,
            row.io_operations,
            freed
        );
        Ok(())
    }
}
