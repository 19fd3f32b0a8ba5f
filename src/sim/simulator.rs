//! Simulator wiring.
//!
//! Builds the storage tiers, kernel and statistics from a [`Config`], loads
//! jobs onto the disk and runs the long and short schedulers.

use crate::common::SimError;
use crate::config::Config;
use crate::core::units::mmu::Mmu;
use crate::core::Cpu;
use crate::kernel::pcb::{CpuId, Pcb, PcbParams};
use crate::kernel::{Kernel, SchedulingPolicy};
use crate::sim::dma::DmaChannel;
use crate::sim::dump::{CoreDump, DumpSink};
use crate::sim::loader::JobImage;
use crate::sim::long_scheduler::LongScheduler;
use crate::sim::page_manager::PageManager;
use crate::sim::short_scheduler::ShortScheduler;
use crate::soc::{Disk, Ram};
use crate::stats::Statistics;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// `(cpu id, jobs halted on it)` for every CPU.
    pub jobs_completed: Vec<(CpuId, u64)>,
    /// Frames used by the initial load.
    pub initial_frames: usize,
    pub wall_time: Duration,
}

impl RunSummary {
    /// Jobs completed across all CPUs.
    pub fn total_completed(&self) -> u64 {
        self.jobs_completed.iter().map(|(_, n)| n).sum()
    }
}

/// Top-level simulator.
pub struct Simulator {
    config: Config,
    policy: SchedulingPolicy,
    disk: Arc<Disk>,
    ram: Arc<Ram>,
    kernel: Arc<Kernel>,
    stats: Arc<Statistics>,
    dump: Arc<CoreDump>,
}

impl Simulator {
    /// Builds an idle simulator.
    ///
    /// # Returns
    ///
    /// `SimError::Config` if the configuration fails validation.
    pub fn new(config: Config) -> Result<Self, SimError> {
        config.validate()?;
        let policy = config.scheduling.policy_val()?;
        let memory = &config.memory;
        let disk = Arc::new(Disk::new(memory.disk_pages(), memory.page_size));
        let ram = Arc::new(Ram::new(memory.frame_count(), memory.page_size));
        let stats = Arc::new(Statistics::new(ram.frame_count()));
        Ok(Self {
            policy,
            disk,
            ram,
            kernel: Arc::new(Kernel::new()),
            stats,
            dump: Arc::new(CoreDump::new()),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    pub fn disk(&self) -> &Arc<Disk> {
        &self.disk
    }

    pub fn ram(&self) -> &Arc<Ram> {
        &self.ram
    }

    pub fn stats(&self) -> &Arc<Statistics> {
        &self.stats
    }

    pub fn dump(&self) -> &Arc<CoreDump> {
        &self.dump
    }

    /// Writes a job onto the disk and admits its PCB.
    ///
    /// # Returns
    ///
    /// The admitted PCB, `SimError::JobTooLarge` for a job the per-process
    /// cache cannot hold, `SimError::OutOfFrames` for a job with more pages
    /// than RAM has frames, or `SimError::DiskFull`.
    pub fn load_job(&self, job: &JobImage) -> Result<Arc<Pcb>, SimError> {
        let memory = &self.config.memory;
        if job.words.len() > memory.max_job_words {
            return Err(SimError::JobTooLarge {
                pid: job.id,
                words: job.words.len(),
                limit: memory.max_job_words,
            });
        }
        let pages = job.words.len().div_ceil(memory.page_size);
        if pages > memory.frame_count() {
            return Err(SimError::OutOfFrames {
                requested: pages,
                frames: memory.frame_count(),
            });
        }
        let disk = self.disk.append_job(&job.words)?;
        let pcb = Pcb::new(
            PcbParams {
                id: job.id,
                job_size: job.instruction_count,
                priority: job.priority,
                word_count: job.words.len(),
                buffers: job.buffers,
                disk,
                page_size: memory.page_size,
                cache_slots: memory.cache_slots(),
                register_count: self.config.cpu.register_count,
            },
            &self.stats,
        )?;
        log::debug!(
            "loaded job {}: {} words on disk pages {}..={}",
            job.id,
            job.words.len(),
            disk.begin,
            disk.end
        );
        Ok(self.kernel.admit(pcb))
    }

    /// Loads every job of a program.
    pub fn load_program(&self, jobs: &[JobImage]) -> Result<usize, SimError> {
        for job in jobs {
            self.load_job(job)?;
        }
        Ok(jobs.len())
    }

    /// Runs every admitted job to completion.
    pub fn run(&self) -> Result<RunSummary, SimError> {
        let start = Instant::now();
        self.kernel.order_by(self.policy);

        let initial_frames = LongScheduler::new(
            &self.kernel,
            &self.disk,
            &self.ram,
            &self.stats,
            self.config.memory.initial_load_pages,
        )
        .run()?;

        let mmu = Arc::new(Mmu::new(
            Arc::clone(&self.kernel),
            Arc::clone(&self.ram),
            Arc::clone(&self.stats),
        ));
        let cpus: Vec<Arc<Cpu>> = (1..=self.config.cpu.count)
            .map(|id| Arc::new(Cpu::new(id, Arc::clone(&mmu), Arc::clone(&self.stats))))
            .collect();
        let cpu_ids: Vec<CpuId> = cpus.iter().map(|cpu| cpu.id()).collect();
        let dump: Arc<dyn DumpSink> = self.dump.clone();
        let scheduler = ShortScheduler::new(
            Arc::clone(&self.kernel),
            Arc::clone(&self.ram),
            Arc::clone(&self.stats),
            dump,
            cpus,
            Arc::new(PageManager::new(
                Arc::clone(&self.kernel),
                Arc::clone(&self.disk),
                Arc::clone(&self.ram),
                cpu_ids,
            )),
            Arc::new(DmaChannel::new(Arc::clone(&self.kernel), Arc::clone(&self.ram))),
        );
        scheduler.run()?;
        self.dump.finish(&self.disk)?;

        let jobs_completed: Vec<(CpuId, u64)> = scheduler
            .cpus()
            .iter()
            .map(|cpu| (cpu.id(), cpu.jobs_completed()))
            .collect();
        for (id, count) in &jobs_completed {
            log::info!("cpu {} completed {} jobs", id, count);
        }
        let wall_time = start.elapsed();
        log::info!("run finished in {:.2?}", wall_time);

        Ok(RunSummary {
            jobs_completed,
            initial_frames,
            wall_time,
        })
    }
}
