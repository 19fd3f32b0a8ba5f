//! CPU execution engine.
//!
//! Each `Cpu` is a worker thread bound to at most one process at a time. The
//! short scheduler hands it a process with [`Cpu::dispatch`]; the worker then
//! runs a fetch-decode-execute burst until the process faults or halts, saves
//! the architectural state back into the PCB and reports itself idle.

mod execute;

use crate::common::sync::lock;
use crate::common::{AccessType, LogicalAddress, SimError};
use crate::core::arch::CpuState;
use crate::core::units::mmu::Mmu;
use crate::isa::{Format, Instruction};
use crate::kernel::pcb::{CpuId, Pcb};
use crate::stats::Statistics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// How a burst continues after one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Fetch the next instruction.
    Continue,
    /// A memory access faulted; the instruction must be replayed.
    Interrupted,
    /// The halt instruction executed.
    Halted,
}

#[derive(Default)]
struct Slot {
    current: Option<Arc<Pcb>>,
    busy: bool,
    shutdown: bool,
    failure: Option<SimError>,
}

/// One simulated CPU.
pub struct Cpu {
    id: CpuId,
    mmu: Arc<Mmu>,
    stats: Arc<Statistics>,
    slot: Mutex<Slot>,
    signal: Condvar,
    jobs_completed: AtomicU64,
}

impl Cpu {
    /// Creates an idle CPU.
    ///
    /// # Arguments
    ///
    /// * `id` - CPU number, starting at 1
    /// * `mmu` - MMU shared by every CPU
    /// * `stats` - Statistics recorder
    pub fn new(id: CpuId, mmu: Arc<Mmu>, stats: Arc<Statistics>) -> Self {
        Self {
            id,
            mmu,
            stats,
            slot: Mutex::new(Slot::default()),
            signal: Condvar::new(),
            jobs_completed: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> CpuId {
        self.id
    }

    /// Number of processes that halted on this CPU.
    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    /// Hands a RUNNING process to the worker.
    ///
    /// The caller must have observed the CPU idle first.
    pub fn dispatch(&self, pcb: Arc<Pcb>) {
        let mut slot = lock(&self.slot);
        slot.current = Some(pcb);
        slot.busy = true;
        self.signal.notify_all();
    }

    /// Blocks until the current burst, if any, has finished.
    ///
    /// # Returns
    ///
    /// The error that ended the last burst, if it failed.
    pub fn wait_idle(&self) -> Result<(), SimError> {
        let slot = lock(&self.slot);
        let mut slot = self
            .signal
            .wait_while(slot, |s| s.busy)
            .unwrap_or_else(PoisonError::into_inner);
        match slot.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Asks the worker loop to exit once idle.
    pub fn shutdown(&self) {
        lock(&self.slot).shutdown = true;
        self.signal.notify_all();
    }

    /// Worker loop; returns after [`Cpu::shutdown`].
    pub fn run(&self) {
        loop {
            let pcb = {
                let slot = lock(&self.slot);
                let mut slot = self
                    .signal
                    .wait_while(slot, |s| s.current.is_none() && !s.shutdown)
                    .unwrap_or_else(PoisonError::into_inner);
                match slot.current.take() {
                    Some(pcb) => pcb,
                    None => break,
                }
            };

            let outcome = self.run_process(&pcb);

            let mut slot = lock(&self.slot);
            slot.busy = false;
            if let Err(e) = outcome {
                log::error!("cpu {}: {}", self.id, e);
                slot.failure = Some(e);
            }
            self.signal.notify_all();
        }
        log::info!(
            "cpu {} stopped after {} jobs",
            self.id,
            self.jobs_completed()
        );
    }

    /// Runs one burst of `pcb` and saves its state back.
    pub fn run_process(&self, pcb: &Arc<Pcb>) -> Result<Flow, SimError> {
        let mut state = pcb.cpu_state();
        let outcome = self.burst(pcb, &mut state);
        let pc = state.pc;
        pcb.store_cpu_state(state);
        outcome.map_err(|e| e.in_process(pcb.id(), pc))
    }

    fn burst(&self, pcb: &Arc<Pcb>, state: &mut CpuState) -> Result<Flow, SimError> {
        let page_size = self.mmu.page_size();
        loop {
            let pc = state.pc;
            let addr = LogicalAddress::translate(pc, page_size);
            if self
                .mmu
                .check_for_interrupt(addr, AccessType::Fetch, pcb)?
                .is_some()
            {
                return Ok(Flow::Interrupted);
            }
            let word = self.mmu.read_cache(addr, pcb)?;
            state.pc += 1;

            state.instruction = Instruction::decode(word)?;
            log::trace!(
                "cpu {} pid {} pc {}: {} -> {}",
                self.id,
                pcb.id(),
                pc,
                word,
                state.instruction
            );
            self.stats
                .instructions_executed
                .fetch_add(1, Ordering::Relaxed);

            let inst = state.instruction;
            let flow = match inst.format {
                Format::Arithmetic => self.execute_arithmetic(state, &inst, word)?,
                Format::BranchImmediate => self.execute_branch(pcb, state, &inst, word)?,
                Format::Jump => self.execute_jump(pcb, state, &inst, word)?,
                Format::Io => self.execute_io(pcb, state, &inst, word)?,
            };
            match flow {
                Flow::Continue => {}
                Flow::Interrupted => {
                    state.pc = pc;
                    return Ok(flow);
                }
                Flow::Halted => return Ok(flow),
            }
        }
    }
}
