//! Process Control Block.
//!
//! A `Pcb` is shared between the kernel's process table, the fault queues,
//! the CPU running it and both daemons, so every mutable part sits behind
//! its own lock or atomic. No method holds more than one of them at a time.

use crate::common::sync::lock;
use crate::common::{LogicalAddress, SimError, Word};
use crate::core::arch::CpuState;
use crate::core::units::cache::Cache;
use crate::soc::{DiskExtent, Page, PageTable};
use crate::stats::Statistics;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Identifier of a CPU worker. CPUs are numbered from 1.
pub type CpuId = usize;

const UNASSIGNED: usize = 0;

/// Opaque process identifier, parsed from the job's hex id token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Wraps a numeric id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Parses a hex token such as `1`, `1E` or `0x1e`.
    pub fn parse_hex(token: &str) -> Result<Self, SimError> {
        parse_hex_token(token).map(Self)
    }

    /// Numeric value used for FIFO ordering.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// Parses a hex header token with an optional `0x` prefix.
pub fn parse_hex_token(token: &str) -> Result<u32, SimError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16).map_err(|_| SimError::InvalidWord(token.to_string()))
}

/// Lifecycle state of a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// Admitted, not yet loaded.
    New,
    /// Loaded and eligible for dispatch.
    Ready,
    /// Executing on a CPU.
    Running,
    /// Blocked on a page fault or an I/O fault.
    Waiting,
    /// Executed its halt instruction.
    Ended,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Waiting => "WAITING",
            ProcessState::Ended => "ENDED",
        };
        f.write_str(name)
    }
}

/// Declared buffer sizes of a job, in words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferSizes {
    pub input_words: usize,
    pub output_words: usize,
    pub temp_words: usize,
}

/// Input, output and temp buffers of a job.
///
/// Each buffer is a list of pages sized from the job's `Data` header. The
/// buffer contents live in the job's address space right after the
/// instructions, in input, output, temp order.
#[derive(Clone, Debug)]
pub struct JobBuffers {
    sizes: BufferSizes,
    pub input: Vec<Page>,
    pub output: Vec<Page>,
    pub temp: Vec<Page>,
}

impl JobBuffers {
    fn new(sizes: BufferSizes, page_size: usize) -> Self {
        let pages = |words: usize| -> Vec<Page> {
            (0..words.div_ceil(page_size))
                .map(|_| Page::new(page_size))
                .collect()
        };
        Self {
            sizes,
            input: pages(sizes.input_words),
            output: pages(sizes.output_words),
            temp: pages(sizes.temp_words),
        }
    }

    /// Declared sizes in words.
    pub fn sizes(&self) -> BufferSizes {
        self.sizes
    }
}

/// Word ranges of the regions of a job's address space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressLayout {
    pub instructions: Range<usize>,
    pub input: Range<usize>,
    pub output: Range<usize>,
    pub temp: Range<usize>,
}

/// Wall-clock accumulators driven by state transitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessTiming {
    timer: Option<Instant>,
    /// Total time spent RUNNING.
    pub running: Duration,
    /// Total time spent WAITING.
    pub waiting: Duration,
}

impl ProcessTiming {
    /// Restarts the interval timer.
    pub fn start(&mut self) {
        self.timer = Some(Instant::now());
    }

    /// Returns the time since the timer was last started and restarts it.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = self.timer.map(|t| now - t).unwrap_or_default();
        self.timer = Some(now);
        elapsed
    }

    /// Stops the interval timer.
    pub fn stop(&mut self) {
        self.timer = None;
    }

    /// Running plus waiting time.
    pub fn completion(&self) -> Duration {
        self.running + self.waiting
    }
}

struct Lifecycle {
    state: ProcessState,
    timing: ProcessTiming,
}

/// Everything needed to build a PCB at admission time.
#[derive(Clone, Debug)]
pub struct PcbParams {
    pub id: ProcessId,
    /// Instruction count from the job header.
    pub job_size: usize,
    pub priority: u32,
    /// Instruction plus data words.
    pub word_count: usize,
    pub buffers: BufferSizes,
    pub disk: DiskExtent,
    pub page_size: usize,
    pub cache_slots: usize,
    pub register_count: usize,
}

/// Process Control Block.
///
/// Equality and hashing only look at the process id.
pub struct Pcb {
    id: ProcessId,
    job_size: usize,
    priority: u32,
    word_count: usize,
    page_size: usize,
    buffers: JobBuffers,
    disk: DiskExtent,
    assigned_cpu: AtomicUsize,
    lifecycle: Mutex<Lifecycle>,
    cpu_state: Mutex<CpuState>,
    cache: Mutex<Cache>,
    page_table: Mutex<PageTable>,
    io_operations: AtomicU64,
    page_faults: AtomicU64,
    ram_used: Mutex<f64>,
}

impl Pcb {
    /// Creates a PCB in state NEW.
    ///
    /// The creation itself is reported to the statistics hook as the
    /// transition from no state to NEW.
    pub fn new(params: PcbParams, stats: &Statistics) -> Result<Self, SimError> {
        let mut timing = ProcessTiming::default();
        stats.process_state_change(params.id, &mut timing, None, ProcessState::New)?;

        Ok(Self {
            id: params.id,
            job_size: params.job_size,
            priority: params.priority,
            word_count: params.word_count,
            page_size: params.page_size,
            buffers: JobBuffers::new(params.buffers, params.page_size),
            disk: params.disk,
            assigned_cpu: AtomicUsize::new(UNASSIGNED),
            lifecycle: Mutex::new(Lifecycle {
                state: ProcessState::New,
                timing,
            }),
            cpu_state: Mutex::new(CpuState::new(params.register_count)),
            cache: Mutex::new(Cache::new(params.cache_slots, params.page_size)),
            page_table: Mutex::new(PageTable::for_words(params.word_count, params.page_size)),
            io_operations: AtomicU64::new(0),
            page_faults: AtomicU64::new(0),
            ram_used: Mutex::new(0.0),
        })
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Instruction count declared by the job header.
    pub fn job_size(&self) -> usize {
        self.job_size
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Instruction plus data words.
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn buffers(&self) -> &JobBuffers {
        &self.buffers
    }

    /// Disk pages holding the job.
    pub fn disk(&self) -> DiskExtent {
        self.disk
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessState {
        lock(&self.lifecycle).state
    }

    /// Moves the process to a new state.
    ///
    /// The statistics hook validates the transition and updates the timing
    /// accumulators before the state changes.
    ///
    /// # Returns
    ///
    /// `SimError::InvalidTransition` for an edge the lifecycle does not
    /// define; the state is left unchanged in that case.
    pub fn set_state(&self, new: ProcessState, stats: &Statistics) -> Result<(), SimError> {
        let mut lifecycle = lock(&self.lifecycle);
        let old = lifecycle.state;
        stats.process_state_change(self.id, &mut lifecycle.timing, Some(old), new)?;
        lifecycle.state = new;
        log::debug!("process {}: {} -> {}", self.id, old, new);
        Ok(())
    }

    /// Copy of the timing accumulators.
    pub fn timing(&self) -> ProcessTiming {
        lock(&self.lifecycle).timing
    }

    /// CPU the process is bound to, if any.
    pub fn assigned_cpu(&self) -> Option<CpuId> {
        match self.assigned_cpu.load(Ordering::Acquire) {
            UNASSIGNED => None,
            cpu => Some(cpu),
        }
    }

    /// Binds the process to a CPU unless another CPU already owns it.
    ///
    /// # Returns
    ///
    /// `true` if the process is now bound to `cpu`.
    pub fn try_claim(&self, cpu: CpuId) -> bool {
        match self.assigned_cpu.compare_exchange(
            UNASSIGNED,
            cpu,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => true,
            Err(owner) => owner == cpu,
        }
    }

    /// Copy of the saved architectural state.
    pub fn cpu_state(&self) -> CpuState {
        lock(&self.cpu_state).clone()
    }

    /// Saves the architectural state at the end of a CPU burst.
    pub fn store_cpu_state(&self, state: CpuState) {
        *lock(&self.cpu_state) = state;
    }

    /// Locks the process cache.
    pub fn cache(&self) -> MutexGuard<'_, Cache> {
        lock(&self.cache)
    }

    /// Locks the page table.
    pub fn page_table(&self) -> MutexGuard<'_, PageTable> {
        lock(&self.page_table)
    }

    pub fn record_io_operation(&self) {
        self.io_operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn io_operations(&self) -> u64 {
        self.io_operations.load(Ordering::Relaxed)
    }

    pub fn record_page_fault(&self) {
        self.page_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_faults(&self) -> u64 {
        self.page_faults.load(Ordering::Relaxed)
    }

    /// Fraction of RAM frames the job held when it finished.
    pub fn ram_used(&self) -> f64 {
        *lock(&self.ram_used)
    }

    pub fn set_ram_used(&self, fraction: f64) {
        *lock(&self.ram_used) = fraction;
    }

    /// Word ranges of the instruction and buffer regions.
    pub fn layout(&self) -> AddressLayout {
        let sizes = self.buffers.sizes();
        let instructions = 0..self.job_size;
        let input = instructions.end..instructions.end + sizes.input_words;
        let output = input.end..input.end + sizes.output_words;
        let temp = output.end..output.end + sizes.temp_words;
        AddressLayout {
            instructions,
            input,
            output,
            temp,
        }
    }

    /// Reads a slot of the output buffer from the process cache.
    ///
    /// # Returns
    ///
    /// `None` if the slot is outside the output buffer or its page is not
    /// resident in the cache.
    pub fn output_word(&self, slot: usize) -> Result<Option<Word>, SimError> {
        let output = self.layout().output;
        if slot >= output.len() {
            return Ok(None);
        }
        let addr = LogicalAddress::translate(output.start + slot, self.page_size);
        let cache = self.cache();
        if !cache.is_page_valid(addr)? {
            return Ok(None);
        }
        cache.read(addr).map(Some)
    }
}

impl PartialEq for Pcb {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Pcb {}

impl Hash for Pcb {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Pcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pcb")
            .field("id", &self.id)
            .field("job_size", &self.job_size)
            .field("priority", &self.priority)
            .field("state", &self.state())
            .field("assigned_cpu", &self.assigned_cpu())
            .finish()
    }
}
