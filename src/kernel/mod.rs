//! Kernel: process table, fault queues and admission ordering.
//!
//! The process table is ordered once, before scheduling starts, by the
//! configured [`SchedulingPolicy`]. Dispatchers then scan it front to back;
//! a process sticks to the first CPU that claims it.

/// Page-fault and I/O-fault queues.
pub mod fault_queue;

/// Process Control Block and lifecycle states.
pub mod pcb;

use crate::common::sync::lock;
use crate::common::SimError;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub use fault_queue::{FaultBatch, FaultQueue};
pub use pcb::{CpuId, Pcb, ProcessId, ProcessState};

/// Admission order, chosen once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// Ascending job id.
    Fifo,
    /// Ascending job size.
    #[default]
    Sjf,
    /// Ascending priority value.
    Priority,
}

impl SchedulingPolicy {
    fn key(self, pcb: &Pcb) -> u64 {
        match self {
            SchedulingPolicy::Fifo => u64::from(pcb.id().value()),
            SchedulingPolicy::Sjf => pcb.job_size() as u64,
            SchedulingPolicy::Priority => u64::from(pcb.priority()),
        }
    }
}

impl FromStr for SchedulingPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(SchedulingPolicy::Fifo),
            "sjf" => Ok(SchedulingPolicy::Sjf),
            "priority" => Ok(SchedulingPolicy::Priority),
            _ => Err(SimError::Config(format!(
                "unsupported scheduling policy '{}' (expected FIFO, SJF or Priority)",
                s
            ))),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulingPolicy::Fifo => "FIFO",
            SchedulingPolicy::Sjf => "SJF",
            SchedulingPolicy::Priority => "Priority",
        };
        f.write_str(name)
    }
}

/// Shared process table plus the two fault queues.
pub struct Kernel {
    processes: Mutex<Vec<Arc<Pcb>>>,
    page_faults: FaultQueue,
    io_faults: FaultQueue,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel {
    pub fn new() -> Self {
        Self {
            processes: Mutex::new(Vec::new()),
            page_faults: FaultQueue::new("page"),
            io_faults: FaultQueue::new("I/O"),
        }
    }

    /// Appends a process to the table.
    pub fn admit(&self, pcb: Pcb) -> Arc<Pcb> {
        let pcb = Arc::new(pcb);
        lock(&self.processes).push(Arc::clone(&pcb));
        pcb
    }

    /// Reorders the process table by `policy`.
    ///
    /// Uses a heap keyed on (policy key, admission index), so processes with
    /// equal keys keep their admission order.
    pub fn order_by(&self, policy: SchedulingPolicy) {
        let mut processes = lock(&self.processes);
        let mut heap: BinaryHeap<Reverse<(u64, usize)>> = processes
            .iter()
            .enumerate()
            .map(|(seq, pcb)| Reverse((policy.key(pcb), seq)))
            .collect();
        let mut ordered = Vec::with_capacity(processes.len());
        while let Some(Reverse((_, seq))) = heap.pop() {
            ordered.push(Arc::clone(&processes[seq]));
        }
        *processes = ordered;
        log::info!("admitted {} jobs in {} order", processes.len(), policy);
    }

    /// Copy of the process table in its current order.
    pub fn snapshot(&self) -> Vec<Arc<Pcb>> {
        lock(&self.processes).clone()
    }

    /// Returns the first process eligible for `cpu`, binding it to `cpu`.
    ///
    /// A process is eligible when it is not RUNNING and is either unbound or
    /// already bound to `cpu`.
    pub fn claim_next(&self, cpu: CpuId) -> Option<Arc<Pcb>> {
        self.snapshot()
            .into_iter()
            .find(|pcb| pcb.state() != ProcessState::Running && pcb.try_claim(cpu))
    }

    /// Removes a finished process from the table.
    pub fn retire(&self, pid: ProcessId) -> Result<Arc<Pcb>, SimError> {
        let mut processes = lock(&self.processes);
        let index = processes
            .iter()
            .position(|pcb| pcb.id() == pid)
            .ok_or(SimError::UnknownProcess(pid))?;
        Ok(processes.remove(index))
    }

    pub fn process_count(&self) -> usize {
        lock(&self.processes).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.processes).is_empty()
    }

    pub fn page_faults(&self) -> &FaultQueue {
        &self.page_faults
    }

    pub fn io_faults(&self) -> &FaultQueue {
        &self.io_faults
    }

    /// Returns true when no process can move until a page fault is serviced.
    ///
    /// A process can move if it is RUNNING outside the page-fault queue, or
    /// if it is what [`Kernel::claim_next`] would hand one of `cpus` and it
    /// is not queued for a page fault.
    pub fn page_fault_stalled(&self, cpus: &[CpuId]) -> bool {
        let processes = self.snapshot();
        let blocked = |pcb: &Arc<Pcb>| self.page_faults.contains(pcb.id());
        if processes
            .iter()
            .any(|pcb| pcb.state() == ProcessState::Running && !blocked(pcb))
        {
            return false;
        }
        cpus.iter()
            .filter_map(|&cpu| {
                processes.iter().find(|pcb| {
                    pcb.state() != ProcessState::Running
                        && pcb.assigned_cpu().map_or(true, |owner| owner == cpu)
                })
            })
            .all(blocked)
    }

    /// Returns true while either fault queue holds the process.
    pub fn has_pending_fault(&self, pid: ProcessId) -> bool {
        self.page_faults.contains(pid) || self.io_faults.contains(pid)
    }
}
