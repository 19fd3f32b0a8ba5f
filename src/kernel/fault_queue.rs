//! Fault queue shared by the page manager and the DMA channel.
//!
//! Processes are kept in first-registration order, each with the set of
//! page numbers it is waiting for. A dequeued process stays "in service"
//! until the daemon calls [`FaultQueue::complete`], so the dispatcher never
//! observes a half-serviced fault as resolved.

use crate::common::sync::lock;
use crate::common::SimError;
use crate::kernel::pcb::{Pcb, ProcessId};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// A process together with every page it was waiting for when dequeued.
#[derive(Debug)]
pub struct FaultBatch {
    pub pcb: Arc<Pcb>,
    /// Pages in registration order, without duplicates.
    pub pages: Vec<usize>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<FaultBatch>,
    in_service: HashSet<ProcessId>,
}

/// Ordered multimap from process to outstanding page numbers.
pub struct FaultQueue {
    name: &'static str,
    state: Mutex<QueueState>,
    work: Condvar,
}

impl FaultQueue {
    /// Creates an empty queue. `name` only appears in logs and errors.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(QueueState::default()),
            work: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `page` for `pcb`.
    ///
    /// A process already in the queue keeps its position and only gains the
    /// page if it was not already pending.
    pub fn register(&self, pcb: &Arc<Pcb>, page: usize) {
        let mut state = lock(&self.state);
        match state.pending.iter_mut().find(|b| b.pcb.id() == pcb.id()) {
            Some(batch) => {
                if !batch.pages.contains(&page) {
                    batch.pages.push(page);
                }
            }
            None => state.pending.push_back(FaultBatch {
                pcb: Arc::clone(pcb),
                pages: vec![page],
            }),
        }
        drop(state);
        log::debug!("{} fault: process {} page {}", self.name, pcb.id(), page);
        self.work.notify_all();
    }

    /// Removes the oldest-registered process with its whole page set.
    ///
    /// The process is marked in service until [`FaultQueue::complete`] is
    /// called for it.
    pub fn dequeue(&self) -> Option<FaultBatch> {
        let mut state = lock(&self.state);
        let batch = state.pending.pop_front()?;
        state.in_service.insert(batch.pcb.id());
        Some(batch)
    }

    /// Marks the service of a dequeued process as finished.
    ///
    /// # Returns
    ///
    /// `SimError::QueueConsistency` if the process was not dequeued.
    pub fn complete(&self, pid: ProcessId) -> Result<(), SimError> {
        let mut state = lock(&self.state);
        if state.in_service.remove(&pid) {
            Ok(())
        } else {
            Err(SimError::QueueConsistency {
                queue: self.name,
                pid,
                detail: "completed without being dequeued",
            })
        }
    }

    /// Returns true while the process is pending or in service.
    pub fn contains(&self, pid: ProcessId) -> bool {
        let state = lock(&self.state);
        state.in_service.contains(&pid) || state.pending.iter().any(|b| b.pcb.id() == pid)
    }

    /// Pending pages of a process that has not been dequeued yet.
    pub fn pending_pages(&self, pid: ProcessId) -> Option<Vec<usize>> {
        lock(&self.state)
            .pending
            .iter()
            .find(|b| b.pcb.id() == pid)
            .map(|b| b.pages.clone())
    }

    /// Number of processes waiting to be dequeued.
    pub fn len(&self) -> usize {
        lock(&self.state).pending.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).pending.is_empty()
    }

    /// Blocks until a process is pending or `timeout` elapses.
    ///
    /// # Returns
    ///
    /// `true` if the queue is non-empty on return.
    pub fn wait_for_work(&self, timeout: Duration) -> bool {
        let state = lock(&self.state);
        let (state, _) = self
            .work
            .wait_timeout_while(state, timeout, |s| s.pending.is_empty())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        !state.pending.is_empty()
    }

    /// Wakes every thread blocked in [`FaultQueue::wait_for_work`].
    pub fn wake_all(&self) {
        self.work.notify_all();
    }
}
