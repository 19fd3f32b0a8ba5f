//! Integration tests for the kernel process table and the fault queues.

use os_simulator::common::SimError;
use os_simulator::kernel::pcb::{BufferSizes, PcbParams};
use os_simulator::kernel::{FaultQueue, Kernel, Pcb, ProcessId, ProcessState, SchedulingPolicy};
use os_simulator::soc::DiskExtent;
use os_simulator::stats::Statistics;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn make_pcb(id: u32, job_size: usize, priority: u32, stats: &Statistics) -> Pcb {
    Pcb::new(
        PcbParams {
            id: ProcessId::new(id),
            job_size,
            priority,
            word_count: job_size.max(1),
            buffers: BufferSizes::default(),
            disk: DiskExtent::default(),
            page_size: 4,
            cache_slots: 18,
            register_count: 16,
        },
        stats,
    )
    .unwrap()
}

fn ids(kernel: &Kernel) -> Vec<u32> {
    kernel.snapshot().iter().map(|p| p.id().value()).collect()
}

/// Tests the three admission orders.
#[test]
fn test_kernel_orderings() {
    let stats = Statistics::new(256);
    let kernel = Kernel::new();
    kernel.admit(make_pcb(3, 10, 1, &stats));
    kernel.admit(make_pcb(1, 30, 2, &stats));
    kernel.admit(make_pcb(2, 20, 0, &stats));

    kernel.order_by(SchedulingPolicy::Fifo);
    assert_eq!(ids(&kernel), vec![1, 2, 3]);
    kernel.order_by(SchedulingPolicy::Sjf);
    assert_eq!(ids(&kernel), vec![3, 2, 1]);
    kernel.order_by(SchedulingPolicy::Priority);
    assert_eq!(ids(&kernel), vec![2, 3, 1]);
}

/// Tests policy parsing, including an unsupported name.
#[test]
fn test_policy_parse() {
    assert_eq!("FIFO".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Fifo);
    assert_eq!("sjf".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Sjf);
    assert_eq!(
        "Priority".parse::<SchedulingPolicy>().unwrap(),
        SchedulingPolicy::Priority
    );
    assert!(matches!(
        "round-robin".parse::<SchedulingPolicy>(),
        Err(SimError::Config(_))
    ));
}

/// Tests that a process sticks to the first CPU claiming it.
#[test]
fn test_claim_is_sticky() {
    let stats = Statistics::new(256);
    let kernel = Kernel::new();
    kernel.admit(make_pcb(1, 4, 0, &stats));
    kernel.admit(make_pcb(2, 4, 0, &stats));

    let first = kernel.claim_next(1).unwrap();
    assert_eq!(first.id(), ProcessId::new(1));
    assert_eq!(first.assigned_cpu(), Some(1));

    let second = kernel.claim_next(2).unwrap();
    assert_eq!(second.id(), ProcessId::new(2));

    assert_eq!(kernel.claim_next(1).unwrap().id(), ProcessId::new(1));
    assert_eq!(kernel.claim_next(2).unwrap().id(), ProcessId::new(2));
    assert!(kernel.claim_next(3).is_none());
}

/// Tests that RUNNING processes are skipped by the scan.
#[test]
fn test_claim_skips_running() {
    let stats = Statistics::new(256);
    let kernel = Kernel::new();
    let p1 = kernel.admit(make_pcb(1, 4, 0, &stats));
    kernel.admit(make_pcb(2, 4, 0, &stats));
    p1.set_state(ProcessState::Ready, &stats).unwrap();
    p1.set_state(ProcessState::Running, &stats).unwrap();

    assert_eq!(kernel.claim_next(1).unwrap().id(), ProcessId::new(2));
}

/// Tests process retirement.
#[test]
fn test_retire() {
    let stats = Statistics::new(256);
    let kernel = Kernel::new();
    kernel.admit(make_pcb(1, 4, 0, &stats));
    assert_eq!(kernel.process_count(), 1);
    kernel.retire(ProcessId::new(1)).unwrap();
    assert!(kernel.is_empty());
    assert!(matches!(
        kernel.retire(ProcessId::new(1)),
        Err(SimError::UnknownProcess(_))
    ));
}

/// Tests that the fault queue serves processes in registration order.
#[test]
fn test_fault_queue_fifo() {
    let stats = Statistics::new(256);
    let queue = FaultQueue::new("page");
    let p1 = Arc::new(make_pcb(1, 16, 0, &stats));
    let p2 = Arc::new(make_pcb(2, 16, 0, &stats));
    let p3 = Arc::new(make_pcb(3, 16, 0, &stats));

    queue.register(&p1, 4);
    queue.register(&p2, 1);
    queue.register(&p3, 2);
    queue.register(&p1, 5);
    queue.register(&p2, 1);
    assert_eq!(queue.len(), 3);

    let first = queue.dequeue().unwrap();
    assert_eq!(first.pcb.id(), ProcessId::new(1));
    assert_eq!(first.pages, vec![4, 5]);
    let second = queue.dequeue().unwrap();
    assert_eq!(second.pcb.id(), ProcessId::new(2));
    assert_eq!(second.pages, vec![1]);
    let third = queue.dequeue().unwrap();
    assert_eq!(third.pcb.id(), ProcessId::new(3));
    assert_eq!(third.pages, vec![2]);
    assert!(queue.dequeue().is_none());
}

/// Tests that a dequeued process counts as pending until completed.
#[test]
fn test_fault_queue_in_service() {
    let stats = Statistics::new(256);
    let queue = FaultQueue::new("I/O");
    let p1 = Arc::new(make_pcb(1, 16, 0, &stats));
    queue.register(&p1, 0);
    assert_eq!(queue.pending_pages(p1.id()), Some(vec![0]));

    let batch = queue.dequeue().unwrap();
    assert!(queue.is_empty());
    assert!(queue.contains(p1.id()));
    queue.complete(batch.pcb.id()).unwrap();
    assert!(!queue.contains(p1.id()));

    assert!(matches!(
        queue.complete(p1.id()),
        Err(SimError::QueueConsistency { .. })
    ));
}

/// Tests that a waiting daemon is woken by a registration.
#[test]
fn test_fault_queue_wait_for_work() {
    let stats = Statistics::new(256);
    let queue = FaultQueue::new("page");
    let p1 = Arc::new(make_pcb(1, 16, 0, &stats));
    assert!(!queue.wait_for_work(Duration::from_millis(1)));
    std::thread::scope(|s| {
        let waiter = s.spawn(|| queue.wait_for_work(Duration::from_secs(5)));
        std::thread::sleep(Duration::from_millis(10));
        queue.register(&p1, 3);
        assert!(waiter.join().unwrap());
    });
}

/// Tests that the kernel reports faults pending on either queue.
#[test]
fn test_has_pending_fault() {
    let stats = Statistics::new(256);
    let kernel = Kernel::new();
    let p1 = kernel.admit(make_pcb(1, 16, 0, &stats));
    assert!(!kernel.has_pending_fault(p1.id()));
    kernel.io_faults().register(&p1, 1);
    assert!(kernel.has_pending_fault(p1.id()));
    let batch = kernel.io_faults().dequeue().unwrap();
    assert!(kernel.has_pending_fault(p1.id()));
    kernel.io_faults().complete(batch.pcb.id()).unwrap();
    assert!(!kernel.has_pending_fault(p1.id()));
}

/// Tests detection of a table where only page-fault service can make progress.
#[test]
fn test_page_fault_stalled() {
    let stats = Statistics::new(256);
    let kernel = Kernel::new();
    let p1 = kernel.admit(make_pcb(1, 16, 0, &stats));
    let p2 = kernel.admit(make_pcb(2, 16, 0, &stats));
    p1.set_state(ProcessState::Ready, &stats).unwrap();
    p2.set_state(ProcessState::Ready, &stats).unwrap();
    assert!(!kernel.page_fault_stalled(&[1]));

    assert!(p1.try_claim(1));
    p1.set_state(ProcessState::Running, &stats).unwrap();
    kernel.page_faults().register(&p1, 2);
    assert!(!kernel.page_fault_stalled(&[1]));
    p1.set_state(ProcessState::Waiting, &stats).unwrap();

    // cpu 1 keeps picking its own blocked process; a second CPU reaches p2.
    assert!(kernel.page_fault_stalled(&[1]));
    assert!(!kernel.page_fault_stalled(&[1, 2]));

    kernel.page_faults().register(&p2, 3);
    assert!(kernel.page_fault_stalled(&[1, 2]));
}

proptest! {
    /// Tests that every ordering sorts by its primary key, ties included.
    #[test]
    fn prop_orderings_sorted(jobs in prop::collection::vec((1usize..40, 0u32..8), 1..25)) {
        let stats = Statistics::new(256);
        let kernel = Kernel::new();
        for (i, (size, priority)) in jobs.iter().enumerate() {
            let id = (jobs.len() - i) as u32;
            kernel.admit(make_pcb(id, *size, *priority, &stats));
        }

        kernel.order_by(SchedulingPolicy::Fifo);
        let fifo: Vec<u32> = kernel.snapshot().iter().map(|p| p.id().value()).collect();
        prop_assert!(fifo.windows(2).all(|w| w[0] <= w[1]));

        kernel.order_by(SchedulingPolicy::Sjf);
        let sjf: Vec<usize> = kernel.snapshot().iter().map(|p| p.job_size()).collect();
        prop_assert!(sjf.windows(2).all(|w| w[0] <= w[1]));

        kernel.order_by(SchedulingPolicy::Priority);
        let prio: Vec<u32> = kernel.snapshot().iter().map(|p| p.priority()).collect();
        prop_assert!(prio.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(kernel.process_count(), jobs.len());
    }
}
