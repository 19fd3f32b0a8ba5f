//! Integration tests for fault classification in the MMU.

use os_simulator::common::{AccessType, LogicalAddress, Word};
use os_simulator::core::units::mmu::{Fault, Mmu};
use os_simulator::kernel::pcb::{BufferSizes, PcbParams};
use os_simulator::kernel::{Kernel, Pcb, ProcessId, ProcessState};
use os_simulator::soc::{DiskExtent, Page, Ram};
use os_simulator::stats::Statistics;
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct Harness {
    kernel: Arc<Kernel>,
    ram: Arc<Ram>,
    stats: Arc<Statistics>,
    mmu: Mmu,
    pcb: Arc<Pcb>,
}

fn harness() -> Harness {
    let kernel = Arc::new(Kernel::new());
    let ram = Arc::new(Ram::new(16, 4));
    let stats = Arc::new(Statistics::new(16));
    let pcb = kernel.admit(
        Pcb::new(
            PcbParams {
                id: ProcessId::new(1),
                job_size: 12,
                priority: 0,
                word_count: 16,
                buffers: BufferSizes::default(),
                disk: DiskExtent { begin: 0, end: 3 },
                page_size: 4,
                cache_slots: 4,
                register_count: 16,
            },
            &stats,
        )
        .unwrap(),
    );
    pcb.set_state(ProcessState::Ready, &stats).unwrap();
    pcb.set_state(ProcessState::Running, &stats).unwrap();
    let mmu = Mmu::new(Arc::clone(&kernel), Arc::clone(&ram), Arc::clone(&stats));
    Harness {
        kernel,
        ram,
        stats,
        mmu,
        pcb,
    }
}

fn full_page(base: u32) -> Page {
    let mut page = Page::new(4);
    for i in 0..4 {
        page.write(i, Word::new(base + i as u32)).unwrap();
    }
    page
}

/// Tests that an unmapped page raises a page fault.
#[test]
fn test_unmapped_page_is_page_fault() {
    let h = harness();
    let addr = LogicalAddress::translate(5, 4);
    let fault = h
        .mmu
        .check_for_interrupt(addr, AccessType::Read, &h.pcb)
        .unwrap();

    assert_eq!(fault, Some(Fault::Page));
    assert_eq!(h.pcb.state(), ProcessState::Waiting);
    assert_eq!(h.kernel.page_faults().pending_pages(h.pcb.id()), Some(vec![1]));
    assert!(h.kernel.io_faults().is_empty());
    assert_eq!(h.stats.page_faults.load(Ordering::Relaxed), 1);
}

/// Tests that a mapped but uncached page raises an I/O fault.
#[test]
fn test_mapped_uncached_page_is_io_fault() {
    let h = harness();
    h.pcb.page_table().map(2, 7).unwrap();
    let addr = LogicalAddress::translate(9, 4);
    let fault = h
        .mmu
        .check_for_interrupt(addr, AccessType::Fetch, &h.pcb)
        .unwrap();

    assert_eq!(fault, Some(Fault::Io));
    assert_eq!(h.pcb.state(), ProcessState::Waiting);
    assert_eq!(h.kernel.io_faults().pending_pages(h.pcb.id()), Some(vec![2]));
    assert!(h.kernel.page_faults().is_empty());
    assert_eq!(h.stats.io_faults.load(Ordering::Relaxed), 1);
}

/// Tests that a cached page lets the access through untouched.
#[test]
fn test_cached_page_has_no_fault() {
    let h = harness();
    h.pcb.page_table().map(0, 3).unwrap();
    h.pcb.cache().fill(0, &full_page(10)).unwrap();
    let addr = LogicalAddress::translate(2, 4);
    let fault = h
        .mmu
        .check_for_interrupt(addr, AccessType::Write, &h.pcb)
        .unwrap();

    assert_eq!(fault, None);
    assert_eq!(h.pcb.state(), ProcessState::Running);
    assert!(!h.kernel.has_pending_fault(h.pcb.id()));
    assert_eq!(h.mmu.read_cache(addr, &h.pcb).unwrap(), Word::new(12));
}

/// Tests that only dirty pages are written back to their frames.
#[test]
fn test_write_to_ram_flushes_dirty_pages() {
    let h = harness();
    h.pcb.page_table().map(0, 3).unwrap();
    h.pcb.page_table().map(1, 4).unwrap();
    h.pcb.cache().fill(0, &full_page(10)).unwrap();
    h.pcb.cache().fill(1, &full_page(20)).unwrap();

    let addr = LogicalAddress::translate(6, 4);
    h.mmu.write_cache(addr, Word::new(0xabc), &h.pcb).unwrap();
    assert_eq!(h.mmu.write_to_ram(&h.pcb).unwrap(), 1);

    assert_eq!(h.ram.read_word(4, 2).unwrap(), Some(Word::new(0xabc)));
    assert_eq!(h.ram.read_word(4, 0).unwrap(), Some(Word::new(20)));
    assert_eq!(h.ram.read_word(3, 0).unwrap(), None);
}
