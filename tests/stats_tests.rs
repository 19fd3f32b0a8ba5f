//! Integration tests for the statistics report.

use os_simulator::kernel::pcb::{BufferSizes, PcbParams, ProcessTiming};
use os_simulator::kernel::{Pcb, ProcessId, ProcessState};
use os_simulator::soc::DiskExtent;
use os_simulator::stats::Statistics;
use std::thread;
use std::time::Duration;

fn finished_pcb(stats: &Statistics, id: u32) -> Pcb {
    let pcb = Pcb::new(
        PcbParams {
            id: ProcessId::new(id),
            job_size: 8,
            priority: 0,
            word_count: 16,
            buffers: BufferSizes::default(),
            disk: DiskExtent::default(),
            page_size: 4,
            cache_slots: 18,
            register_count: 16,
        },
        stats,
    )
    .unwrap();
    pcb.page_table().map(0, 0).unwrap();
    pcb.page_table().map(1, 1).unwrap();
    pcb.set_state(ProcessState::Ready, stats).unwrap();
    pcb.set_state(ProcessState::Running, stats).unwrap();
    pcb.set_state(ProcessState::Ended, stats).unwrap();
    pcb.record_io_operation();
    pcb
}

/// Tests the RAM share of a job.
#[test]
fn test_percent_ram_used() {
    let stats = Statistics::new(8);
    let pcb = finished_pcb(&stats, 1);
    assert!((stats.percent_ram_used(&pcb) - 25.0).abs() < 1e-9);
}

/// Tests report rows and the CSV rendering.
#[test]
fn test_report_csv() {
    let stats = Statistics::new(8);
    let a = finished_pcb(&stats, 0x1a);
    let b = finished_pcb(&stats, 2);
    let row = stats.record_job(&a, 3);
    stats.record_job(&b, 1);

    assert_eq!(row.job_id, "1A");
    assert_eq!(row.cpu_id, 3);
    assert_eq!(row.io_operations, 1);
    assert!((a.ram_used() - 25.0).abs() < 1e-9);

    let csv = stats.to_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "JOB_ID,CPU_ID,Running,Waiting,Completion,IO Ops,Page Faults,RAM used %"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("1A,3,"));
    assert!(lines[1].ends_with(",1,0,25.00"));
    assert!(lines[2].starts_with("2,1,"));
}

/// Tests the JSON rendering.
#[test]
fn test_report_json() {
    let stats = Statistics::new(8);
    let pcb = finished_pcb(&stats, 7);
    stats.record_job(&pcb, 2);
    let value: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["job_id"], "7");
    assert_eq!(rows[0]["cpu_id"], 2);
    assert_eq!(rows[0]["io_operations"], 1);
}

/// Tests that each transition adds its interval to the right accumulator.
#[test]
fn test_state_change_accumulates_timing() {
    let stats = Statistics::new(8);
    let pid = ProcessId::new(3);
    let mut timing = ProcessTiming::default();
    let step = |timing: &mut ProcessTiming, old, new| {
        stats
            .process_state_change(pid, timing, Some(old), new)
            .unwrap()
    };

    step(&mut timing, ProcessState::Ready, ProcessState::Running);
    thread::sleep(Duration::from_millis(3));
    step(&mut timing, ProcessState::Running, ProcessState::Waiting);
    let first_burst = timing.running;
    assert!(first_burst >= Duration::from_millis(3));
    assert_eq!(timing.waiting, Duration::ZERO);

    thread::sleep(Duration::from_millis(3));
    step(&mut timing, ProcessState::Waiting, ProcessState::Ready);
    assert!(timing.waiting >= Duration::from_millis(3));

    step(&mut timing, ProcessState::Ready, ProcessState::Running);
    thread::sleep(Duration::from_millis(3));
    step(&mut timing, ProcessState::Running, ProcessState::Ended);
    assert!(timing.running >= first_burst + Duration::from_millis(3));
}
