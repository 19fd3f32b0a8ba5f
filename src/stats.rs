//! Simulation statistics collection and reporting.
//!
//! Every PCB state change passes through [`Statistics::process_state_change`],
//! which rejects edges the lifecycle does not define and keeps the
//! running/waiting accumulators of the process. Retired jobs are summarized
//! as [`ReportRow`]s that can be rendered as CSV or JSON.

use crate::common::sync::lock;
use crate::common::SimError;
use crate::kernel::pcb::{CpuId, Pcb, ProcessId, ProcessState, ProcessTiming};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Per-job line of the final report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub job_id: String,
    pub cpu_id: CpuId,
    /// Seconds spent RUNNING.
    pub running: f64,
    /// Seconds spent WAITING.
    pub waiting: f64,
    /// Running plus waiting seconds.
    pub completion: f64,
    pub io_operations: u64,
    pub page_faults: u64,
    /// Share of RAM frames mapped by the job when it ended, in percent.
    pub ram_used: f64,
}

/// Simulation statistics shared by every worker.
///
/// Built once before scheduling starts and read after the run.
pub struct Statistics {
    start_time: Instant,
    frame_count: usize,
    pub instructions_executed: AtomicU64,
    pub dispatches: AtomicU64,
    pub page_faults: AtomicU64,
    pub io_faults: AtomicU64,
    rows: Mutex<Vec<ReportRow>>,
}

impl Statistics {
    /// Creates an empty recorder for a RAM of `frame_count` frames.
    pub fn new(frame_count: usize) -> Self {
        Self {
            start_time: Instant::now(),
            frame_count,
            instructions_executed: AtomicU64::new(0),
            dispatches: AtomicU64::new(0),
            page_faults: AtomicU64::new(0),
            io_faults: AtomicU64::new(0),
            rows: Mutex::new(Vec::new()),
        }
    }

    /// State-transition hook.
    ///
    /// # Arguments
    ///
    /// * `pid` - Process changing state
    /// * `timing` - Accumulators of that process
    /// * `old` - Previous state, `None` when the PCB is being created
    /// * `new` - Requested state
    ///
    /// # Returns
    ///
    /// `SimError::InvalidTransition` for any edge outside
    /// none→NEW→READY→RUNNING→{WAITING→READY, ENDED}.
    pub fn process_state_change(
        &self,
        pid: ProcessId,
        timing: &mut ProcessTiming,
        old: Option<ProcessState>,
        new: ProcessState,
    ) -> Result<(), SimError> {
        use ProcessState::*;
        match (old, new) {
            (None, New) | (Some(New), Ready) => {}
            (Some(Ready), Running) => {
                timing.start();
                self.dispatches.fetch_add(1, Ordering::Relaxed);
            }
            (Some(Running), Waiting) => {
                let lap = timing.lap();
                timing.running += lap;
            }
            (Some(Waiting), Ready) => {
                let lap = timing.lap();
                timing.waiting += lap;
                timing.stop();
            }
            (Some(Running), Ended) => {
                let lap = timing.lap();
                timing.running += lap;
                timing.stop();
            }
            (from, to) => return Err(SimError::InvalidTransition { pid, from, to }),
        }
        Ok(())
    }

    /// Percentage of RAM frames currently mapped by `pcb`.
    pub fn percent_ram_used(&self, pcb: &Pcb) -> f64 {
        if self.frame_count == 0 {
            return 0.0;
        }
        let mapped = pcb.page_table().mapped_count();
        mapped as f64 / self.frame_count as f64 * 100.0
    }

    /// Records the final report row of a finished job.
    pub fn record_job(&self, pcb: &Pcb, cpu_id: CpuId) -> ReportRow {
        let ram_used = self.percent_ram_used(pcb);
        pcb.set_ram_used(ram_used);
        let timing = pcb.timing();
        let row = ReportRow {
            job_id: pcb.id().to_string(),
            cpu_id,
            running: timing.running.as_secs_f64(),
            waiting: timing.waiting.as_secs_f64(),
            completion: timing.completion().as_secs_f64(),
            io_operations: pcb.io_operations(),
            page_faults: pcb.page_faults(),
            ram_used,
        };
        lock(&self.rows).push(row.clone());
        row
    }

    /// Report rows in retirement order.
    pub fn rows(&self) -> Vec<ReportRow> {
        lock(&self.rows).clone()
    }

    /// Renders the report as CSV with a header line.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "JOB_ID,CPU_ID,Running,Waiting,Completion,IO Ops,Page Faults,RAM used %\n",
        );
        for row in lock(&self.rows).iter() {
            let _ = writeln!(
                out,
                "{},{},{:.6},{:.6},{:.6},{},{},{:.2}",
                row.job_id,
                row.cpu_id,
                row.running,
                row.waiting,
                row.completion,
                row.io_operations,
                row.page_faults,
                row.ram_used
            );
        }
        out
    }

    /// Renders the report rows as a JSON array.
    pub fn to_json(&self) -> Result<String, SimError> {
        let rows = self.rows();
        serde_json::to_string_pretty(&rows).map_err(|e| SimError::Io(e.into()))
    }

    /// Prints a formatted summary of the run.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let rows = self.rows();
        let jobs = rows.len().max(1) as f64;
        let avg = |f: fn(&ReportRow) -> f64| rows.iter().map(f).sum::<f64>() / jobs;

        println!("\n==========================================================");
        println!("OS SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("jobs_completed           {}", rows.len());
        println!(
            "instructions             {}",
            self.instructions_executed.load(Ordering::Relaxed)
        );
        println!(
            "dispatches               {}",
            self.dispatches.load(Ordering::Relaxed)
        );
        println!(
            "faults.page              {}",
            self.page_faults.load(Ordering::Relaxed)
        );
        println!(
            "faults.io                {}",
            self.io_faults.load(Ordering::Relaxed)
        );
        println!("----------------------------------------------------------");
        println!("AVERAGES PER JOB");
        println!("  running                {:.6} s", avg(|r| r.running));
        println!("  waiting                {:.6} s", avg(|r| r.waiting));
        println!("  completion             {:.6} s", avg(|r| r.completion));
        println!("  ram_used               {:.2}%", avg(|r| r.ram_used));
        println!("----------------------------------------------------------");
        println!(
            "  {:<8} {:<6} {:>12} {:>12} {:>8} {:>8} {:>8}",
            "job", "cpu", "running", "waiting", "io_ops", "faults", "ram%"
        );
        for row in &rows {
            println!(
                "  {:<8} {:<6} {:>12.6} {:>12.6} {:>8} {:>8} {:>8.2}",
                row.job_id,
                row.cpu_id,
                row.running,
                row.waiting,
                row.io_operations,
                row.page_faults,
                row.ram_used
            );
        }
        println!("==========================================================");
    }
}
