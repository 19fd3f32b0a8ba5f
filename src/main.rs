//! OS Simulator CLI.
//!
//! Loads a TOML configuration and a program file, runs every job through the
//! simulated schedulers and writes the core dumps and the statistics report.

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};
use std::path::{Path, PathBuf};
use std::{fs, process};

use os_simulator::common::SimError;
use os_simulator::config::Config;
use os_simulator::sim::loader;
use os_simulator::sim::Simulator;

/// Command-line arguments for the OS simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-CPU Operating System Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: PathBuf,

    /// Program file with the jobs to run.
    #[arg(short, long)]
    program: PathBuf,

    /// Overrides `general.output_dir`.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Overrides `general.log_level`.
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// Also write the report as JSON.
    #[arg(long)]
    report_json: bool,
}

/// Minimal logger writing `[LEVEL target] message` lines to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn print_banner(config: &Config) {
    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!(
        "  Trace Instructions: {}",
        config.general.trace_instructions
    );
    println!("  Output Dir:         {}", config.general.output_dir);
    println!("CPU:");
    println!("  Count:              {}", config.cpu.count);
    println!("  Registers:          {}", config.cpu.register_count);
    println!("Scheduling:");
    println!("  Policy:             {}", config.scheduling.policy);
    println!("Memory:");
    println!("  Page Size:          {} words", config.memory.page_size);
    println!(
        "  RAM:                {} words ({} frames)",
        config.memory.ram_words,
        config.memory.frame_count()
    );
    println!(
        "  Disk:               {} words ({} pages)",
        config.memory.disk_words,
        config.memory.disk_pages()
    );
    println!(
        "  Cache:              {} slots per process",
        config.memory.cache_slots()
    );
    println!(
        "  Initial Load:       {} pages per job",
        config.memory.initial_load_pages
    );
    println!("--------------------");
}

fn write_outputs(sim: &Simulator, dir: &Path, json: bool) -> Result<(), SimError> {
    sim.dump().save(dir)?;
    fs::write(dir.join("report.csv"), sim.stats().to_csv())?;
    if json {
        fs::write(dir.join("report.json"), sim.stats().to_json()?)?;
    }
    Ok(())
}

fn run(args: Args) -> Result<(), SimError> {
    let config = Config::load(&args.config)?;
    let level = args
        .log_level
        .unwrap_or_else(|| config.general.log_level_val());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    print_banner(&config);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.general.output_dir));

    let sim = Simulator::new(config)?;
    let jobs = loader::load_program(&args.program)?;
    println!(
        "[Loader] {} jobs from {}",
        jobs.len(),
        args.program.display()
    );
    sim.load_program(&jobs)?;

    let summary = sim.run()?;
    for (cpu, count) in &summary.jobs_completed {
        println!("[*] CPU {} completed {} jobs", cpu, count);
    }
    write_outputs(&sim, &output_dir, args.report_json)?;
    println!("[*] Dumps and report written to {}", output_dir.display());
    sim.stats().print();
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    }
}
