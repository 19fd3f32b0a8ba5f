//! Core dump collaborator.
//!
//! The short scheduler reports every finished process to a [`DumpSink`]
//! before its frames are released, and hands over the disk once the run is
//! over. [`CoreDump`] renders both as annotated text.

use crate::common::sync::lock;
use crate::common::SimError;
use crate::kernel::pcb::{CpuId, Pcb};
use crate::soc::{Disk, PageStore, Ram};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const RAM_DUMP_FILE: &str = "ram_dump.txt";
const DISK_DUMP_FILE: &str = "disk_dump.txt";

const RAM_DUMP_HEADER: &str = "\
// Frame based core dump of RAM.
// Pages are loaded into RAM on demand by page faults. A page that was
// never requested shows \"Instruction Not LOADED in RAM\".
// Instruction and buffer boundaries are annotated.
";

const DISK_DUMP_HEADER: &str = "\
// Dump of the disk. None marks a word slot left unused because every
// page belongs to exactly one job.
";

/// Receiver of memory state at process end and at the end of the run.
pub trait DumpSink: Send + Sync {
    /// Called for every ENDED process before its frames are freed.
    fn process_ended(&self, pcb: &Pcb, cpu: CpuId, ram: &Ram) -> Result<(), SimError>;

    /// Called once after the last process has been retired.
    fn finish(&self, disk: &Disk) -> Result<(), SimError>;
}

/// Text RAM and disk dumps.
#[derive(Debug, Default)]
pub struct CoreDump {
    ram: Mutex<String>,
    disk: Mutex<String>,
}

impl CoreDump {
    pub fn new() -> Self {
        Self::default()
    }

    /// RAM dump accumulated so far.
    pub fn ram_dump(&self) -> String {
        lock(&self.ram).clone()
    }

    /// Disk dump, empty until [`DumpSink::finish`] ran.
    pub fn disk_dump(&self) -> String {
        lock(&self.disk).clone()
    }

    /// Writes `ram_dump.txt` and `disk_dump.txt` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), SimError> {
        fs::create_dir_all(dir)?;
        fs::write(
            dir.join(RAM_DUMP_FILE),
            format!("{}\n{}", RAM_DUMP_HEADER, self.ram_dump()),
        )?;
        fs::write(
            dir.join(DISK_DUMP_FILE),
            format!("{}{}", DISK_DUMP_HEADER, self.disk_dump()),
        )?;
        Ok(())
    }
}

fn boundary(pcb: &Pcb, address: usize) -> Option<&'static str> {
    let layout = pcb.layout();
    let marks = [
        (layout.instructions, "INSTRUCTION START", "INSTRUCTION END"),
        (layout.input, "INPUT BUFFER START", "INPUT BUFFER END"),
        (layout.output, "OUTPUT BUFFER START", "OUTPUT BUFFER END"),
        (layout.temp, "TEMP BUFFER START", "TEMP BUFFER END"),
    ];
    marks
        .into_iter()
        .filter(|(range, _, _)| !range.is_empty())
        .find_map(|(range, start, end)| {
            if address == range.start {
                Some(start)
            } else if address + 1 == range.end {
                Some(end)
            } else {
                None
            }
        })
}

impl DumpSink for CoreDump {
    fn process_ended(&self, pcb: &Pcb, cpu: CpuId, ram: &Ram) -> Result<(), SimError> {
        let page_size = pcb.page_size();
        let frames: Vec<Option<usize>> = {
            let table = pcb.page_table();
            (0..table.len())
                .map(|page| table.frame(page))
                .collect::<Result<_, _>>()?
        };

        let mut out = String::new();
        let _ = writeln!(out, "// JOB {} [processed by cpu_{}]", pcb.id(), cpu);
        for (page, frame) in frames.iter().enumerate() {
            let _ = writeln!(out, "PAGE - {}", page);
            for offset in 0..page_size {
                let text = match frame {
                    Some(frame) => match ram.read_word(*frame, offset)? {
                        Some(word) => word.to_string(),
                        None => "None".to_string(),
                    },
                    None => "Instruction Not LOADED in RAM".to_string(),
                };
                match boundary(pcb, page * page_size + offset) {
                    Some(mark) => {
                        let _ = writeln!(out, " {} ({})", text, mark);
                    }
                    None => {
                        let _ = writeln!(out, " {}", text);
                    }
                }
            }
        }
        out.push('\n');
        lock(&self.ram).push_str(&out);
        Ok(())
    }

    fn finish(&self, disk: &Disk) -> Result<(), SimError> {
        let pages = disk.snapshot()?;
        let mut out = String::new();
        for page in &pages {
            for slot in page.slots() {
                let _ = match slot {
                    Some(word) => writeln!(out, "{}", word),
                    None => writeln!(out, "None"),
                };
            }
        }
        *lock(&self.disk) = out;
        log::debug!("dumped {} pages of {}", pages.len(), disk.name());
        Ok(())
    }
}
