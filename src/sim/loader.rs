//! Program file loader.
//!
//! Parses the textual job format into [`JobImage`]s:
//!
//! ```text
//! // JOB 1 17 2
//! 0xC050005C
//! ...
//! // Data 14 C C
//! 0x0000000A
//! ...
//! // END
//! ```
//!
//! Header fields are hex. The `JOB` line gives the id, the instruction count
//! and the priority; the `Data` line gives the input, output and temp buffer
//! sizes in words. A job whose word counts disagree with its headers is
//! rejected at its `END` line.

use crate::common::{SimError, Word};
use crate::isa::Instruction;
use crate::kernel::pcb::{parse_hex_token, BufferSizes, ProcessId};
use std::fs;
use std::path::Path;

/// One job as read from a program file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobImage {
    pub id: ProcessId,
    /// Number of instruction words at the start of `words`.
    pub instruction_count: usize,
    pub priority: u32,
    pub buffers: BufferSizes,
    /// Instruction words followed by the data section.
    pub words: Vec<Word>,
}

impl JobImage {
    /// Builds a job from encoded instructions, appending a zeroed data
    /// section sized from `buffers`.
    pub fn from_instructions(
        id: ProcessId,
        priority: u32,
        program: &[Instruction],
        buffers: BufferSizes,
    ) -> Self {
        let data_words = buffers.input_words + buffers.output_words + buffers.temp_words;
        let words = program
            .iter()
            .map(Instruction::encode)
            .chain(std::iter::repeat(Word::ZERO).take(data_words))
            .collect();
        Self {
            id,
            instruction_count: program.len(),
            priority,
            buffers,
            words,
        }
    }
}

fn header_fields<'a>(
    line: &'a str,
    line_no: usize,
    tag: &str,
) -> Result<[&'a str; 3], SimError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [.., a, b, c] if fields.len() >= 5 => Ok([*a, *b, *c]),
        _ => Err(SimError::Load {
            line: line_no,
            reason: format!("{} header needs three hex fields", tag),
        }),
    }
}

fn hex_field(token: &str, line_no: usize) -> Result<u32, SimError> {
    parse_hex_token(token).map_err(|_| SimError::Load {
        line: line_no,
        reason: format!("'{}' is not a hex number", token),
    })
}

#[derive(Default)]
struct Pending {
    header: Option<(ProcessId, usize, u32)>,
    buffers: BufferSizes,
    words: Vec<Word>,
    /// Words read before the `Data` line, once it has been seen.
    data_start: Option<usize>,
}

impl Pending {
    /// Checks the word counts against the `JOB` and `Data` headers.
    fn check_sizes(&self, instruction_count: usize, line_no: usize) -> Result<(), SimError> {
        let instructions = self.data_start.unwrap_or(self.words.len());
        if instructions != instruction_count {
            return Err(SimError::Load {
                line: line_no,
                reason: format!(
                    "JOB header declares {} instructions, found {}",
                    instruction_count, instructions
                ),
            });
        }
        let data = self.words.len() - instructions;
        let declared =
            self.buffers.input_words + self.buffers.output_words + self.buffers.temp_words;
        if data != declared {
            return Err(SimError::Load {
                line: line_no,
                reason: format!("Data header declares {} words, found {}", declared, data),
            });
        }
        Ok(())
    }
}

/// Parses a whole program file.
///
/// # Returns
///
/// The jobs in file order, or `SimError::Load` naming the first bad line.
pub fn parse_program(text: &str) -> Result<Vec<JobImage>, SimError> {
    let mut jobs = Vec::new();
    let mut pending = Pending::default();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("// JOB") {
            let [id, count, priority] = header_fields(line, line_no, "JOB")?;
            pending = Pending {
                header: Some((
                    ProcessId::new(hex_field(id, line_no)?),
                    hex_field(count, line_no)? as usize,
                    hex_field(priority, line_no)?,
                )),
                ..Pending::default()
            };
        } else if line.starts_with("// Data") {
            let [input, output, temp] = header_fields(line, line_no, "Data")?;
            pending.buffers = BufferSizes {
                input_words: hex_field(input, line_no)? as usize,
                output_words: hex_field(output, line_no)? as usize,
                temp_words: hex_field(temp, line_no)? as usize,
            };
            pending.data_start = Some(pending.words.len());
        } else if line.contains("END") {
            let (id, instruction_count, priority) =
                pending.header.take().ok_or_else(|| SimError::Load {
                    line: line_no,
                    reason: "END without a JOB header".into(),
                })?;
            pending.check_sizes(instruction_count, line_no)?;
            jobs.push(JobImage {
                id,
                instruction_count,
                priority,
                buffers: pending.buffers,
                words: std::mem::take(&mut pending.words),
            });
            pending = Pending::default();
        } else if line.starts_with("0x") || line.starts_with("0X") {
            let word = line.parse::<Word>().map_err(|_| SimError::Load {
                line: line_no,
                reason: format!("'{}' is not a 32-bit word", line),
            })?;
            if pending.header.is_none() {
                return Err(SimError::Load {
                    line: line_no,
                    reason: "word outside of a job".into(),
                });
            }
            pending.words.push(word);
        } else if !line.starts_with("//") {
            return Err(SimError::Load {
                line: line_no,
                reason: format!("unrecognized line '{}'", line),
            });
        }
    }

    if pending.header.is_some() {
        return Err(SimError::Load {
            line: text.lines().count(),
            reason: "last job is missing its END line".into(),
        });
    }
    Ok(jobs)
}

/// Reads and parses a program file.
pub fn load_program(path: &Path) -> Result<Vec<JobImage>, SimError> {
    let text = fs::read_to_string(path)?;
    parse_program(&text)
}
