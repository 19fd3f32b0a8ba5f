//! Simulator error type.
//!
//! All fallible operations in the crate return `SimError`. The variants are
//! grouped by `ErrorKind` so a caller can decide whether a failure aborts the
//! whole run (internal invariant violations, configuration problems) or only
//! concerns the job that raised it (decode and execution errors).

use crate::common::word::Word;
use crate::isa::instruction::Format;
use crate::kernel::pcb::{ProcessId, ProcessState};
use std::fmt;

/// Coarse classification of a `SimError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An instruction word has no matching format or opcode.
    Decode,
    /// A decoded instruction could not be carried out (bad register,
    /// division by zero, empty memory word, address out of range).
    Execution,
    /// A fault queue, cache or page table was asked for an entry it does
    /// not hold. Always an internal logic bug.
    QueueConsistency,
    /// A PCB was moved along an edge the lifecycle does not define.
    StateMachine,
    /// The configuration is unsupported.
    Configuration,
    /// A job file or job image could not be loaded.
    Load,
    /// Host I/O failed while reading input or writing output.
    Io,
}

/// Errors raised by the simulator core and its collaborators.
#[derive(Debug)]
pub enum SimError {
    /// The top two bits of a word name no known instruction format.
    UnknownFormat { word: Word, format: u8 },
    /// The opcode is not part of the table selected by the format.
    IllegalOpcode {
        word: Word,
        format: Format,
        opcode: u8,
    },
    /// A register field points outside the register file.
    InvalidRegister { index: usize, count: usize },
    /// Integer division with a zero divisor.
    DivideByZero,
    /// A register-computed memory address is negative.
    InvalidAddress(i64),
    /// A memory word was read before anything was written to it.
    UninitializedWord { page: usize, offset: usize },
    /// A page index lies outside the structure being addressed.
    PageOutOfRange {
        structure: &'static str,
        index: usize,
        len: usize,
    },
    /// A fault queue was drained or completed for a process it does not hold.
    QueueConsistency {
        queue: &'static str,
        pid: ProcessId,
        detail: &'static str,
    },
    /// The lifecycle does not define the requested transition.
    InvalidTransition {
        pid: ProcessId,
        from: Option<ProcessState>,
        to: ProcessState,
    },
    /// A retirement was requested for a process that is not admitted.
    UnknownProcess(ProcessId),
    /// The configuration names an unsupported option.
    Config(String),
    /// A hex token could not be parsed as a word.
    InvalidWord(String),
    /// A job file line could not be understood.
    Load { line: usize, reason: String },
    /// A job does not fit the configured limits.
    JobTooLarge { pid: ProcessId, words: usize, limit: usize },
    /// The disk has no free page left for the job being loaded.
    DiskFull { requested: usize, available: usize },
    /// More RAM frames are needed than RAM has.
    OutOfFrames { requested: usize, frames: usize },
    /// No frame is free and every live process waits on a page fault.
    FrameStarvation { pid: ProcessId, frames: usize },
    /// An error raised while a CPU was executing a process.
    Process {
        pid: ProcessId,
        pc: usize,
        source: Box<SimError>,
    },
    /// Host I/O error.
    Io(std::io::Error),
}

impl SimError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::UnknownFormat { .. } | SimError::IllegalOpcode { .. } => ErrorKind::Decode,
            SimError::InvalidRegister { .. }
            | SimError::DivideByZero
            | SimError::InvalidAddress(_)
            | SimError::UninitializedWord { .. } => ErrorKind::Execution,
            SimError::PageOutOfRange { .. }
            | SimError::QueueConsistency { .. }
            | SimError::UnknownProcess(_) => ErrorKind::QueueConsistency,
            SimError::InvalidTransition { .. } => ErrorKind::StateMachine,
            SimError::Config(_)
            | SimError::OutOfFrames { .. }
            | SimError::FrameStarvation { .. } => ErrorKind::Configuration,
            SimError::InvalidWord(_)
            | SimError::Load { .. }
            | SimError::JobTooLarge { .. }
            | SimError::DiskFull { .. } => ErrorKind::Load,
            SimError::Process { source, .. } => source.kind(),
            SimError::Io(_) => ErrorKind::Io,
        }
    }

    /// Attaches the running process and program counter to an error.
    ///
    /// Errors that already carry process context are returned unchanged.
    pub fn in_process(self, pid: ProcessId, pc: usize) -> SimError {
        match self {
            SimError::Process { .. } => self,
            other => SimError::Process {
                pid,
                pc,
                source: Box::new(other),
            },
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::UnknownFormat { word, format } => {
                write!(f, "cannot decode {}: unknown format {:#x}", word, format)
            }
            SimError::IllegalOpcode {
                word,
                format,
                opcode,
            } => write!(
                f,
                "cannot decode {}: opcode {:#x} is not a {} instruction",
                word, opcode, format
            ),
            SimError::InvalidRegister { index, count } => {
                write!(f, "register r{} outside register file of {}", index, count)
            }
            SimError::DivideByZero => write!(f, "division by zero"),
            SimError::InvalidAddress(value) => write!(f, "negative memory address {}", value),
            SimError::UninitializedWord { page, offset } => {
                write!(f, "read of empty word at page {} offset {}", page, offset)
            }
            SimError::PageOutOfRange {
                structure,
                index,
                len,
            } => write!(f, "{} index {} out of range (len {})", structure, index, len),
            SimError::QueueConsistency { queue, pid, detail } => {
                write!(f, "{} queue: process {}: {}", queue, pid, detail)
            }
            SimError::InvalidTransition { pid, from, to } => match from {
                Some(from) => write!(f, "process {}: unexpected state change {} -> {}", pid, from, to),
                None => write!(f, "process {}: unexpected initial state {}", pid, to),
            },
            SimError::UnknownProcess(pid) => write!(f, "process {} is not admitted", pid),
            SimError::Config(msg) => write!(f, "configuration error: {}", msg),
            SimError::InvalidWord(token) => write!(f, "invalid hex word '{}'", token),
            SimError::Load { line, reason } => write!(f, "line {}: {}", line, reason),
            SimError::JobTooLarge { pid, words, limit } => write!(
                f,
                "job {} has {} words, more than the supported {}",
                pid, words, limit
            ),
            SimError::DiskFull {
                requested,
                available,
            } => write!(
                f,
                "disk full: {} pages requested, {} available",
                requested, available
            ),
            SimError::OutOfFrames { requested, frames } => write!(
                f,
                "{} frames needed but RAM only has {}",
                requested, frames
            ),
            SimError::FrameStarvation { pid, frames } => write!(
                f,
                "process {} needs a frame but all {} are held by processes waiting on page faults",
                pid, frames
            ),
            SimError::Process { pid, pc, source } => {
                write!(f, "process {} at pc {}: {}", pid, pc, source)
            }
            SimError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Process { source, .. } => Some(source.as_ref()),
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}
