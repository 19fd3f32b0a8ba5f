//! Memory Word.
//!
//! Every storage tier (disk, RAM, cache) holds 32-bit words. Job files write
//! them as `0x` followed by eight hex digits, and dumps print them the same
//! way.

use crate::common::error::SimError;
use std::fmt;
use std::str::FromStr;

/// A single 32-bit memory word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word(u32);

impl Word {
    /// The all-zero word.
    pub const ZERO: Word = Word(0);

    /// Wraps a raw 32-bit value.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw 32-bit value.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Converts a register value into a word, keeping the low 32 bits.
    pub fn from_register(value: i64) -> Self {
        Self(value as u32)
    }

    /// Returns the unsigned value of the word as a register operand.
    pub fn to_register(self) -> i64 {
        i64::from(self.0)
    }
}

impl From<u32> for Word {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Word {
    /// Formats as `0x` plus eight zero-padded lowercase hex digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl FromStr for Word {
    type Err = SimError;

    /// Parses a hex token with or without the `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u32::from_str_radix(digits, 16)
            .map(Word)
            .map_err(|_| SimError::InvalidWord(trimmed.to_string()))
    }
}
