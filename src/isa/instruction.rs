//! Instruction word decoding.
//!
//! Bit positions below are counted from the most significant bit of the
//! 32-bit word, matching how job files are written:
//!
//! | format | fields                                                          |
//! |--------|-----------------------------------------------------------------|
//! | 0      | reg1 `[8:12)`, reg2 `[12:16)`, dstreg `[16:20)`, address `[20:32)` |
//! | 1      | breg `[8:12)`, dstreg `[12:16)`, address `[16:32)`              |
//! | 2      | address `[8:32)`                                                |
//! | 3      | reg1 `[8:12)`, reg2 `[12:16)`, address `[16:32)`                |
//!
//! Bits `[0:2)` hold the format and `[2:8)` the opcode for every format.

use crate::common::{SimError, Word};
use crate::isa::opcodes::{ArithmeticOp, BranchOp, IoOp, JumpOp};
use std::fmt;

const FORMAT_SHIFT: u32 = 30;
const OPCODE_SHIFT: u32 = 24;
const OPCODE_MASK: u32 = 0x3f;
const FIELD_A_SHIFT: u32 = 20;
const FIELD_B_SHIFT: u32 = 16;
const FIELD_C_SHIFT: u32 = 12;
const REG_MASK: u32 = 0xf;
const ADDR12_MASK: u32 = 0xfff;
const ADDR16_MASK: u32 = 0xffff;
const ADDR24_MASK: u32 = 0xff_ffff;

/// Instruction format selected by the top two bits of the word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// Register arithmetic (format 0).
    #[default]
    Arithmetic = 0,
    /// Conditional branch and immediate (format 1).
    BranchImmediate = 1,
    /// Unconditional jump (format 2).
    Jump = 2,
    /// Input/output (format 3).
    Io = 3,
}

impl Format {
    /// Maps the two format bits to a format.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Format::Arithmetic),
            1 => Some(Format::BranchImmediate),
            2 => Some(Format::Jump),
            3 => Some(Format::Io),
            _ => None,
        }
    }

    /// Returns the two-bit encoding.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Arithmetic => "arithmetic",
            Format::BranchImmediate => "branch/immediate",
            Format::Jump => "jump",
            Format::Io => "I/O",
        };
        f.write_str(name)
    }
}

/// Decoded view of one instruction word.
///
/// Fields a format does not define are left at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Instruction {
    pub format: Format,
    pub opcode: u8,
    pub reg1: u8,
    pub reg2: u8,
    pub breg: u8,
    pub dstreg: u8,
    pub address: u32,
}

impl Instruction {
    /// Decodes a 32-bit word.
    ///
    /// # Arguments
    ///
    /// * `word` - The raw instruction word
    ///
    /// # Returns
    ///
    /// The decoded fields, or `SimError::UnknownFormat` when the format bits
    /// name no known format. The opcode is not validated here; the CPU looks
    /// it up in the table for the decoded format.
    pub fn decode(word: Word) -> Result<Self, SimError> {
        let raw = word.raw();
        let format_bits = (raw >> FORMAT_SHIFT) as u8;
        let format = Format::from_bits(format_bits).ok_or(SimError::UnknownFormat {
            word,
            format: format_bits,
        })?;
        let opcode = ((raw >> OPCODE_SHIFT) & OPCODE_MASK) as u8;
        let field_a = ((raw >> FIELD_A_SHIFT) & REG_MASK) as u8;
        let field_b = ((raw >> FIELD_B_SHIFT) & REG_MASK) as u8;

        let mut inst = Instruction {
            format,
            opcode,
            ..Default::default()
        };
        match format {
            Format::Arithmetic => {
                inst.reg1 = field_a;
                inst.reg2 = field_b;
                inst.dstreg = ((raw >> FIELD_C_SHIFT) & REG_MASK) as u8;
                inst.address = raw & ADDR12_MASK;
            }
            Format::BranchImmediate => {
                inst.breg = field_a;
                inst.dstreg = field_b;
                inst.address = raw & ADDR16_MASK;
            }
            Format::Jump => {
                inst.address = raw & ADDR24_MASK;
            }
            Format::Io => {
                inst.reg1 = field_a;
                inst.reg2 = field_b;
                inst.address = raw & ADDR16_MASK;
            }
        }
        Ok(inst)
    }

    /// Encodes the instruction back into a word.
    ///
    /// Fields wider than their slot are truncated to the slot width.
    pub fn encode(&self) -> Word {
        let reg = |r: u8| u32::from(r) & REG_MASK;
        let mut raw = (u32::from(self.format.bits()) << FORMAT_SHIFT)
            | ((u32::from(self.opcode) & OPCODE_MASK) << OPCODE_SHIFT);
        raw |= match self.format {
            Format::Arithmetic => {
                (reg(self.reg1) << FIELD_A_SHIFT)
                    | (reg(self.reg2) << FIELD_B_SHIFT)
                    | (reg(self.dstreg) << FIELD_C_SHIFT)
                    | (self.address & ADDR12_MASK)
            }
            Format::BranchImmediate => {
                (reg(self.breg) << FIELD_A_SHIFT)
                    | (reg(self.dstreg) << FIELD_B_SHIFT)
                    | (self.address & ADDR16_MASK)
            }
            Format::Jump => self.address & ADDR24_MASK,
            Format::Io => {
                (reg(self.reg1) << FIELD_A_SHIFT)
                    | (reg(self.reg2) << FIELD_B_SHIFT)
                    | (self.address & ADDR16_MASK)
            }
        };
        Word::new(raw)
    }

    /// Builds a format 0 instruction.
    pub fn arithmetic(op: ArithmeticOp, reg1: u8, reg2: u8, dstreg: u8) -> Self {
        Self {
            format: Format::Arithmetic,
            opcode: op.opcode(),
            reg1,
            reg2,
            dstreg,
            ..Default::default()
        }
    }

    /// Builds a format 1 instruction.
    pub fn branch(op: BranchOp, breg: u8, dstreg: u8, address: u32) -> Self {
        Self {
            format: Format::BranchImmediate,
            opcode: op.opcode(),
            breg,
            dstreg,
            address,
            ..Default::default()
        }
    }

    /// Builds a format 2 instruction.
    pub fn jump(op: JumpOp, address: u32) -> Self {
        Self {
            format: Format::Jump,
            opcode: op.opcode(),
            address,
            ..Default::default()
        }
    }

    /// Builds a format 3 instruction.
    pub fn io(op: IoOp, reg1: u8, reg2: u8, address: u32) -> Self {
        Self {
            format: Format::Io,
            opcode: op.opcode(),
            reg1,
            reg2,
            address,
            ..Default::default()
        }
    }

    /// Returns the mnemonic for the opcode, if the format's table has one.
    pub fn mnemonic(&self) -> Option<&'static str> {
        match self.format {
            Format::Arithmetic => ArithmeticOp::from_opcode(self.opcode).map(|op| op.mnemonic()),
            Format::BranchImmediate => BranchOp::from_opcode(self.opcode).map(|op| op.mnemonic()),
            Format::Jump => JumpOp::from_opcode(self.opcode).map(|op| op.mnemonic()),
            Format::Io => IoOp::from_opcode(self.opcode).map(|op| op.mnemonic()),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.mnemonic().unwrap_or("???");
        match self.format {
            Format::Arithmetic => write!(
                f,
                "{} r{}, r{}, r{}",
                name, self.reg1, self.reg2, self.dstreg
            ),
            Format::BranchImmediate => write!(
                f,
                "{} r{}, r{}, {:#x}",
                name, self.breg, self.dstreg, self.address
            ),
            Format::Jump => write!(f, "{} {:#x}", name, self.address),
            Format::Io => write!(
                f,
                "{} r{}, r{}, {:#x}",
                name, self.reg1, self.reg2, self.address
            ),
        }
    }
}
