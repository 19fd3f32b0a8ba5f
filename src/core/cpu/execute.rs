//! Opcode tables of the four instruction formats.
//!
//! Every data access first asks the MMU for a fault check. A fault returns
//! [`Flow::Interrupted`] before any register or memory side effect, so the
//! instruction can be replayed from the top once the fault is serviced.

use super::{Cpu, Flow};
use crate::common::constants::WORD_BYTES;
use crate::common::{AccessType, LogicalAddress, SimError, Word};
use crate::core::arch::CpuState;
use crate::core::units::alu::{Alu, AluOp, BranchCondition};
use crate::isa::{ArithmeticOp, BranchOp, Instruction, IoOp, JumpOp};
use crate::kernel::pcb::{Pcb, ProcessState};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn illegal(word: Word, inst: &Instruction) -> SimError {
    SimError::IllegalOpcode {
        word,
        format: inst.format,
        opcode: inst.opcode,
    }
}

/// Converts a byte address held in a register into a word address.
fn register_address(value: i64) -> Result<usize, SimError> {
    usize::try_from(value.div_euclid(WORD_BYTES as i64))
        .map_err(|_| SimError::InvalidAddress(value))
}

fn field_address(address: u32) -> usize {
    address as usize / WORD_BYTES
}

impl Cpu {
    /// Runs the fault check for a data access.
    ///
    /// # Returns
    ///
    /// The translated address, or `None` if the access faulted.
    fn data_access(
        &self,
        pcb: &Arc<Pcb>,
        word_address: usize,
        access: AccessType,
    ) -> Result<Option<LogicalAddress>, SimError> {
        let addr = LogicalAddress::translate(word_address, self.mmu.page_size());
        match self.mmu.check_for_interrupt(addr, access, pcb)? {
            Some(_) => Ok(None),
            None => Ok(Some(addr)),
        }
    }

    /// Format 0: register-to-register arithmetic.
    pub(super) fn execute_arithmetic(
        &self,
        state: &mut CpuState,
        inst: &Instruction,
        word: Word,
    ) -> Result<Flow, SimError> {
        let op = ArithmeticOp::from_opcode(inst.opcode).ok_or_else(|| illegal(word, inst))?;
        let s1 = state.regs.read(inst.reg1.into())?;
        let s2 = state.regs.read(inst.reg2.into())?;
        let dst = inst.dstreg.into();

        let alu_op = match op {
            ArithmeticOp::Mov => {
                state.regs.write(inst.reg1.into(), s2)?;
                return Ok(Flow::Continue);
            }
            ArithmeticOp::Add => AluOp::Add,
            ArithmeticOp::Sub => AluOp::Sub,
            ArithmeticOp::Mul => AluOp::Mul,
            ArithmeticOp::Div => AluOp::Div,
            ArithmeticOp::And => AluOp::And,
            ArithmeticOp::Or => AluOp::Or,
            ArithmeticOp::Slt => AluOp::Slt,
        };
        state.regs.write(dst, Alu::execute(alu_op, s1, s2)?)?;
        Ok(Flow::Continue)
    }

    /// Format 1: memory transfer, immediates and conditional branches.
    pub(super) fn execute_branch(
        &self,
        pcb: &Arc<Pcb>,
        state: &mut CpuState,
        inst: &Instruction,
        word: Word,
    ) -> Result<Flow, SimError> {
        let op = BranchOp::from_opcode(inst.opcode).ok_or_else(|| illegal(word, inst))?;
        let breg = inst.breg.into();
        let dreg = inst.dstreg.into();
        let immediate = i64::from(inst.address);

        let condition = match op {
            BranchOp::St => {
                let target = register_address(state.regs.read(dreg)?)?;
                let Some(addr) = self.data_access(pcb, target, AccessType::Write)? else {
                    return Ok(Flow::Interrupted);
                };
                let value = Word::from_register(state.regs.read(breg)?);
                self.mmu.write_cache(addr, value, pcb)?;
                return Ok(Flow::Continue);
            }
            BranchOp::Lw => {
                // The loaded word has no destination in this ISA; only the
                // access itself is performed.
                let target = register_address(state.regs.read(breg)?)?;
                let Some(addr) = self.data_access(pcb, target, AccessType::Read)? else {
                    return Ok(Flow::Interrupted);
                };
                self.mmu.read_cache(addr, pcb)?;
                return Ok(Flow::Continue);
            }
            BranchOp::Movi | BranchOp::Ldi => {
                state.regs.write(dreg, immediate)?;
                return Ok(Flow::Continue);
            }
            BranchOp::Addi | BranchOp::Muli | BranchOp::Divi => {
                let alu_op = match op {
                    BranchOp::Addi => AluOp::Add,
                    BranchOp::Muli => AluOp::Mul,
                    _ => AluOp::Div,
                };
                let value = Alu::execute(alu_op, state.regs.read(dreg)?, immediate)?;
                state.regs.write(dreg, value)?;
                return Ok(Flow::Continue);
            }
            BranchOp::Slti => {
                let value = Alu::execute(AluOp::Slt, state.regs.read(breg)?, immediate)?;
                state.regs.write(dreg, value)?;
                return Ok(Flow::Continue);
            }
            BranchOp::Beq => BranchCondition::Equal,
            BranchOp::Bne => BranchCondition::NotEqual,
            BranchOp::Bez => BranchCondition::Zero,
            BranchOp::Bnz => BranchCondition::NotZero,
            BranchOp::Bgz => BranchCondition::Positive,
            BranchOp::Blz => BranchCondition::Negative,
        };

        let b = state.regs.read(breg)?;
        let d = state.regs.read(dreg)?;
        if Alu::branch_taken(condition, b, d) {
            state.pc = field_address(inst.address);
        }
        Ok(Flow::Continue)
    }

    /// Format 2: halt and unconditional jump.
    pub(super) fn execute_jump(
        &self,
        pcb: &Arc<Pcb>,
        state: &mut CpuState,
        inst: &Instruction,
        word: Word,
    ) -> Result<Flow, SimError> {
        match JumpOp::from_opcode(inst.opcode).ok_or_else(|| illegal(word, inst))? {
            JumpOp::Hlt => {
                self.jobs_completed.fetch_add(1, Ordering::Relaxed);
                self.mmu.write_to_ram(pcb)?;
                pcb.set_state(ProcessState::Ended, &self.stats)?;
                log::debug!("cpu {}: process {} halted", self.id, pcb.id());
                if log::log_enabled!(log::Level::Trace) {
                    for line in state.regs.dump() {
                        log::trace!("  {}", line);
                    }
                }
                Ok(Flow::Halted)
            }
            JumpOp::Jmp => {
                state.pc = inst.address as usize;
                Ok(Flow::Continue)
            }
        }
    }

    /// Format 3: input and output buffer transfers.
    pub(super) fn execute_io(
        &self,
        pcb: &Arc<Pcb>,
        state: &mut CpuState,
        inst: &Instruction,
        word: Word,
    ) -> Result<Flow, SimError> {
        let op = IoOp::from_opcode(inst.opcode).ok_or_else(|| illegal(word, inst))?;
        let r1 = inst.reg1.into();
        let r2 = inst.reg2.into();

        match op {
            IoOp::Rd => {
                let target = if inst.address == 0 {
                    register_address(state.regs.read(r2)?)?
                } else {
                    field_address(inst.address)
                };
                let Some(addr) = self.data_access(pcb, target, AccessType::Read)? else {
                    return Ok(Flow::Interrupted);
                };
                let value = self.mmu.read_cache(addr, pcb)?;
                state.regs.write(r1, value.to_register())?;
            }
            IoOp::Wr => {
                let target = if inst.reg1 == inst.reg2 {
                    field_address(inst.address)
                } else {
                    register_address(state.regs.read(r2)?)?
                };
                let Some(addr) = self.data_access(pcb, target, AccessType::Write)? else {
                    return Ok(Flow::Interrupted);
                };
                let value = Word::from_register(state.regs.read(r1)?);
                self.mmu.write_cache(addr, value, pcb)?;
            }
        }
        Ok(Flow::Continue)
    }
}
