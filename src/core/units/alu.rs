//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the integer ALU used by the CPU execution engine.
//! It handles arithmetic, bitwise logic and comparisons on register values,
//! and evaluates the six branch conditions of the conditional-branch format.

use crate::common::SimError;

/// ALU operation selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Wrapping multiplication.
    Mul,
    /// Floor division (rounds toward negative infinity).
    Div,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Signed set-less-than, producing 1 or 0.
    Slt,
}

/// Branch condition evaluated by the ALU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchCondition {
    /// B-register equals D-register.
    Equal,
    /// B-register differs from D-register.
    NotEqual,
    /// B-register is zero.
    Zero,
    /// B-register is non-zero.
    NotZero,
    /// B-register is strictly positive.
    Positive,
    /// B-register is strictly negative.
    Negative,
}

/// Arithmetic Logic Unit for integer operations.
///
/// Stateless; every operation is a pure function of its operands.
pub struct Alu;

impl Alu {
    /// Executes an integer ALU operation.
    ///
    /// # Arguments
    ///
    /// * `op` - The ALU operation to perform
    /// * `a` - First operand
    /// * `b` - Second operand
    ///
    /// # Returns
    ///
    /// The result, or `SimError::DivideByZero` for a division by zero.
    pub fn execute(op: AluOp, a: i64, b: i64) -> Result<i64, SimError> {
        let value = match op {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Mul => a.wrapping_mul(b),
            AluOp::Div => Self::floor_div(a, b)?,
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Slt => (a < b) as i64,
        };
        Ok(value)
    }

    /// Floor division: the quotient is rounded toward negative infinity.
    pub fn floor_div(a: i64, b: i64) -> Result<i64, SimError> {
        if b == 0 {
            return Err(SimError::DivideByZero);
        }
        let q = a.wrapping_div(b);
        let r = a.wrapping_rem(b);
        if r != 0 && ((r < 0) != (b < 0)) {
            Ok(q - 1)
        } else {
            Ok(q)
        }
    }

    /// Evaluates a branch condition.
    ///
    /// # Arguments
    ///
    /// * `cond` - The condition to test
    /// * `breg` - Value of the B-register
    /// * `dreg` - Value of the D-register (only used by the equality tests)
    pub fn branch_taken(cond: BranchCondition, breg: i64, dreg: i64) -> bool {
        match cond {
            BranchCondition::Equal => breg == dreg,
            BranchCondition::NotEqual => breg != dreg,
            BranchCondition::Zero => breg == 0,
            BranchCondition::NotZero => breg != 0,
            BranchCondition::Positive => breg > 0,
            BranchCondition::Negative => breg < 0,
        }
    }
}
