//! Target-independent three-address IR. An instruction list is the whole
//! program representation: the source language has no branches, so order
//! is the only control flow.

use std::fmt;

pub mod builder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable<'code> {
    /// A source-level name.
    Named(&'code str),
    /// A compiler temporary; the number comes from a [`TempAllocator`]
    /// and is unique across the whole compilation.
    Temp(usize),
}

impl fmt::Display for Variable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Temp(n) => write!(f, "${}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'code> {
    Immediate(i32),
    Variable(Variable<'code>),
}

impl<'code> Value<'code> {
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate(_))
    }
    pub const fn as_variable(&self) -> Option<Variable<'code>> {
        match *self {
            Self::Variable(var) => Some(var),
            Self::Immediate(_) => None,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Immediate(n) => n.fmt(f),
            Self::Variable(var) => var.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
}

impl BinaryOp {
    /// Arithmetic meaning of the opcode, used when folding two
    /// immediates. Wrapping, like the target's register arithmetic.
    pub const fn apply(self, lhs: i32, rhs: i32) -> i32 {
        match self {
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            Self::Mul => lhs.wrapping_mul(rhs),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'code> {
    Binary {
        op: BinaryOp,
        result: Variable<'code>,
        lhs: Value<'code>,
        rhs: Value<'code>,
    },
    Mov {
        result: Variable<'code>,
        source: Value<'code>,
    },
    Ret {
        value: Value<'code>,
    },
}

impl<'code> Instruction<'code> {
    /// Values this instruction reads. The result slot is a write, not a
    /// read, and is deliberately not part of this: the register
    /// allocator's forward scan treats a variable that is only ever
    /// written later as reclaimable.
    pub fn operands(&self) -> impl Iterator<Item = Value<'code>> {
        let (a, b) = match *self {
            Self::Binary { lhs, rhs, .. } => (Some(lhs), Some(rhs)),
            Self::Mov { source, .. } => (Some(source), None),
            Self::Ret { value } => (Some(value), None),
        };
        a.into_iter().chain(b)
    }

    pub const fn result(&self) -> Option<Variable<'code>> {
        match *self {
            Self::Binary { result, .. } | Self::Mov { result, .. } => Some(result),
            Self::Ret { .. } => None,
        }
    }
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Binary {
                op,
                result,
                lhs,
                rhs,
            } => write!(f, "{} = {} {}, {}", result, op, lhs, rhs),
            Self::Mov { result, source } => write!(f, "{} = {}", result, source),
            Self::Ret { value } => write!(f, "ret {}", value),
        }
    }
}

/// Hands out globally unique temporaries. There is exactly one of these
/// per compilation; the IR builder creates it and the code generator
/// inherits it so simplification temporaries continue the same sequence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TempAllocator {
    next: usize,
}

impl TempAllocator {
    pub fn fresh<'code>(&mut self) -> Variable<'code> {
        let n = self.next;
        self.next += 1;
        Variable::Temp(n)
    }
}
