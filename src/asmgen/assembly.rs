use crate::write_instruction;
use std::fmt;

/// The target's registers, as far as this backend cares: the seven
/// caller-saved temporaries the allocator hands out, plus the return
/// value register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    A0,
}

impl Register {
    /// Allocation pool, in the order the allocator scans it. `a0` is
    /// reserved for the return value and never allocated.
    pub const POOL: [Register; 7] = [
        Register::T0,
        Register::T1,
        Register::T2,
        Register::T3,
        Register::T4,
        Register::T5,
        Register::T6,
    ];
    pub const RETURN: Register = Register::A0;
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::T0 => "t0",
            Self::T1 => "t1",
            Self::T2 => "t2",
            Self::T3 => "t3",
            Self::T4 => "t4",
            Self::T5 => "t5",
            Self::T6 => "t6",
            Self::A0 => "a0",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    Directive(Directive),
    /// An instruction plus the rendering of the IR instruction it lowers,
    /// echoed as a trailing comment for traceability.
    Instruction(Instruction, String),
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Directive(directive) => directive.fmt(f),
            Self::Instruction(instruction, origin) => {
                write!(f, "\t{}\t\t# {}", instruction, origin)
            }
        }
    }
}

impl From<Directive> for Assembly {
    fn from(d: Directive) -> Self {
        Self::Directive(d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Text,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Text => f.write_str(".text"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Register-register add
    Add {
        dst: Register,
        lhs: Register,
        rhs: Register,
    },
    /// Add with the immediate as the second operand; the only immediate
    /// form the simplification pass lets through
    Addi {
        dst: Register,
        lhs: Register,
        imm: i32,
    },
    Sub {
        dst: Register,
        lhs: Register,
        rhs: Register,
    },
    Mul {
        dst: Register,
        lhs: Register,
        rhs: Register,
    },
    /// Load immediate
    Li { dst: Register, imm: i32 },
    /// Register move
    Mv { dst: Register, src: Register },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add { dst, lhs, rhs } => write_instruction!(f, "add", dst, lhs, rhs),
            Self::Addi { dst, lhs, imm } => write_instruction!(f, "addi", dst, lhs, imm),
            Self::Sub { dst, lhs, rhs } => write_instruction!(f, "sub", dst, lhs, rhs),
            Self::Mul { dst, lhs, rhs } => write_instruction!(f, "mul", dst, lhs, rhs),
            Self::Li { dst, imm } => write_instruction!(f, "li", dst, imm),
            Self::Mv { dst, src } => write_instruction!(f, "mv", dst, src),
        }
    }
}

#[macro_export]
macro_rules! format_instr_args {
    () => { "" };
    ($arg:expr) => { "{}" };
    ($first:expr, $($rest:expr),+) => {
        concat!("{}, ", $crate::format_instr_args!($($rest),+))
    }
}

#[macro_export]
macro_rules! format_instr {
    ($name:expr) => { format_args!("{}", $name) };
    ($name:expr, $($args:expr),+) => {
        format_args!(concat!("{} ", $crate::format_instr_args!($($args),+)), $name, $($args),+)
    };
}

#[macro_export]
macro_rules! write_instruction {
    ($formatter:expr, $name:expr) => {
        $formatter.write_fmt($crate::format_instr!($name))
    };
    ($formatter:expr, $name:expr, $($args:expr),+) => { $formatter.write_fmt($crate::format_instr!($name, $($args),+)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_rendering() {
        let add = Instruction::Add {
            dst: Register::T2,
            lhs: Register::T0,
            rhs: Register::T1,
        };
        assert_eq!(add.to_string(), "add t2, t0, t1");
        let li = Instruction::Li {
            dst: Register::T0,
            imm: -7,
        };
        assert_eq!(li.to_string(), "li t0, -7");
    }

    #[test]
    fn line_rendering_echoes_the_origin() {
        let line = Assembly::Instruction(
            Instruction::Mv {
                dst: Register::A0,
                src: Register::T3,
            },
            "ret $2".to_string(),
        );
        assert_eq!(line.to_string(), "\tmv a0, t3\t\t# ret $2");
        assert_eq!(Assembly::from(Directive::Text).to_string(), ".text");
    }
}
