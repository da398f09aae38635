//! On-the-fly register allocation over the simplified instruction list.
//!
//! "Liveness" here is a forward scan of the remaining instructions, which
//! is only sound because the IR has no branches; with control flow this
//! would have to become a proper backward dataflow analysis.

use super::assembly::Register;
use crate::ir::{Instruction, Value, Variable};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("register pool exhausted while lowering `{0}`")]
    OutOfRegisters(String),
}

/// Variable-to-register assignment with both lookup directions kept
/// consistent: a variable holds at most one register and a register at
/// most one variable, under every mutation.
#[derive(Debug, Default)]
pub struct RegisterMap<'code> {
    by_variable: HashMap<Variable<'code>, Register>,
    by_register: HashMap<Register, Variable<'code>>,
}

impl<'code> RegisterMap<'code> {
    pub fn get(&self, var: Variable<'code>) -> Option<Register> {
        self.by_variable.get(&var).copied()
    }

    pub fn occupant(&self, reg: Register) -> Option<Variable<'code>> {
        self.by_register.get(&reg).copied()
    }

    pub fn is_free(&self, reg: Register) -> bool {
        !self.by_register.contains_key(&reg)
    }

    /// Bind `var` to `reg`, unbinding whatever either side was paired
    /// with before.
    pub fn bind(&mut self, var: Variable<'code>, reg: Register) {
        if let Some(previous) = self.by_variable.remove(&var) {
            self.by_register.remove(&previous);
        }
        if let Some(previous) = self.by_register.remove(&reg) {
            self.by_variable.remove(&previous);
        }
        self.by_variable.insert(var, reg);
        self.by_register.insert(reg, var);
    }
}

#[derive(Debug, Default)]
pub struct RegisterAllocator<'code> {
    map: RegisterMap<'code>,
}

impl<'code> RegisterAllocator<'code> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> &RegisterMap<'code> {
        &self.map
    }

    /// Register holding `value` at instruction `index`, allocating one if
    /// needed. Immediates never get a register.
    pub fn ensure_register(
        &mut self,
        value: Value<'code>,
        index: usize,
        code: &[Instruction<'code>],
    ) -> Result<Option<Register>, CodegenError> {
        match value.as_variable() {
            None => Ok(None),
            Some(var) => self.variable_register(var, index, code).map(Some),
        }
    }

    pub fn variable_register(
        &mut self,
        var: Variable<'code>,
        index: usize,
        code: &[Instruction<'code>],
    ) -> Result<Register, CodegenError> {
        if let Some(reg) = self.map.get(var) {
            return Ok(reg);
        }
        if let Some(reg) = Register::POOL.iter().copied().find(|&r| self.map.is_free(r)) {
            self.map.bind(var, reg);
            return Ok(reg);
        }
        // no free register: take one whose occupant is never read again.
        // Registers referenced by any operand from here to the end are
        // off-limits; the first pool register outside that set wins.
        let referenced: HashSet<Register> = code[index..]
            .iter()
            .flat_map(Instruction::operands)
            .filter_map(|operand| operand.as_variable())
            .filter_map(|read| self.map.get(read))
            .collect();
        if let Some(reg) = Register::POOL
            .iter()
            .copied()
            .find(|r| !referenced.contains(r))
        {
            tracing::trace!(
                target: "regalloc",
                "evicting {} from {} for {}",
                self.map.occupant(reg).map(|v| v.to_string()).unwrap_or_default(),
                reg,
                var,
            );
            self.map.bind(var, reg);
            return Ok(reg);
        }
        Err(CodegenError::OutOfRegisters(code[index].to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BinaryOp;

    fn var(name: &str) -> Variable {
        Variable::Named(name)
    }

    fn mov<'code>(result: Variable<'code>, imm: i32) -> Instruction<'code> {
        Instruction::Mov {
            result,
            source: Value::Immediate(imm),
        }
    }

    #[test]
    fn bind_keeps_both_directions_consistent() {
        let mut map = RegisterMap::default();
        map.bind(var("a"), Register::T0);
        map.bind(var("b"), Register::T0);
        assert_eq!(map.get(var("a")), None);
        assert_eq!(map.occupant(Register::T0), Some(var("b")));
        map.bind(var("b"), Register::T1);
        assert!(map.is_free(Register::T0));
        assert_eq!(map.get(var("b")), Some(Register::T1));
    }

    #[test]
    fn allocation_scans_the_pool_in_order() {
        let code = [mov(var("a"), 1), mov(var("b"), 2)];
        let mut allocator = RegisterAllocator::new();
        assert_eq!(
            allocator.variable_register(var("a"), 0, &code).unwrap(),
            Register::T0
        );
        assert_eq!(
            allocator.variable_register(var("b"), 1, &code).unwrap(),
            Register::T1
        );
        // reuse, not reallocation
        assert_eq!(
            allocator.variable_register(var("a"), 1, &code).unwrap(),
            Register::T0
        );
    }

    #[test]
    fn no_two_live_variables_share_a_register() {
        let names = ["a", "b", "c", "d", "e", "f", "g"];
        let code: Vec<Instruction> = names
            .iter()
            .enumerate()
            .map(|(i, name)| mov(var(name), i as i32))
            .collect();
        let mut allocator = RegisterAllocator::new();
        let mut seen = HashSet::new();
        for (index, name) in names.iter().enumerate() {
            let reg = allocator.variable_register(var(name), index, &code).unwrap();
            assert!(seen.insert(reg), "register {} handed out twice", reg);
        }
    }

    #[test]
    fn evicts_a_register_nobody_reads_again() {
        // a..g fill the pool; only b is read later, so allocating h must
        // displace a (first pool register not referenced ahead)
        let code = vec![
            mov(var("h"), 0),
            Instruction::Binary {
                op: BinaryOp::Add,
                result: var("x"),
                lhs: Value::Variable(var("b")),
                rhs: Value::Variable(var("h")),
            },
        ];
        let mut allocator = RegisterAllocator::new();
        for (i, name) in ["a", "b", "c", "d", "e", "f", "g"].iter().enumerate() {
            allocator.variable_register(var(name), 0, &code).unwrap();
            assert_eq!(allocator.map().get(var(name)), Some(Register::POOL[i]));
        }
        let reg = allocator.variable_register(var("h"), 0, &code).unwrap();
        assert_eq!(reg, Register::T0);
        assert_eq!(allocator.map().get(var("a")), None);
        // b survived: it is still read at index 1
        assert_eq!(allocator.map().get(var("b")), Some(Register::T1));
    }

    #[test]
    fn exhaustion_is_an_error() {
        // all seven occupants are read later, so the eighth variable has
        // nowhere to go
        let reads: Vec<Instruction> = ["a", "b", "c", "d", "e", "f", "g"]
            .iter()
            .map(|name| Instruction::Ret {
                value: Value::Variable(var(name)),
            })
            .collect();
        let mut allocator = RegisterAllocator::new();
        for name in ["a", "b", "c", "d", "e", "f", "g"] {
            allocator.variable_register(var(name), 0, &reads).unwrap();
        }
        assert!(matches!(
            allocator.variable_register(var("h"), 0, &reads),
            Err(CodegenError::OutOfRegisters(_))
        ));
    }
}
