//! Rewrites the IR into shapes the target can encode directly.
//!
//! The target's arithmetic takes an immediate only as the right operand
//! of an addition. Everything else gets folded (both operands immediate)
//! or materialized into a fresh temporary through a `mov`. The rewritten
//! list also stops at the first `ret`: nothing after it can execute in a
//! branch-free program.

use crate::ir::{BinaryOp, Instruction, TempAllocator, Value};

pub fn simplify<'code>(
    ir: Vec<Instruction<'code>>,
    temps: &mut TempAllocator,
) -> Vec<Instruction<'code>> {
    let mut out = Vec::with_capacity(ir.len());
    for instruction in ir {
        match instruction {
            Instruction::Mov { .. } => out.push(instruction),
            Instruction::Ret { .. } => {
                out.push(instruction);
                break;
            }
            Instruction::Binary {
                op,
                result,
                lhs,
                rhs,
            } => match (lhs, rhs) {
                (Value::Immediate(a), Value::Immediate(b)) => out.push(Instruction::Mov {
                    result,
                    source: Value::Immediate(op.apply(a, b)),
                }),
                (Value::Immediate(imm), Value::Variable(var)) => match op {
                    // addition commutes, so the immediate can just move
                    // to the right-hand side
                    BinaryOp::Add => out.push(Instruction::Binary {
                        op,
                        result,
                        lhs: Value::Variable(var),
                        rhs: Value::Immediate(imm),
                    }),
                    BinaryOp::Sub | BinaryOp::Mul => {
                        let temp = temps.fresh();
                        out.push(Instruction::Mov {
                            result: temp,
                            source: Value::Immediate(imm),
                        });
                        out.push(Instruction::Binary {
                            op,
                            result,
                            lhs: Value::Variable(temp),
                            rhs: Value::Variable(var),
                        });
                    }
                },
                (Value::Variable(_), Value::Immediate(imm)) => match op {
                    // already the natural immediate-as-second-operand form
                    BinaryOp::Add => out.push(instruction),
                    BinaryOp::Sub | BinaryOp::Mul => {
                        let temp = temps.fresh();
                        out.push(Instruction::Mov {
                            result: temp,
                            source: Value::Immediate(imm),
                        });
                        out.push(Instruction::Binary {
                            op,
                            result,
                            lhs,
                            rhs: Value::Variable(temp),
                        });
                    }
                },
                (Value::Variable(_), Value::Variable(_)) => out.push(instruction),
            },
        }
    }
    tracing::debug!(target: "asmgen", "simplified to {} instructions", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Variable;

    fn run(ir: Vec<Instruction>) -> Vec<Instruction> {
        // temp numbers in the input start at 0, so continue from 10 to
        // keep materialization temporaries recognizable
        let mut temps = TempAllocator::default();
        for _ in 0..10 {
            let _: Variable = temps.fresh();
        }
        simplify(ir, &mut temps)
    }

    fn binary<'code>(op: BinaryOp, lhs: Value<'code>, rhs: Value<'code>) -> Instruction<'code> {
        Instruction::Binary {
            op,
            result: Variable::Temp(0),
            lhs,
            rhs,
        }
    }

    /// After simplification, an immediate may only appear as the rhs of
    /// an add or as a mov source.
    fn assert_encodable(code: &[Instruction]) {
        for instruction in code {
            if let Instruction::Binary { op, lhs, rhs, .. } = instruction {
                assert!(!lhs.is_immediate(), "immediate lhs in {}", instruction);
                if *op != BinaryOp::Add {
                    assert!(!rhs.is_immediate(), "immediate rhs in {}", instruction);
                }
            }
        }
    }

    #[test]
    fn folds_immediate_pairs() {
        for (op, expected) in [
            (BinaryOp::Add, 8),
            (BinaryOp::Sub, 2),
            (BinaryOp::Mul, 15),
        ] {
            let out = run(vec![binary(op, Value::Immediate(5), Value::Immediate(3))]);
            assert_eq!(
                out,
                vec![Instruction::Mov {
                    result: Variable::Temp(0),
                    source: Value::Immediate(expected),
                }]
            );
        }
    }

    #[test]
    fn commutes_add_with_immediate_lhs() {
        let out = run(vec![binary(
            BinaryOp::Add,
            Value::Immediate(4),
            Value::Variable(Variable::Named("b")),
        )]);
        assert_eq!(
            out,
            vec![binary(
                BinaryOp::Add,
                Value::Variable(Variable::Named("b")),
                Value::Immediate(4),
            )]
        );
    }

    #[test]
    fn materializes_immediates_for_sub_and_mul() {
        for op in [BinaryOp::Sub, BinaryOp::Mul] {
            // immediate on the left
            let out = run(vec![binary(
                op,
                Value::Immediate(7),
                Value::Variable(Variable::Named("b")),
            )]);
            assert_eq!(
                out[0],
                Instruction::Mov {
                    result: Variable::Temp(10),
                    source: Value::Immediate(7),
                }
            );
            assert_encodable(&out);

            // immediate on the right
            let out = run(vec![binary(
                op,
                Value::Variable(Variable::Named("b")),
                Value::Immediate(7),
            )]);
            assert_eq!(
                out[1],
                Instruction::Binary {
                    op,
                    result: Variable::Temp(0),
                    lhs: Value::Variable(Variable::Named("b")),
                    rhs: Value::Variable(Variable::Temp(10)),
                }
            );
            assert_encodable(&out);
        }
    }

    #[test]
    fn passes_variable_pairs_through() {
        let input = vec![binary(
            BinaryOp::Sub,
            Value::Variable(Variable::Named("a")),
            Value::Variable(Variable::Named("b")),
        )];
        assert_eq!(run(input.clone()), input);
    }

    #[test]
    fn truncates_after_the_first_ret() {
        let out = run(vec![
            Instruction::Ret {
                value: Value::Variable(Variable::Named("a")),
            },
            Instruction::Mov {
                result: Variable::Named("b"),
                source: Value::Immediate(1),
            },
        ]);
        assert_eq!(
            out,
            vec![Instruction::Ret {
                value: Value::Variable(Variable::Named("a")),
            }]
        );
    }
}
