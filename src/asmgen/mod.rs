//! Code generation: IR simplification, register allocation and assembly
//! emission, fused into one forward walk.

pub mod assembly;
pub mod registers;
pub mod simplify;

use self::assembly::{Assembly, Directive, Register};
use self::registers::RegisterAllocator;
pub use self::registers::CodegenError;
use crate::ir::{self, BinaryOp, TempAllocator, Value};

/// Lower the IR list to assembly. Allocation happens per operand, in
/// lhs, rhs, result order, at the instruction being emitted.
pub fn codegen(
    ir: Vec<ir::Instruction>,
    mut temps: TempAllocator,
) -> Result<Vec<Assembly>, CodegenError> {
    let code = simplify::simplify(ir, &mut temps);
    let mut allocator = RegisterAllocator::new();
    let mut output = vec![Assembly::Directive(Directive::Text)];

    for (index, instruction) in code.iter().enumerate() {
        let lowered = match *instruction {
            ir::Instruction::Binary {
                op,
                result,
                lhs,
                rhs,
            } => {
                let lhs_reg = match lhs.as_variable() {
                    Some(var) => allocator.variable_register(var, index, &code)?,
                    // the simplification pass never leaves an immediate
                    // on the left
                    None => unreachable!("immediate lhs reached emission: {}", instruction),
                };
                let rhs_reg = allocator.ensure_register(rhs, index, &code)?;
                let dst = allocator.variable_register(result, index, &code)?;
                match (op, rhs, rhs_reg) {
                    (BinaryOp::Add, Value::Immediate(imm), _) => assembly::Instruction::Addi {
                        dst,
                        lhs: lhs_reg,
                        imm,
                    },
                    (BinaryOp::Add, _, Some(rhs)) => assembly::Instruction::Add {
                        dst,
                        lhs: lhs_reg,
                        rhs,
                    },
                    (BinaryOp::Sub, _, Some(rhs)) => assembly::Instruction::Sub {
                        dst,
                        lhs: lhs_reg,
                        rhs,
                    },
                    (BinaryOp::Mul, _, Some(rhs)) => assembly::Instruction::Mul {
                        dst,
                        lhs: lhs_reg,
                        rhs,
                    },
                    _ => unreachable!(
                        "immediates survive simplification only as the rhs of add: {}",
                        instruction
                    ),
                }
            }
            ir::Instruction::Mov { result, source } => {
                let src_reg = allocator.ensure_register(source, index, &code)?;
                let dst = allocator.variable_register(result, index, &code)?;
                match (source, src_reg) {
                    (Value::Immediate(imm), _) => assembly::Instruction::Li { dst, imm },
                    (Value::Variable(_), Some(src)) => assembly::Instruction::Mv { dst, src },
                    (Value::Variable(_), None) => {
                        unreachable!("variable operand was just allocated a register")
                    }
                }
            }
            // terminal instruction; the simplified list ends here
            ir::Instruction::Ret { value } => match value {
                Value::Immediate(imm) => assembly::Instruction::Li {
                    dst: Register::RETURN,
                    imm,
                },
                Value::Variable(var) => assembly::Instruction::Mv {
                    dst: Register::RETURN,
                    src: allocator.variable_register(var, index, &code)?,
                },
            },
        };
        tracing::trace!(target: "asmgen", "{} <- {}", lowered, instruction);
        output.push(Assembly::Instruction(lowered, instruction.to_string()));
    }
    Ok(output)
}
