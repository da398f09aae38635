//! IR builder: an [`ActionObserver`] that mirrors the parse stack with a
//! value stack and appends instructions as reductions fire.

use super::{BinaryOp, Instruction, TempAllocator, Value, Variable};
use crate::lexer::Token;
use crate::parser::{ActionObserver, Production, State};

#[derive(Default)]
pub struct IrBuilder<'code> {
    /// One slot per parse-stack symbol. `None` for symbols that carry no
    /// value (punctuation, statements, declarations).
    stack: Vec<Option<Value<'code>>>,
    instructions: Vec<Instruction<'code>>,
    temps: TempAllocator,
}

impl<'code> IrBuilder<'code> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished instruction list, together with the temporary
    /// allocator so later passes keep drawing from the same sequence.
    pub fn into_ir(self) -> (Vec<Instruction<'code>>, TempAllocator) {
        (self.instructions, self.temps)
    }

    fn emit(&mut self, instruction: Instruction<'code>) {
        tracing::debug!(target: "irgen", "emit {}", instruction);
        self.instructions.push(instruction);
    }

    fn pop(&mut self) -> Option<Value<'code>> {
        self.stack
            .pop()
            .expect("value stack out of sync with parse stack")
    }

    fn pop_value(&mut self) -> Value<'code> {
        self.pop().expect("expression symbol carries a value")
    }

    fn pop_variable(&mut self) -> Variable<'code> {
        match self.pop_value() {
            Value::Variable(var) => var,
            Value::Immediate(imm) => {
                unreachable!("assignment target is an identifier, found immediate {}", imm)
            }
        }
    }

    fn binary(&mut self, op: BinaryOp) {
        let rhs = self.pop_value();
        self.pop(); // operator token
        let lhs = self.pop_value();
        let result = self.temps.fresh();
        self.emit(Instruction::Binary {
            op,
            result,
            lhs,
            rhs,
        });
        self.stack.push(Some(Value::Variable(result)));
    }
}

impl<'code> ActionObserver<'code> for IrBuilder<'code> {
    fn on_shift(&mut self, _state: State, token: &Token<'code>) {
        // a decimal literal becomes an immediate; anything else refers to
        // the underlying name (worthless for punctuation, whose slots are
        // popped unread)
        let value = match token.text.parse::<i32>() {
            Ok(n) => Value::Immediate(n),
            Err(_) => Value::Variable(Variable::Named(token.text)),
        };
        self.stack.push(Some(value));
    }

    fn on_reduce(&mut self, _state: State, production: &Production) {
        match production.index {
            // Stmt -> id = Expr
            6 => {
                let source = self.pop_value();
                self.pop(); // '='
                let result = self.pop_variable();
                self.emit(Instruction::Mov { result, source });
                self.stack.push(None);
            }
            // Stmt -> return Expr
            7 => {
                let value = self.pop_value();
                self.pop(); // 'return'
                self.emit(Instruction::Ret { value });
                self.stack.push(None);
            }
            // Expr -> Expr + Term
            8 => self.binary(BinaryOp::Add),
            // Expr -> Expr - Term
            9 => self.binary(BinaryOp::Sub),
            // Term -> Term * Factor
            11 => self.binary(BinaryOp::Mul),
            // pass-through: Expr -> Term, Term -> Factor,
            // Factor -> id, Factor -> IntConst
            10 | 12 | 14 | 15 => {
                let value = self.pop();
                self.stack.push(value);
            }
            // Factor -> ( Expr )
            13 => {
                self.pop(); // ')'
                let value = self.pop();
                self.pop(); // '('
                self.stack.push(value);
            }
            // everything else (declarations, statement lists) builds no
            // value; pop the body to stay in sync and push an empty slot
            _ => {
                for _ in 0..production.body.len() {
                    self.pop();
                }
                self.stack.push(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceMetadata;
    use crate::lexer::tokenize;
    use crate::parser::{SyntaxAnalyzer, LR_TABLE};
    use crate::symtab::SymbolTable;

    fn build(input: &str) -> Vec<Instruction> {
        let meta = SourceMetadata::new(input);
        let mut symbols = SymbolTable::new();
        let tokens = tokenize(&meta, &mut symbols).unwrap();
        let mut builder = IrBuilder::new();
        SyntaxAnalyzer::new(tokens, &LR_TABLE, &meta)
            .run(&mut [&mut builder])
            .unwrap();
        assert_eq!(builder.stack.len(), 1, "value stack must mirror the parse stack");
        let (ir, _) = builder.into_ir();
        ir
    }

    fn named(name: &str) -> Value {
        Value::Variable(Variable::Named(name))
    }

    fn temp(n: usize) -> Value<'static> {
        Value::Variable(Variable::Temp(n))
    }

    #[test]
    fn assignment_of_a_sum() {
        assert_eq!(
            build("a = 1 + 2;"),
            vec![
                Instruction::Binary {
                    op: BinaryOp::Add,
                    result: Variable::Temp(0),
                    lhs: Value::Immediate(1),
                    rhs: Value::Immediate(2),
                },
                Instruction::Mov {
                    result: Variable::Named("a"),
                    source: temp(0),
                },
            ]
        );
    }

    #[test]
    fn return_of_a_product() {
        assert_eq!(
            build("return a * 3;"),
            vec![
                Instruction::Binary {
                    op: BinaryOp::Mul,
                    result: Variable::Temp(0),
                    lhs: named("a"),
                    rhs: Value::Immediate(3),
                },
                Instruction::Ret { value: temp(0) },
            ]
        );
    }

    #[test]
    fn parentheses_regroup_without_emitting() {
        assert_eq!(
            build("a = (1 + b) * 2;"),
            vec![
                Instruction::Binary {
                    op: BinaryOp::Add,
                    result: Variable::Temp(0),
                    lhs: Value::Immediate(1),
                    rhs: named("b"),
                },
                Instruction::Binary {
                    op: BinaryOp::Mul,
                    result: Variable::Temp(1),
                    lhs: temp(0),
                    rhs: Value::Immediate(2),
                },
                Instruction::Mov {
                    result: Variable::Named("a"),
                    source: temp(1),
                },
            ]
        );
    }

    #[test]
    fn declarations_emit_nothing() {
        assert_eq!(
            build("int a; a = 5;"),
            vec![Instruction::Mov {
                result: Variable::Named("a"),
                source: Value::Immediate(5),
            }]
        );
    }

    #[test]
    fn subtraction_keeps_operand_order() {
        assert_eq!(
            build("x = a - b;"),
            vec![
                Instruction::Binary {
                    op: BinaryOp::Sub,
                    result: Variable::Temp(0),
                    lhs: named("a"),
                    rhs: named("b"),
                },
                Instruction::Mov {
                    result: Variable::Named("x"),
                    source: temp(0),
                },
            ]
        );
    }
}
