//! Type annotator observer: records declared types on symbol table
//! entries while the parse runs. Kept separate from the IR builder so the
//! driver stays agnostic of how many listeners ride along.

use super::driver::ActionObserver;
use super::table::{Production, State};
use crate::lexer::Token;
use crate::symtab::{SourceType, SymbolTable};

/// One slot per parse-stack symbol: the shifted token (if any) and the
/// type synthesized for the symbol (only declarations carry one).
#[derive(Debug, Clone, Copy)]
struct Slot<'code> {
    token: Option<Token<'code>>,
    ty: Option<SourceType>,
}

impl Slot<'_> {
    const EMPTY: Slot<'static> = Slot {
        token: None,
        ty: None,
    };
}

pub struct TypeAnnotator<'code, 'st> {
    stack: Vec<Slot<'code>>,
    symbols: &'st mut SymbolTable,
}

impl<'code, 'st> TypeAnnotator<'code, 'st> {
    pub fn new(symbols: &'st mut SymbolTable) -> Self {
        Self {
            stack: Vec::new(),
            symbols,
        }
    }

    fn pop(&mut self) -> Slot<'code> {
        self.stack
            .pop()
            .expect("type stack out of sync with parse stack")
    }
}

impl<'code> ActionObserver<'code> for TypeAnnotator<'code, '_> {
    fn on_shift(&mut self, _state: State, token: &Token<'code>) {
        self.stack.push(Slot {
            token: Some(*token),
            ty: None,
        });
    }

    fn on_reduce(&mut self, _state: State, production: &Production) {
        match production.index {
            // Decl -> int
            5 => {
                self.pop();
                self.stack.push(Slot {
                    token: None,
                    ty: Some(SourceType::Int),
                });
            }
            // Stmt -> Decl id
            4 => {
                let id = self.pop();
                let decl = self.pop();
                if let (Some(token), Some(ty)) = (id.token, decl.ty) {
                    tracing::debug!(target: "typecheck", "declaring {} as {}", token.text, ty);
                    if let Some(entry) = self.symbols.get_mut(token.text) {
                        entry.ty = Some(ty);
                    }
                }
                self.stack.push(Slot::EMPTY);
            }
            _ => {
                for _ in 0..production.body.len() {
                    self.pop();
                }
                self.stack.push(Slot::EMPTY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceMetadata;
    use crate::lexer::tokenize;
    use crate::parser::table::LR_TABLE;
    use crate::parser::SyntaxAnalyzer;
    use crate::symtab::SourceType;

    fn annotate(input: &str) -> SymbolTable {
        let meta = SourceMetadata::new(input);
        let mut symbols = SymbolTable::new();
        let tokens = tokenize(&meta, &mut symbols).unwrap();
        let mut annotator = TypeAnnotator::new(&mut symbols);
        SyntaxAnalyzer::new(tokens, &LR_TABLE, &meta)
            .run(&mut [&mut annotator])
            .unwrap();
        symbols
    }

    #[test]
    fn declared_names_get_their_type() {
        let symbols = annotate("int a; a = 1; return a;");
        assert_eq!(symbols.get("a").unwrap().ty, Some(SourceType::Int));
    }

    #[test]
    fn undeclared_names_stay_untyped() {
        let symbols = annotate("int a; b = 2; return b;");
        assert_eq!(symbols.get("b").unwrap().ty, None);
        assert_eq!(
            symbols.dump_lines(),
            vec!["(a, int)", "(b, null)"]
        );
    }
}
