//! Shift-reduce driver for the prebuilt parsing tables.
//!
//! The driver keeps a state stack and a symbol stack in lockstep and holds
//! no semantic payload of its own: everything semantic happens in the
//! registered observers, which are notified before every stack mutation so
//! they can mirror the parse stack with their own value stacks.

use super::table::{Action, LrTable, NonTerminal, Production, State};
use crate::error::{self, Error, SourceMetadata};
use crate::lexer::Token;
use thiserror::Error as ThisError;

pub type ParseError = error::Error<ParseErrorKind>;

#[derive(Debug, ThisError)]
pub enum ParseErrorKind {
    #[error("no parse action in state {state} for {token}")]
    NoAction { state: State, token: String },
}

/// Listener for the automaton's actions. A reduce notification arrives
/// before the driver pops the handle's body, so an observer's parallel
/// stack still holds the slots about to be consumed.
pub trait ActionObserver<'code> {
    fn on_shift(&mut self, state: State, token: &Token<'code>);
    fn on_reduce(&mut self, state: State, production: &Production);
    fn on_accept(&mut self, _state: State) {}
}

/// Parse-stack element. Carries no semantic value; those live in the
/// observers' stacks, one slot per element here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSymbol<'code> {
    Token(Token<'code>),
    NonTerminal(NonTerminal),
}

pub struct SyntaxAnalyzer<'code, 'm, 't> {
    tokens: Vec<Token<'code>>,
    table: &'t LrTable,
    metadata: &'m SourceMetadata<'code>,
}

impl<'code, 'm, 't> SyntaxAnalyzer<'code, 'm, 't> {
    pub fn new(
        tokens: Vec<Token<'code>>,
        table: &'t LrTable,
        metadata: &'m SourceMetadata<'code>,
    ) -> Self {
        Self {
            tokens,
            table,
            metadata,
        }
    }

    pub fn run(
        &self,
        observers: &mut [&mut dyn ActionObserver<'code>],
    ) -> Result<(), ParseError> {
        let mut states = vec![self.table.init()];
        let mut symbols = vec![StackSymbol::Token(Token::eof())];
        let mut input = self.tokens.iter().copied();
        let mut lookahead = input.next().unwrap_or(Token::eof());

        loop {
            let current = *states.last().expect("state stack never empties");
            let action = self
                .table
                .action(current, lookahead.kind)
                .ok_or_else(|| {
                    Error::new(ParseErrorKind::NoAction {
                        state: current,
                        token: lookahead.to_string(),
                    })
                    .with_source(lookahead.span, self.metadata)
                })?;

            match action {
                Action::Shift(next) => {
                    tracing::trace!(target: "parser", "shift {} in state {}", lookahead, current);
                    for observer in observers.iter_mut() {
                        observer.on_shift(current, &lookahead);
                    }
                    states.push(next);
                    symbols.push(StackSymbol::Token(lookahead));
                    lookahead = input.next().unwrap_or(Token::eof());
                }
                Action::Reduce(index) => {
                    let production = self.table.production(index);
                    tracing::trace!(target: "parser", "reduce {} in state {}", production, current);
                    for observer in observers.iter_mut() {
                        observer.on_reduce(current, production);
                    }
                    for _ in 0..production.body.len() {
                        states.pop();
                        symbols.pop();
                    }
                    let top = *states.last().expect("reduce popped the initial state");
                    let target = self
                        .table
                        .goto(top, production.head)
                        .expect("tables carry a goto for every reduced nonterminal");
                    states.push(target);
                    symbols.push(StackSymbol::NonTerminal(production.head));
                }
                Action::Accept => {
                    tracing::trace!(target: "parser", "accept in state {}", current);
                    for observer in observers.iter_mut() {
                        observer.on_accept(current);
                    }
                    return Ok(());
                }
            }
            debug_assert_eq!(states.len(), symbols.len());
        }
    }
}
