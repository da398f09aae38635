use crate::error::{self, Error, SourceMetadata, Span};
use crate::symtab::SymbolTable;
use std::fmt;
use thiserror::Error;

pub type LexError = error::Error<LexErrorKind>;

#[derive(Debug, Error)]
pub enum LexErrorKind {
    #[error("unrecognized character {0:?}")]
    UnexpectedChar(char),
}

/// Terminal categories. These double as the terminal symbols of the
/// grammar, so the parse tables are indexed by them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    Int,
    Return,
    Identifier,
    IntConst,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Comma,
    OpenParen,
    CloseParen,
    Semicolon,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Return => "return",
            Self::Identifier => "id",
            Self::IntConst => "IntConst",
            Self::Assign => "=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Comma => ",",
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::Semicolon => "Semicolon",
            Self::Eof => "$",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'code> {
    pub kind: TokenKind,
    pub text: &'code str,
    pub span: Span,
}

impl<'code> Token<'code> {
    pub const fn new(kind: TokenKind, text: &'code str, span: Span) -> Self {
        Self { kind, text, span }
    }
    pub const fn eof() -> Token<'static> {
        Token {
            kind: TokenKind::Eof,
            text: "",
            span: Span::with_len(0, 0),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "({})", self.kind)
        } else {
            write!(f, "({}, {})", self.kind, self.text)
        }
    }
}

pub struct Lexer<'code, 'm, 'st> {
    input: std::iter::Peekable<std::str::CharIndices<'code>>,
    metadata: &'m SourceMetadata<'code>,
    symbols: &'st mut SymbolTable,
}

impl<'code, 'm, 'st> Lexer<'code, 'm, 'st> {
    pub fn new(metadata: &'m SourceMetadata<'code>, symbols: &'st mut SymbolTable) -> Self {
        Self {
            input: metadata.input().char_indices().peekable(),
            metadata,
            symbols,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'code>>, LexError> {
        self.skip_whitespace();
        let (start, ch) = match self.input.peek().copied() {
            None => return Ok(None),
            Some(x) => x,
        };
        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(Some(self.word(start)));
        }
        if ch.is_ascii_digit() {
            return Ok(Some(self.number(start)));
        }
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            ',' => TokenKind::Comma,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '=' => TokenKind::Assign,
            ';' => TokenKind::Semicolon,
            other => {
                return Err(Error::new(LexErrorKind::UnexpectedChar(other))
                    .with_source(Span::new(start), self.metadata))
            }
        };
        self.input.next();
        Ok(Some(Token::new(kind, "", Span::new(start))))
    }

    /// Identifier or keyword. New identifiers are entered into the symbol
    /// table here; the later stages only look names up.
    fn word(&mut self, start: usize) -> Token<'code> {
        let end = self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = &self.metadata.input()[start..end];
        let span = Span::with_len(start, end - start);
        match text {
            "int" => Token::new(TokenKind::Int, "", span),
            "return" => Token::new(TokenKind::Return, "", span),
            _ => {
                self.symbols.add(text);
                Token::new(TokenKind::Identifier, text, span)
            }
        }
    }

    fn number(&mut self, start: usize) -> Token<'code> {
        let end = self.eat_while(|c| c.is_ascii_digit());
        Token::new(
            TokenKind::IntConst,
            &self.metadata.input()[start..end],
            Span::with_len(start, end - start),
        )
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(_, c)) = self.input.peek() {
            if !pred(c) {
                break;
            }
            self.input.next();
        }
        self.current_offset()
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.input.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    fn current_offset(&mut self) -> usize {
        self.input
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or_else(|| self.metadata.input().len())
    }
}

/// Scan the whole input. The returned list always ends in an [`TokenKind::Eof`]
/// token, which the parser relies on as its end-of-input sentinel.
pub fn tokenize<'code>(
    metadata: &SourceMetadata<'code>,
    symbols: &mut SymbolTable,
) -> Result<Vec<Token<'code>>, LexError> {
    let mut lexer = Lexer::new(metadata, symbols);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    tokens.push(Token::eof());
    tracing::debug!(target: "lexer", "scanned {} tokens", tokens.len());
    Ok(tokens)
}
