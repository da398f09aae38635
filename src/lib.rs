pub mod asmgen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod symtab;
