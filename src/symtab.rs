//! Symbol table shared between the lexer (which registers identifiers)
//! and the type annotator (which fills in their declared types).

use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Types of the source language. There is exactly one for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Int,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub text: String,
    /// `None` until a declaration is reduced for this name.
    pub ty: Option<SourceType>,
}

#[derive(Debug, Error)]
#[error("symbol not found: {0}")]
pub struct SymbolNotFound(pub String);

#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name, keeping the existing entry if it is already there.
    pub fn add(&mut self, text: &str) -> &mut SymbolEntry {
        self.entries
            .entry(text.to_string())
            .or_insert_with(|| SymbolEntry {
                text: text.to_string(),
                ty: None,
            })
    }

    pub fn get(&self, text: &str) -> Result<&SymbolEntry, SymbolNotFound> {
        self.entries
            .get(text)
            .ok_or_else(|| SymbolNotFound(text.to_string()))
    }

    pub fn get_mut(&mut self, text: &str) -> Option<&mut SymbolEntry> {
        self.entries.get_mut(text)
    }

    pub fn has(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    /// Entries ordered by name, one `(name, type)` line each. Undeclared
    /// names render their type as `null`.
    pub fn dump_lines(&self) -> Vec<String> {
        self.entries
            .values()
            .sorted_by(|a, b| a.text.cmp(&b.text))
            .map(|entry| match entry.ty {
                Some(ty) => format!("({}, {})", entry.text, ty),
                None => format!("({}, null)", entry.text),
            })
            .collect()
    }
}
