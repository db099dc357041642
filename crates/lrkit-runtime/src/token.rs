//! Lexical tokens.

use crate::{
    symbol::{Symbol, SymbolTable},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// A recognized span of the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    pub text: String,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset just past the last character.
    pub end: usize,
    /// Free-form annotations attached by later passes.
    pub data: Map<String, String>,
}

impl Token {
    pub fn new(symbol: Symbol, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            symbol,
            text: text.into(),
            start,
            end,
            data: Map::default(),
        }
    }

    /// The end-of-input token for an input of `len` bytes.
    pub fn eof(len: usize) -> Self {
        Self::new(Symbol::EOF, "", len, len)
    }

    pub fn is_eof(&self) -> bool {
        self.symbol == Symbol::EOF
    }

    /// `NAME<text>`, or just `NAME` when the text spells the name.
    pub fn display<'t>(&'t self, table: &'t SymbolTable) -> impl fmt::Display + 't {
        display_fn(move |f| {
            let name = self.symbol.display(table).to_string();
            if name == self.text || self.is_eof() {
                f.write_str(&name)
            } else {
                write!(f, "{}<{}>", name, self.text.escape_debug())
            }
        })
    }
}
