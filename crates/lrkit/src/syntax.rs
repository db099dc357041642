//! Readers for the textual rule formats.
//!
//! * [`lexer_file`]: one lexer rule per line, `NAME := pattern` or a bare literal.
//! * [`grammar_file`]: one production per line, `LHS := RHS...`.
//! * [`description`]: the annotated grammar-description language, parsed
//!   by a lexer and an LR(1) table built with this crate.

pub mod description;
pub mod grammar_file;
pub mod lexer_file;

/// Whether a line carries no declaration.
fn is_blank_or_comment(line: &str) -> bool {
    line.is_empty() || line.starts_with("//")
}
