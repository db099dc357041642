//! Runtime support for `lrkit` parse tables.
//!
//! This crate holds what a consumer of a finished table needs: the symbol
//! interner, tokens, production rules, the table itself and the parser
//! that runs it.

pub mod definition;
pub mod parser;
pub mod rule;
pub mod symbol;
pub mod table;
pub mod token;
pub mod tree;
pub mod types;
pub mod util;

pub use crate::{
    definition::{Entry, ParseTable, StateID},
    parser::{LRParser, Parse, ParseError},
    rule::{Rule, RuleID, RuleOption, SymbolString},
    symbol::{Symbol, SymbolTable},
    table::{Conflict, ConflictKind, ParsingTable, TableFormatError},
    token::Token,
    tree::{Node, SyntaxTree},
};
