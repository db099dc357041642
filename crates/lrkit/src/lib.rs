//! A toolkit for building lexers and LR(1) parsers from rule text.
//!
//! Lexer rules are compiled through regular expressions, Thompson NFAs and
//! subset construction into a DFA driving a maximal-munch [`Lexer`].
//! Grammar rules are analysed for FIRST/FOLLOW sets and turned into a
//! canonical LR(1) [`ParsingTable`] run by [`LRParser`].

pub mod automaton;
pub mod build;
pub mod grammar;
pub mod item;
pub mod lexer;
pub mod lr1;
pub mod regex;
pub mod syntax;
pub mod types;

pub use crate::{
    grammar::{Grammar, GrammarError, SymbolSet},
    lexer::{ErrorPolicy, LexError, Lexer},
};
pub use lrkit_runtime::{
    parser::{LRParser, ParseError},
    rule::{Rule, RuleOption, SymbolString},
    symbol::{Symbol, SymbolTable},
    table::ParsingTable,
    token::Token,
    tree::{Node, SyntaxTree},
};
