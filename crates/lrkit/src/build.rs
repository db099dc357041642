//! Building lexers and parsers from rule text.

use crate::{
    grammar::Grammar,
    lexer::Lexer,
    lr1::{Automaton, Config},
    syntax::{description, grammar_file, lexer_file},
};
use anyhow::Context as _;
use lrkit_runtime::{parser::LRParser, symbol::SymbolTable, table::ParsingTable};
use std::{fs, path::Path};

/// The syntax of a grammar source.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GrammarFormat {
    /// One `LHS := RHS...` production per line.
    #[default]
    Simple,
    /// The annotated grammar-description language.
    Description,
}

pub fn lexer_from_str(source: &str, symbols: &mut SymbolTable) -> anyhow::Result<Lexer> {
    lexer_file::load(source, symbols)
}

pub fn lexer_from_file(path: impl AsRef<Path>, symbols: &mut SymbolTable) -> anyhow::Result<Lexer> {
    let path = path.as_ref();
    let source = read(path)?;
    lexer_from_str(&source, symbols).with_context(|| format!("in {}", path.display()))
}

pub fn grammar_from_str(
    source: &str,
    format: GrammarFormat,
    symbols: &mut SymbolTable,
) -> anyhow::Result<Grammar> {
    match format {
        GrammarFormat::Simple => grammar_file::load(source, symbols),
        GrammarFormat::Description => description::load(source, symbols),
    }
}

/// Build the parse table of `grammar`. Conflicts are logged and kept in the table.
pub fn table_from_grammar(
    grammar: &Grammar,
    symbols: &SymbolTable,
    config: &Config,
) -> anyhow::Result<ParsingTable> {
    let automaton = Automaton::generate_with_config(grammar, config)?;
    Ok(automaton.to_table(grammar, symbols))
}

pub fn table_from_str(
    source: &str,
    format: GrammarFormat,
    symbols: &mut SymbolTable,
) -> anyhow::Result<ParsingTable> {
    let grammar = grammar_from_str(source, format, symbols)?;
    table_from_grammar(&grammar, symbols, &Config::new())
}

pub fn parser_from_str(
    source: &str,
    symbols: &mut SymbolTable,
) -> anyhow::Result<LRParser<ParsingTable>> {
    let table = table_from_str(source, GrammarFormat::Simple, symbols)?;
    Ok(LRParser::new(table))
}

pub fn parser_from_description(
    source: &str,
    symbols: &mut SymbolTable,
) -> anyhow::Result<LRParser<ParsingTable>> {
    let table = table_from_str(source, GrammarFormat::Description, symbols)?;
    Ok(LRParser::new(table))
}

pub fn parser_from_file(
    path: impl AsRef<Path>,
    format: GrammarFormat,
    symbols: &mut SymbolTable,
) -> anyhow::Result<LRParser<ParsingTable>> {
    let path = path.as_ref();
    let source = read(path)?;
    let table = table_from_str(&source, format, symbols)
        .with_context(|| format!("in {}", path.display()))?;
    Ok(LRParser::new(table))
}

/// Load a table previously written with its `Display` implementation.
pub fn parser_from_table_file(
    path: impl AsRef<Path>,
    symbols: &mut SymbolTable,
) -> anyhow::Result<LRParser<ParsingTable>> {
    let path = path.as_ref();
    let source = read(path)?;
    let table = ParsingTable::parse(&source, symbols)
        .with_context(|| format!("in {}", path.display()))?;
    Ok(LRParser::new(table))
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
