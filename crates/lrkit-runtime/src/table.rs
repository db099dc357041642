//! The concrete action/goto table and its text form.
//!
//! The serialized form is line oriented:
//!
//! ```text
//! <number of states>
//! state <number of entries>
//! SYMBOL shift N
//! SYMBOL reduce [default,discard] __CHAIN__ LHS := RHS...
//! SYMBOL accept
//! SYMBOL goto N
//! ```
//!
//! The bracketed list holds one option per right-hand-side position. The
//! optional `__CHAIN__` and `__UNWRAP__` flags follow it. Symbol names must
//! not contain whitespace.

use crate::{
    definition::{Entry, ParseTable, StateID},
    rule::{Rule, RuleID, RuleOption, SymbolString},
    symbol::{Symbol, SymbolTable},
    types::Map,
    util::display_fn,
};
use std::fmt;

const CHAIN_FLAG: &str = "__CHAIN__";
const UNWRAP_FLAG: &str = "__UNWRAP__";

/// The kind of collision between two entries for the same cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    /// Two shifts to different states.
    ShiftShift,
    /// An accept collided with a shift or reduce on end of input.
    Accept,
    /// A goto collided with another entry.
    Goto,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ShiftReduce => "shift/reduce",
            Self::ReduceReduce => "reduce/reduce",
            Self::ShiftShift => "shift/shift",
            Self::Accept => "accept",
            Self::Goto => "goto",
        })
    }
}

/// Two entries competed for one cell; `replacement` is the one kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub symbol: Symbol,
    pub kind: ConflictKind,
    pub previous: Entry,
    pub replacement: Entry,
}

impl Conflict {
    pub fn display<'t>(&'t self, table: &'t ParsingTable) -> impl fmt::Display + 't {
        display_fn(move |f| {
            write!(
                f,
                "{} conflict in state {} on {}: {} replaced by {}",
                self.kind,
                self.state,
                self.symbol.display(&table.symbols),
                table.display_entry(self.previous),
                table.display_entry(self.replacement),
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct ParsingTable {
    symbols: SymbolTable,
    rules: Vec<Rule>,
    states: Vec<Map<Symbol, Entry>>,
    conflicts: Vec<Conflict>,
}

impl ParsingTable {
    /// Create a table with `num_states` empty states.
    ///
    /// `Entry::Reduce` refers to `rules` by index.
    pub fn new(symbols: SymbolTable, rules: Vec<Rule>, num_states: usize) -> Self {
        Self {
            symbols,
            rules,
            states: vec![Map::default(); num_states],
            conflicts: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &Map<Symbol, Entry>)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(index, row)| (StateID::from_index(index), row))
    }

    pub fn get(&self, state: StateID, symbol: Symbol) -> Option<Entry> {
        self.states.get(state.index())?.get(&symbol).copied()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn set_shift(&mut self, state: StateID, symbol: Symbol, next: StateID) {
        self.set(state, symbol, Entry::Shift(next));
    }

    pub fn set_reduce(&mut self, state: StateID, symbol: Symbol, rule: RuleID) {
        self.set(state, symbol, Entry::Reduce(rule));
    }

    pub fn set_accept(&mut self, state: StateID, symbol: Symbol) {
        self.set(state, symbol, Entry::Accept);
    }

    pub fn set_goto(&mut self, state: StateID, symbol: Symbol, next: StateID) {
        self.set(state, symbol, Entry::Goto(next));
    }

    /// Store `entry`, recording a conflict when a different entry is
    /// already present. The new entry always wins.
    fn set(&mut self, state: StateID, symbol: Symbol, entry: Entry) {
        let row = &mut self.states[state.index()];
        if let Some(previous) = row.insert(symbol, entry) {
            if previous == entry {
                return;
            }
            let kind = match (previous, entry) {
                (Entry::Goto(..), _) | (_, Entry::Goto(..)) => ConflictKind::Goto,
                (Entry::Accept, _) | (_, Entry::Accept) => ConflictKind::Accept,
                (Entry::Shift(..), Entry::Shift(..)) => ConflictKind::ShiftShift,
                (Entry::Reduce(..), Entry::Reduce(..)) => ConflictKind::ReduceReduce,
                _ => ConflictKind::ShiftReduce,
            };
            self.conflicts.push(Conflict {
                state,
                symbol,
                kind,
                previous,
                replacement: entry,
            });
        }
    }

    /// Register `rule`, reusing the id of an identical rule.
    fn intern_rule(&mut self, rule: Rule) -> RuleID {
        let index = match self.rules.iter().position(|r| *r == rule) {
            Some(index) => index,
            None => {
                self.rules.push(rule);
                self.rules.len() - 1
            }
        };
        RuleID::from_raw(index as u32)
    }

    fn display_entry(&self, entry: Entry) -> impl fmt::Display + '_ {
        display_fn(move |f| match entry {
            Entry::Shift(next) => write!(f, "shift {}", next),
            Entry::Reduce(id) => match self.rules.get(id.index()) {
                Some(rule) => write!(f, "reduce {}", rule.display(&self.symbols)),
                None => write!(f, "reduce #{}", id),
            },
            Entry::Accept => f.write_str("accept"),
            Entry::Goto(next) => write!(f, "goto {}", next),
        })
    }

    /// Read a table written by the `Display` implementation, registering
    /// its symbol names in `symbols`.
    pub fn parse(source: &str, symbols: &mut SymbolTable) -> Result<Self, TableFormatError> {
        let mut lines = LineReader {
            lines: source.lines().enumerate(),
            line_no: 0,
        };

        let (line_no, header) = lines.expect()?;
        let num_states = parse_state(line_no, header)?.index();

        // Rows are added as their headers are read, so a bogus count runs
        // into the end of the input instead of allocating up front.
        let mut table = Self::new(SymbolTable::new(), vec![], 0);
        for index in 0..num_states {
            let (line_no, header) = lines.expect()?;
            let num_entries = match header.split_whitespace().collect::<Vec<_>>()[..] {
                ["state", count] => parse_number(line_no, count)?,
                _ => {
                    return Err(TableFormatError::new(
                        line_no,
                        TableFormatErrorKind::InvalidStateHeader(header.to_owned()),
                    ))
                }
            };

            let state = StateID::from_index(index);
            table.states.push(Map::default());
            for _ in 0..num_entries {
                let (line_no, line) = lines.expect()?;
                let (symbol, entry) = table.parse_entry(line_no, line, symbols)?;
                if let Entry::Shift(next) | Entry::Goto(next) = entry {
                    if next.index() >= num_states {
                        return Err(TableFormatError::new(
                            line_no,
                            TableFormatErrorKind::StateOutOfRange(next.index()),
                        ));
                    }
                }
                table.set(state, symbol, entry);
            }
        }

        if let Some((line_no, _)) = lines.next() {
            return Err(TableFormatError::new(
                line_no,
                TableFormatErrorKind::TrailingContent,
            ));
        }

        table.symbols = symbols.clone();
        Ok(table)
    }

    fn parse_entry(
        &mut self,
        line_no: usize,
        line: &str,
        symbols: &mut SymbolTable,
    ) -> Result<(Symbol, Entry), TableFormatError> {
        let invalid = || {
            TableFormatError::new(line_no, TableFormatErrorKind::InvalidEntry(line.to_owned()))
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (symbol, action, rest) = match &tokens[..] {
            [symbol, action, rest @ ..] => (symbols.intern(symbol), *action, rest),
            _ => return Err(invalid()),
        };

        let entry = match (action, rest) {
            ("shift", [next]) => Entry::Shift(parse_state(line_no, next)?),
            ("goto", [next]) => Entry::Goto(parse_state(line_no, next)?),
            ("accept", []) => Entry::Accept,
            ("reduce", [options, rest @ ..]) => {
                let rule = parse_rule(line_no, options, rest, symbols)?;
                Entry::Reduce(self.intern_rule(rule))
            }
            ("shift" | "goto" | "accept" | "reduce", _) => return Err(invalid()),
            (action, _) => {
                return Err(TableFormatError::new(
                    line_no,
                    TableFormatErrorKind::UnknownAction(action.to_owned()),
                ))
            }
        };

        Ok((symbol, entry))
    }
}

/// Non-blank lines, trimmed, with 1-based line numbers.
struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    line_no: usize,
}

impl<'a> LineReader<'a> {
    fn next(&mut self) -> Option<(usize, &'a str)> {
        for (index, line) in self.lines.by_ref() {
            self.line_no = index + 1;
            let line = line.trim();
            if !line.is_empty() {
                return Some((self.line_no, line));
            }
        }
        None
    }

    fn expect(&mut self) -> Result<(usize, &'a str), TableFormatError> {
        self.next().ok_or_else(|| {
            TableFormatError::new(self.line_no + 1, TableFormatErrorKind::UnexpectedEnd)
        })
    }
}

// State numbers and counts must fit a `StateID`.
fn parse_state(line_no: usize, s: &str) -> Result<StateID, TableFormatError> {
    s.parse::<u32>().map(StateID::from_raw).map_err(|_| {
        TableFormatError::new(line_no, TableFormatErrorKind::InvalidNumber(s.to_owned()))
    })
}

fn parse_number(line_no: usize, s: &str) -> Result<usize, TableFormatError> {
    s.parse().map_err(|_| {
        TableFormatError::new(line_no, TableFormatErrorKind::InvalidNumber(s.to_owned()))
    })
}

// `[opt,...] [__CHAIN__] [__UNWRAP__] LHS := RHS...`
fn parse_rule(
    line_no: usize,
    options: &str,
    mut rest: &[&str],
    symbols: &mut SymbolTable,
) -> Result<Rule, TableFormatError> {
    let error = |kind| TableFormatError::new(line_no, kind);

    let options = options
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| error(TableFormatErrorKind::InvalidOptions(options.to_owned())))?;
    let options = options
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            RuleOption::from_name(s)
                .ok_or_else(|| error(TableFormatErrorKind::InvalidOptions(s.to_owned())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut chained = false;
    let mut unwrap = false;
    loop {
        match rest.first() {
            Some(&CHAIN_FLAG) => chained = true,
            Some(&UNWRAP_FLAG) => unwrap = true,
            _ => break,
        }
        rest = &rest[1..];
    }

    let (lhs, rhs) = match rest {
        [lhs, ":=", rhs @ ..] => (symbols.intern(lhs), rhs),
        _ => return Err(error(TableFormatErrorKind::InvalidRule(rest.join(" ")))),
    };
    if options.len() != rhs.len() {
        return Err(error(TableFormatErrorKind::OptionCountMismatch {
            options: options.len(),
            symbols: rhs.len(),
        }));
    }
    let rhs: SymbolString = rhs.iter().map(|name| symbols.intern(name)).collect();

    Ok(Rule::new(lhs, rhs)
        .with_options(options)
        .with_chained(chained)
        .with_unwrap(unwrap))
}

impl fmt::Display for ParsingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.states.len())?;
        for row in &self.states {
            writeln!(f, "state {}", row.len())?;
            for (symbol, entry) in row {
                write!(f, "{} ", symbol.display(&self.symbols))?;
                match entry {
                    Entry::Shift(next) => writeln!(f, "shift {}", next)?,
                    Entry::Goto(next) => writeln!(f, "goto {}", next)?,
                    Entry::Accept => writeln!(f, "accept")?,
                    Entry::Reduce(id) => {
                        let rule = self.rules.get(id.index()).ok_or(fmt::Error)?;
                        f.write_str("reduce [")?;
                        crate::util::write_separated(f, rule.options(), ",")?;
                        f.write_str("]")?;
                        if rule.is_chained() {
                            write!(f, " {}", CHAIN_FLAG)?;
                        }
                        if rule.unwraps_single() {
                            write!(f, " {}", UNWRAP_FLAG)?;
                        }
                        writeln!(f, " {}", rule.display(&self.symbols))?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Tables are equal when every state has the same entries, comparing
/// reductions by rule content rather than by id.
impl PartialEq for ParsingTable {
    fn eq(&self, other: &Self) -> bool {
        if self.states.len() != other.states.len() {
            return false;
        }
        self.states.iter().zip(&other.states).all(|(left, right)| {
            left.len() == right.len()
                && left.iter().all(|(symbol, entry)| {
                    match (entry, right.get(symbol)) {
                        (Entry::Reduce(l), Some(Entry::Reduce(r))) => {
                            self.rules.get(l.index()) == other.rules.get(r.index())
                        }
                        (entry, Some(other_entry)) => entry == other_entry,
                        (_, None) => false,
                    }
                })
        })
    }
}

impl ParseTable for ParsingTable {
    fn initial_state(&self) -> StateID {
        StateID::START
    }

    fn entry(&self, state: StateID, symbol: Symbol) -> Option<Entry> {
        self.get(state, symbol)
    }

    fn rule(&self, id: RuleID) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    fn expected(&self, state: StateID) -> Vec<Symbol> {
        self.states.get(state.index()).map_or_else(Vec::new, |row| {
            row.iter()
                .filter(|(_, entry)| entry.is_action())
                .map(|(symbol, _)| *symbol)
                .collect()
        })
    }

    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct TableFormatError {
    pub line: usize,
    pub kind: TableFormatErrorKind,
}

impl TableFormatError {
    fn new(line: usize, kind: TableFormatErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TableFormatErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("invalid number `{0}'")]
    InvalidNumber(String),

    #[error("invalid state header `{0}'")]
    InvalidStateHeader(String),

    #[error("invalid entry `{0}'")]
    InvalidEntry(String),

    #[error("unknown action `{0}'")]
    UnknownAction(String),

    #[error("invalid rule options `{0}'")]
    InvalidOptions(String),

    #[error("invalid rule `{0}'")]
    InvalidRule(String),

    #[error("{options} rule options given for {symbols} right-hand side symbols")]
    OptionCountMismatch { options: usize, symbols: usize },

    #[error("state {0} is out of range")]
    StateOutOfRange(usize),

    #[error("content after the last state")]
    TrailingContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(symbols: &mut SymbolTable) -> ParsingTable {
        let list = symbols.intern("list");
        let item = symbols.intern("item");
        let x = symbols.intern("x");

        let rules = vec![
            Rule::new(Symbol::START, [list]),
            Rule::new(list, [list, item]).with_chained(true),
            Rule::new(list, SymbolString::new()),
            Rule::new(item, [x])
                .with_options([RuleOption::Discard])
                .with_unwrap(true),
        ];
        let mut table = ParsingTable::new(symbols.clone(), rules, 3);
        let s0 = StateID::from_raw(0);
        let s1 = StateID::from_raw(1);
        let s2 = StateID::from_raw(2);
        table.set_reduce(s0, x, RuleID::from_raw(2));
        table.set_reduce(s0, Symbol::EOF, RuleID::from_raw(2));
        table.set_goto(s0, list, s1);
        table.set_shift(s1, x, s2);
        table.set_accept(s1, Symbol::EOF);
        table.set_goto(s1, item, s2);
        table.set_reduce(s2, x, RuleID::from_raw(3));
        table.set_reduce(s2, Symbol::EOF, RuleID::from_raw(1));
        table
    }

    #[test]
    fn serialize_format() {
        let mut symbols = SymbolTable::new();
        let table = sample(&mut symbols);
        let text = table.to_string();
        assert!(text.starts_with("3\nstate 3\nx reduce [] list :=\n"));
        assert!(text.contains("x reduce [discard] __UNWRAP__ item := x\n"));
        assert!(text.contains("__EOF__ reduce [default,default] __CHAIN__ list := list item\n"));
        assert!(text.contains("__EOF__ accept\n"));
        assert!(text.contains("list goto 1\n"));
    }

    #[test]
    fn round_trip() {
        let mut symbols = SymbolTable::new();
        let table = sample(&mut symbols);
        let parsed = ParsingTable::parse(&table.to_string(), &mut symbols).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.to_string(), table.to_string());
        assert!(parsed.conflicts().is_empty());
    }

    #[test]
    fn round_trip_into_fresh_symbol_table() {
        let mut symbols = SymbolTable::new();
        let table = sample(&mut symbols);
        let mut fresh = SymbolTable::new();
        let parsed = ParsingTable::parse(&table.to_string(), &mut fresh).unwrap();
        assert_eq!(parsed.to_string(), table.to_string());
    }

    #[test]
    fn expected_skips_gotos() {
        let mut symbols = SymbolTable::new();
        let table = sample(&mut symbols);
        let x = symbols.get("x").unwrap();
        assert_eq!(table.expected(StateID::from_raw(1)), vec![x, Symbol::EOF]);
    }

    #[test]
    fn conflicts_are_recorded_and_latest_wins() {
        let mut symbols = SymbolTable::new();
        let mut table = sample(&mut symbols);
        let x = symbols.get("x").unwrap();
        let s2 = StateID::from_raw(2);

        table.set_shift(s2, x, StateID::from_raw(0));
        assert_eq!(table.get(s2, x), Some(Entry::Shift(StateID::from_raw(0))));
        table.set_reduce(s2, x, RuleID::from_raw(1));
        table.set_shift(s2, x, StateID::from_raw(1));
        table.set_shift(s2, x, StateID::from_raw(1));

        let kinds: Vec<_> = table.conflicts().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            [
                ConflictKind::ShiftReduce,
                ConflictKind::ShiftReduce,
                ConflictKind::ShiftReduce,
            ]
        );
        let message = table.conflicts()[0].display(&table).to_string();
        assert_eq!(
            message,
            "shift/reduce conflict in state 2 on x: reduce item := x replaced by shift 0"
        );

        table.set_shift(s2, x, StateID::from_raw(2));
        assert_eq!(table.conflicts().last().unwrap().kind, ConflictKind::ShiftShift);
    }

    #[test]
    fn malformed_tables_are_rejected() {
        let mut symbols = SymbolTable::new();
        let cases = [
            ("", 1),
            ("x", 1),
            ("1\nstat 0", 2),
            ("1\nstate 1\na jump 0", 3),
            ("1\nstate 1\na shift 4", 3),
            ("1\nstate 1\na reduce [wrap] b := c d", 3),
            ("1\nstate 1\na reduce [bogus] b := c", 3),
            ("1\nstate 1\na reduce [] b c", 3),
            ("1\nstate 2\na accept", 4),
            ("1\nstate 0\nb accept", 3),
            ("18446744073709551615\n", 1),
            ("4294967295\nstate 0\n", 3),
            ("1\nstate 1\na shift 99999999999", 3),
            ("1\nstate 1\na goto 4294967296", 3),
        ];
        for (source, line) in cases {
            let err = ParsingTable::parse(source, &mut symbols).unwrap_err();
            assert_eq!(err.line, line, "{:?}: {}", source, err);
        }
    }
}
