//! Deterministic automata driving the lexer.

use super::{escape_char, StateID};
use crate::types::Map;
use lrkit_runtime::{
    symbol::{Symbol, SymbolTable},
    util::display_fn,
};
use std::{collections::BTreeMap, fmt};

/// A DFA whose accepting states are labelled with the recognized symbol.
#[derive(Debug, Clone, Default)]
pub struct Dfa {
    transitions: Vec<BTreeMap<char, StateID>>,
    accepting: Map<StateID, Symbol>,
}

impl Dfa {
    pub const INITIAL: StateID = StateID::from_raw(0);

    pub(crate) fn from_parts(
        transitions: Vec<BTreeMap<char, StateID>>,
        accepting: Map<StateID, Symbol>,
    ) -> Self {
        Self {
            transitions,
            accepting,
        }
    }

    /// The number of states.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    #[inline]
    pub fn step(&self, state: StateID, c: char) -> Option<StateID> {
        self.transitions.get(state.index())?.get(&c).copied()
    }

    #[inline]
    pub fn accepted(&self, state: StateID) -> Option<Symbol> {
        self.accepting.get(&state).copied()
    }

    /// The symbol accepted after consuming the whole of `input`, if any.
    ///
    /// The initial state never accepts, so the empty input never matches.
    pub fn matches(&self, input: &str) -> Option<Symbol> {
        let mut state = Self::INITIAL;
        for c in input.chars() {
            state = self.step(state, c)?;
        }
        self.accepted(state)
    }

    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            for (i, edges) in self.transitions.iter().enumerate() {
                let state = StateID::from_index(i);
                match self.accepted(state) {
                    Some(symbol) => writeln!(f, "state {} (accepts {}):", state, symbol.display(symbols))?,
                    None => writeln!(f, "state {}:", state)?,
                }
                for (&c, &to) in edges {
                    writeln!(f, "  {} -> {}", escape_char(c), to)?;
                }
            }
            Ok(())
        })
    }
}
