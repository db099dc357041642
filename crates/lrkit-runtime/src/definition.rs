//! Parser definition.

use crate::{
    rule::{Rule, RuleID},
    symbol::{Symbol, SymbolTable},
};
use std::fmt;

/// The number identifying a state of the LR(1) automaton.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: u32,
}

impl StateID {
    pub const START: Self = Self::from_raw(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    pub fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "too big state id");
        Self::from_raw(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// A cell of the action/goto table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Entry {
    /// Consume the lookahead and move to the state.
    Shift(StateID),
    /// Reduce by the rule.
    Reduce(RuleID),
    Accept,
    /// The state to enter after reducing to a nonterminal.
    Goto(StateID),
}

impl Entry {
    /// Whether the entry applies to a lookahead token rather than a reduced nonterminal.
    pub fn is_action(&self) -> bool {
        !matches!(self, Self::Goto(..))
    }
}

/// The trait for abstracting the LR(1) parse table driving [`LRParser`](crate::parser::LRParser).
pub trait ParseTable {
    /// Return the initial state number.
    fn initial_state(&self) -> StateID;

    /// Return the entry for the state and symbol, if any.
    fn entry(&self, state: StateID, symbol: Symbol) -> Option<Entry>;

    fn rule(&self, id: RuleID) -> Option<&Rule>;

    /// Return the lookahead symbols that have an action in the state.
    fn expected(&self, state: StateID) -> Vec<Symbol>;

    /// The symbol table used to name symbols in diagnostics.
    fn symbols(&self) -> &SymbolTable;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    fn initial_state(&self) -> StateID {
        (**self).initial_state()
    }

    fn entry(&self, state: StateID, symbol: Symbol) -> Option<Entry> {
        (**self).entry(state, symbol)
    }

    fn rule(&self, id: RuleID) -> Option<&Rule> {
        (**self).rule(id)
    }

    fn expected(&self, state: StateID) -> Vec<Symbol> {
        (**self).expected(state)
    }

    fn symbols(&self) -> &SymbolTable {
        (**self).symbols()
    }
}
