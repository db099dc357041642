//! Finite automata backing the lexer.

pub mod dfa;
pub mod nfa;
pub mod subset;

pub use self::{
    dfa::Dfa,
    nfa::{Label, Nfa},
    subset::MultiAcceptNfa,
};

use std::fmt;

/// The number identifying a state of an NFA or a DFA.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: u32,
}

impl StateID {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    pub fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "too many automaton states");
        Self::from_raw(index as u32)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// Render a character the way it would be written in a pattern.
pub(crate) fn escape_char(c: char) -> impl fmt::Display {
    lrkit_runtime::util::display_fn(move |f| match c {
        '\n' => f.write_str("\\n"),
        '\t' => f.write_str("\\t"),
        '\r' => f.write_str("\\r"),
        ' ' => f.write_str("' '"),
        c => write!(f, "{}", c),
    })
}
