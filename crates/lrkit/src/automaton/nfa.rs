//! Nondeterministic automata produced by Thompson construction.

use super::{escape_char, StateID};
use lrkit_runtime::util::display_fn;
use std::{collections::BTreeSet, fmt};

/// The label of an NFA edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Epsilon,
    Char(char),
}

/// An NFA with one initial and one final state.
///
/// The initial state has no incoming edges and the final state has no
/// outgoing edges, so a whole automaton can be spliced between two states
/// of another one with [`Nfa::embed`].
#[derive(Debug, Clone)]
pub struct Nfa {
    edges: Vec<Vec<(Label, StateID)>>,
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

impl Nfa {
    pub const INITIAL: StateID = StateID::from_raw(0);
    pub const FINAL: StateID = StateID::from_raw(1);

    /// Create an automaton with just the initial and the final state.
    pub fn new() -> Self {
        Self {
            edges: vec![vec![], vec![]],
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn add_state(&mut self) -> StateID {
        let id = StateID::from_index(self.edges.len());
        self.edges.push(vec![]);
        id
    }

    pub fn add_transition(&mut self, from: StateID, label: Label, to: StateID) {
        let edges = &mut self.edges[from.index()];
        if !edges.contains(&(label, to)) {
            edges.push((label, to));
        }
    }

    pub fn add_epsilon(&mut self, from: StateID, to: StateID) {
        self.add_transition(from, Label::Epsilon, to);
    }

    pub fn edges(&self, state: StateID) -> &[(Label, StateID)] {
        &self.edges[state.index()]
    }

    pub fn states(&self) -> impl Iterator<Item = StateID> {
        (0..self.edges.len()).map(StateID::from_index)
    }

    /// Copy `child` into this automaton so that its initial state becomes
    /// `start` and its final state becomes `end`. Every other state of the
    /// child is given a fresh id.
    pub fn embed(&mut self, child: &Nfa, start: StateID, end: StateID) {
        let mapping: Vec<StateID> = child
            .states()
            .map(|state| match state {
                Self::INITIAL => start,
                Self::FINAL => end,
                _ => self.add_state(),
            })
            .collect();
        for from in child.states() {
            for &(label, to) in child.edges(from) {
                self.add_transition(mapping[from.index()], label, mapping[to.index()]);
            }
        }
    }

    /// All states reachable from `states` through epsilon edges alone.
    pub fn epsilon_closure<I>(&self, states: I) -> BTreeSet<StateID>
    where
        I: IntoIterator<Item = StateID>,
    {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<StateID> = states.into_iter().collect();
        while let Some(state) = stack.pop() {
            if !closure.insert(state) {
                continue;
            }
            for &(label, to) in self.edges(state) {
                if label == Label::Epsilon && !closure.contains(&to) {
                    stack.push(to);
                }
            }
        }
        closure
    }

    /// Whether the automaton accepts the whole of `input`.
    pub fn matches(&self, input: &str) -> bool {
        let mut current = self.epsilon_closure([Self::INITIAL]);
        for c in input.chars() {
            let moved = current.iter().flat_map(|&state| {
                self.edges(state)
                    .iter()
                    .filter(move |(label, _)| *label == Label::Char(c))
                    .map(|&(_, to)| to)
            });
            current = self.epsilon_closure(moved);
            if current.is_empty() {
                return false;
            }
        }
        current.contains(&Self::FINAL)
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            for from in self.states() {
                for &(label, to) in self.edges(from) {
                    match label {
                        Label::Epsilon => writeln!(f, "{} -> {} (eps)", from, to)?,
                        Label::Char(c) => writeln!(f, "{} -> {} ({})", from, to, escape_char(c))?,
                    }
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(s: &str) -> Nfa {
        let mut nfa = Nfa::new();
        let mut from = Nfa::INITIAL;
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            let to = if chars.peek().is_some() {
                nfa.add_state()
            } else {
                Nfa::FINAL
            };
            nfa.add_transition(from, Label::Char(c), to);
            from = to;
        }
        nfa
    }

    #[test]
    fn embed_remaps_inner_states() {
        let ab = literal("ab");
        let mut nfa = Nfa::new();
        let mid = nfa.add_state();
        nfa.embed(&ab, Nfa::INITIAL, mid);
        nfa.embed(&ab, mid, Nfa::FINAL);
        assert_eq!(nfa.len(), 5);
        assert!(nfa.matches("abab"));
        assert!(!nfa.matches("ab"));
        assert!(nfa.edges(Nfa::FINAL).is_empty());
    }

    #[test]
    fn epsilon_closure_follows_chains() {
        let mut nfa = Nfa::new();
        let a = nfa.add_state();
        let b = nfa.add_state();
        nfa.add_epsilon(Nfa::INITIAL, a);
        nfa.add_epsilon(a, b);
        nfa.add_transition(b, Label::Char('x'), Nfa::FINAL);
        let closure = nfa.epsilon_closure([Nfa::INITIAL]);
        assert_eq!(closure.into_iter().collect::<Vec<_>>(), [Nfa::INITIAL, a, b]);
        assert!(nfa.matches("x"));
    }
}
