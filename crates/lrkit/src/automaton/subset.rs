//! Subset construction over the union of all lexer rules.

use super::{Dfa, Label, Nfa, StateID};
use crate::types::{Map, Set};
use lrkit_runtime::symbol::Symbol;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// The NFAs of several lexer rules joined under one initial state.
///
/// Each rule's final state accepts the rule's symbol. When a DFA state
/// contains the final states of several rules, the rule added first wins.
#[derive(Debug, Clone, Default)]
pub struct MultiAcceptNfa {
    nfa: Nfa,
    // final state -> (priority, symbol)
    accepting: Map<StateID, (usize, Symbol)>,
}

/// A DFA state: an epsilon-closed set of NFA states plus what it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClosureKey {
    states: Vec<StateID>,
    accepted: Option<Symbol>,
}

impl MultiAcceptNfa {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of rules added so far.
    pub fn len(&self) -> usize {
        self.accepting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepting.is_empty()
    }

    /// Add the automaton of a rule recognizing `symbol`, at the lowest
    /// priority so far.
    pub fn add_rule(&mut self, symbol: Symbol, nfa: &Nfa) {
        let start = self.nfa.add_state();
        let end = self.nfa.add_state();
        self.nfa.embed(nfa, start, end);
        self.nfa.add_epsilon(Nfa::INITIAL, start);
        let priority = self.accepting.len();
        self.accepting.insert(end, (priority, symbol));
    }

    fn closure<I>(&self, states: I) -> ClosureKey
    where
        I: IntoIterator<Item = StateID>,
    {
        let states = self.nfa.epsilon_closure(states);
        let accepted = states
            .iter()
            .filter_map(|state| self.accepting.get(state))
            .min_by_key(|(priority, _)| *priority)
            .map(|&(_, symbol)| symbol);
        ClosureKey {
            states: states.into_iter().collect(),
            accepted,
        }
    }

    pub fn to_dfa(&self) -> Dfa {
        let mut keys: Set<ClosureKey> = Set::default();
        keys.insert(self.closure([Nfa::INITIAL]));
        let mut transitions = vec![BTreeMap::new()];
        let mut accepting = Map::default();
        let mut queue = VecDeque::from([0]);

        while let Some(index) = queue.pop_front() {
            let mut moves: BTreeMap<char, BTreeSet<StateID>> = BTreeMap::new();
            if let Some(key) = keys.get_index(index) {
                for &state in &key.states {
                    for &(label, to) in self.nfa.edges(state) {
                        if let Label::Char(c) = label {
                            moves.entry(c).or_default().insert(to);
                        }
                    }
                }
            }

            for (c, targets) in moves {
                let key = self.closure(targets);
                let accepted = key.accepted;
                let (target, added) = keys.insert_full(key);
                if added {
                    if let Some(symbol) = accepted {
                        accepting.insert(StateID::from_index(target), symbol);
                    }
                    transitions.push(BTreeMap::new());
                    queue.push_back(target);
                }
                transitions[index].insert(c, StateID::from_index(target));
            }
        }

        tracing::debug!(
            "subset construction: {} NFA states -> {} DFA states",
            self.nfa.len(),
            transitions.len()
        );
        Dfa::from_parts(transitions, accepting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::Regex;
    use lrkit_runtime::symbol::SymbolTable;

    fn build(rules: &[(&str, &str)]) -> (SymbolTable, Dfa) {
        let mut symbols = SymbolTable::new();
        let mut nfa = MultiAcceptNfa::new();
        for (name, pattern) in rules {
            let symbol = symbols.intern(name);
            nfa.add_rule(symbol, &Regex::parse(pattern).unwrap().to_nfa());
        }
        (symbols, nfa.to_dfa())
    }

    #[test]
    fn earlier_rule_wins_ties() {
        let (symbols, dfa) = build(&[("if", "if"), ("ident", "\\l+")]);
        let keyword = symbols.get("if");
        let ident = symbols.get("ident");
        assert_eq!(dfa.matches("if"), keyword);
        assert_eq!(dfa.matches("i"), ident);
        assert_eq!(dfa.matches("iff"), ident);
        assert_eq!(dfa.matches("if1"), None);
    }

    #[test]
    fn initial_state_never_accepts() {
        let (symbols, dfa) = build(&[("as", "a*")]);
        assert_eq!(dfa.accepted(Dfa::INITIAL), None);
        assert_eq!(dfa.matches(""), None);
        assert_eq!(dfa.matches("aaa"), symbols.get("as"));
    }

    #[test]
    fn equal_closures_share_a_state() {
        let (_, dfa) = build(&[("ab", "(a|b)*c")]);
        let after_a = dfa.step(Dfa::INITIAL, 'a').unwrap();
        let after_b = dfa.step(Dfa::INITIAL, 'b').unwrap();
        assert_eq!(after_a, after_b);
        assert_eq!(dfa.step(after_a, 'a'), Some(after_a));
        assert!(dfa.display(&SymbolTable::new()).to_string().contains("state 0:"));
    }
}
