//! Context-free grammars and their FIRST/FOLLOW analysis.

use crate::types::{Map, Set};
use bit_set::BitSet;
use bit_vec::BitVec;
use lrkit_runtime::{
    rule::{Rule, RuleID, SymbolString},
    symbol::{Symbol, SymbolTable},
    util::{display_fn, write_separated},
};
use std::{cell::RefCell, cmp::Ordering, fmt, hash::Hash};

/// A set of symbols keyed by their ids.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    inner: BitSet,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.inner.contains(symbol.into_raw() as usize)
    }

    pub fn insert(&mut self, symbol: Symbol) -> bool {
        self.inner.insert(symbol.into_raw() as usize)
    }

    pub fn remove(&mut self, symbol: Symbol) -> bool {
        self.inner.remove(symbol.into_raw() as usize)
    }

    /// Add every symbol of `other`. Return whether anything was added.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// The symbols in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.inner.iter().map(|raw| Symbol::from_raw(raw as u32))
    }

    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            f.write_str("{")?;
            write_separated(f, self.iter().map(|s| s.display(symbols)), ", ")?;
            f.write_str("}")
        })
    }
}

// The backing bit vector may carry trailing zero blocks, so compare by members.
impl PartialEq for SymbolSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for SymbolSet {}

impl Hash for SymbolSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for symbol in self.iter() {
            symbol.hash(state);
        }
    }
}

impl PartialOrd for SymbolSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SymbolSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl FromIterator<Symbol> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|s| s.into_raw() as usize).collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GrammarError {
    #[error("the grammar has no rules")]
    Empty,

    #[error("no rule defines the start symbol `{name}'")]
    UndefinedStart { name: String },

    #[error("reserved symbol `{name}' used as a left-hand side")]
    ReservedLhs { name: String },

    #[error("reserved symbol `{name}' used in a right-hand side")]
    ReservedRhs { name: String },
}

/// An augmented context-free grammar.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
    start: Symbol,
    rules_by_lhs: Map<Symbol, Vec<RuleID>>,
    terminals: Set<Symbol>,
    nonterminals: Set<Symbol>,
    nullable: BitVec,
    first: Map<Symbol, SymbolSet>,
    follow: Map<Symbol, SymbolSet>,
    first_cache: RefCell<Map<SymbolString, SymbolSet>>,
    follow_cache: RefCell<Map<SymbolString, SymbolSet>>,
}

impl Grammar {
    /// The synthetic rule `__START__ := <start symbol>`.
    pub const START_RULE: RuleID = RuleID::from_raw(0);

    /// Augment `rules` and compute the FIRST/FOLLOW sets.
    ///
    /// The start symbol defaults to the left-hand side of the first rule.
    /// `symbols` is only consulted to name the offending symbol of an error.
    pub fn new<I>(
        rules: I,
        start: Option<Symbol>,
        symbols: &SymbolTable,
    ) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let user_rules: Vec<Rule> = rules.into_iter().collect();
        let start = match start {
            Some(start) => start,
            None => user_rules.first().ok_or(GrammarError::Empty)?.lhs(),
        };
        if user_rules.is_empty() {
            return Err(GrammarError::Empty);
        }
        let name = |symbol: Symbol| symbol.display(symbols).to_string();
        for rule in &user_rules {
            if rule.lhs().is_reserved() {
                return Err(GrammarError::ReservedLhs {
                    name: name(rule.lhs()),
                });
            }
            if let Some(&symbol) = rule.rhs().iter().find(|s| s.is_reserved()) {
                return Err(GrammarError::ReservedRhs { name: name(symbol) });
            }
        }
        if !user_rules.iter().any(|rule| rule.lhs() == start) {
            return Err(GrammarError::UndefinedStart { name: name(start) });
        }

        let mut rules = Vec::with_capacity(user_rules.len() + 1);
        rules.push(Rule::new(Symbol::START, [start]));
        rules.extend(user_rules);

        let mut rules_by_lhs: Map<Symbol, Vec<RuleID>> = Map::default();
        for (i, rule) in rules.iter().enumerate() {
            rules_by_lhs
                .entry(rule.lhs())
                .or_default()
                .push(RuleID::from_raw(i as u32));
        }

        let nonterminals: Set<Symbol> = rules_by_lhs.keys().copied().collect();
        let mut terminals: Set<Symbol> = Set::default();
        terminals.insert(Symbol::EOF);
        for rule in &rules {
            for &symbol in rule.rhs().iter() {
                if !nonterminals.contains(&symbol) {
                    terminals.insert(symbol);
                }
            }
        }

        let max_id = terminals
            .iter()
            .chain(nonterminals.iter())
            .map(|s| s.into_raw() as usize)
            .max()
            .unwrap_or(0);

        let mut first = Map::default();
        let mut follow = Map::default();
        for &symbol in terminals.iter().chain(nonterminals.iter()) {
            let initial = if terminals.contains(&symbol) {
                SymbolSet::from_iter([symbol])
            } else {
                SymbolSet::new()
            };
            first.insert(symbol, initial);
            follow.insert(symbol, SymbolSet::new());
        }
        if let Some(set) = follow.get_mut(&Symbol::START) {
            set.insert(Symbol::EOF);
        }

        let mut grammar = Self {
            rules,
            start,
            rules_by_lhs,
            terminals,
            nonterminals,
            nullable: BitVec::from_elem(max_id + 1, false),
            first,
            follow,
            first_cache: RefCell::default(),
            follow_cache: RefCell::default(),
        };

        let mut passes = 1;
        while grammar.update_sets() {
            passes += 1;
        }
        tracing::debug!(
            "grammar: {} rules, {} terminals, {} nonterminals, FIRST/FOLLOW converged after {} passes",
            grammar.rules.len(),
            grammar.terminals.len(),
            grammar.nonterminals.len(),
            passes
        );

        Ok(grammar)
    }

    /// Run one pass of the FIRST/FOLLOW/nullable fixpoint over every rule.
    /// Return whether any set grew.
    pub fn update_sets(&mut self) -> bool {
        let mut changed = false;
        for rule in &self.rules {
            let lhs = rule.lhs();

            let mut head = SymbolSet::new();
            let mut all_nullable = true;
            for &symbol in rule.rhs().iter() {
                if let Some(set) = self.first.get(&symbol) {
                    head.union_with(set);
                }
                if !bit(&self.nullable, symbol) {
                    all_nullable = false;
                    break;
                }
            }
            head.remove(Symbol::EPSILON);
            if all_nullable {
                head.insert(Symbol::EPSILON);
                if !bit(&self.nullable, lhs) {
                    self.nullable.set(lhs.into_raw() as usize, true);
                    changed = true;
                }
            }
            if let Some(set) = self.first.get_mut(&lhs) {
                changed |= set.union_with(&head);
            }

            let mut trailer = self.follow.get(&lhs).cloned().unwrap_or_default();
            for &symbol in rule.rhs().iter().rev() {
                if self.nonterminals.contains(&symbol) {
                    if let Some(set) = self.follow.get_mut(&symbol) {
                        changed |= set.union_with(&trailer);
                    }
                }
                let mut first = self.first.get(&symbol).cloned().unwrap_or_default();
                first.remove(Symbol::EPSILON);
                if bit(&self.nullable, symbol) {
                    trailer.union_with(&first);
                } else {
                    trailer = first;
                }
            }
        }
        changed
    }

    pub fn start_symbol(&self) -> Symbol {
        self.start
    }

    /// All rules, the synthetic start rule first.
    pub fn rules(&self) -> impl Iterator<Item = (RuleID, &Rule)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (RuleID::from_raw(i as u32), rule))
    }

    pub fn rule(&self, id: RuleID) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    /// The rules whose left-hand side is `lhs`.
    pub fn rules_of(&self, lhs: Symbol) -> impl Iterator<Item = (RuleID, &Rule)> + '_ {
        self.rules_by_lhs
            .get(&lhs)
            .into_iter()
            .flatten()
            .map(move |&id| (id, &self.rules[id.index()]))
    }

    pub fn terminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.terminals.iter().copied()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.nonterminals.iter().copied()
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        self.terminals.contains(&symbol)
    }

    pub fn is_nonterminal(&self, symbol: Symbol) -> bool {
        self.nonterminals.contains(&symbol)
    }

    pub fn is_nullable(&self, symbol: Symbol) -> bool {
        bit(&self.nullable, symbol)
    }

    /// FIRST of one symbol; contains epsilon iff the symbol is nullable.
    pub fn first(&self, symbol: Symbol) -> Option<&SymbolSet> {
        self.first.get(&symbol)
    }

    pub fn follow(&self, symbol: Symbol) -> Option<&SymbolSet> {
        self.follow.get(&symbol)
    }

    /// FIRST of a symbol string. Contains epsilon iff every symbol is nullable.
    pub fn first_of(&self, string: &[Symbol]) -> SymbolSet {
        if let Some(cached) = self.first_cache.borrow().get(string) {
            return cached.clone();
        }

        let mut result = SymbolSet::new();
        let mut all_nullable = true;
        for &symbol in string {
            if let Some(set) = self.first.get(&symbol) {
                result.union_with(set);
            }
            if !self.is_nullable(symbol) {
                all_nullable = false;
                break;
            }
        }
        result.remove(Symbol::EPSILON);
        if all_nullable {
            result.insert(Symbol::EPSILON);
        }

        self.first_cache
            .borrow_mut()
            .insert(SymbolString::from(string), result.clone());
        result
    }

    /// FOLLOW of the last symbol, extended leftwards while symbols are nullable.
    /// Epsilon is included when the walk runs off the front of the string, so
    /// the empty string yields `{epsilon}`.
    pub fn follow_of(&self, string: &[Symbol]) -> SymbolSet {
        let (&last, rest) = match string.split_last() {
            Some(split) => split,
            None => return SymbolSet::from_iter([Symbol::EPSILON]),
        };
        if let Some(cached) = self.follow_cache.borrow().get(string) {
            return cached.clone();
        }

        let mut result = self.follow.get(&last).cloned().unwrap_or_default();
        if self.is_nullable(last) {
            result.union_with(&self.follow_of(rest));
        }

        self.follow_cache
            .borrow_mut()
            .insert(SymbolString::from(string), result.clone());
        result
    }

    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            f.write_str("## terminals:\n")?;
            for terminal in self.terminals() {
                writeln!(f, "- {}", terminal.display(symbols))?;
            }

            f.write_str("\n## nonterminals:\n")?;
            for nonterminal in self.nonterminals() {
                write!(f, "- {}", nonterminal.display(symbols))?;
                if self.is_nullable(nonterminal) {
                    f.write_str(" (nullable)")?;
                }
                if let Some(first) = self.first(nonterminal) {
                    write!(f, " first={}", first.display(symbols))?;
                }
                if let Some(follow) = self.follow(nonterminal) {
                    write!(f, " follow={}", follow.display(symbols))?;
                }
                f.write_str("\n")?;
            }

            f.write_str("\n## rules:\n")?;
            for (id, rule) in self.rules() {
                writeln!(f, "- [{:02}] {}", id, rule.display(symbols))?;
            }
            Ok(())
        })
    }
}

fn bit(bits: &BitVec, symbol: Symbol) -> bool {
    bits.get(symbol.into_raw() as usize).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        symbols: SymbolTable,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                symbols: SymbolTable::new(),
            }
        }

        fn sym(&mut self, name: &str) -> Symbol {
            self.symbols.intern(name)
        }

        fn rule(&mut self, lhs: &str, rhs: &[&str]) -> Rule {
            let lhs = self.sym(lhs);
            let rhs: SymbolString = rhs.iter().map(|name| self.sym(name)).collect();
            Rule::new(lhs, rhs)
        }

        fn set(&mut self, names: &[&str]) -> SymbolSet {
            names.iter().map(|name| self.sym(name)).collect()
        }
    }

    #[test]
    fn nullable_list() {
        let mut fx = Fixture::new();
        let rules = vec![
            fx.rule("S", &["A"]),
            fx.rule("A", &["a", "A"]),
            fx.rule("A", &[]),
        ];
        let mut g = Grammar::new(rules, None, &fx.symbols).unwrap();
        let (s, a) = (fx.sym("S"), fx.sym("A"));

        assert!(g.is_nullable(a));
        assert!(g.is_nullable(s));
        assert_eq!(g.first(a), Some(&fx.set(&["a", "__EPSILON__"])));
        assert_eq!(g.follow(s), Some(&fx.set(&["__EOF__"])));
        let follow_a = g.follow(a).unwrap();
        assert!(g.follow(s).unwrap().iter().all(|t| follow_a.contains(t)));

        assert!(!g.update_sets());
    }

    #[test]
    fn expression_sets() {
        let mut fx = Fixture::new();
        let rules = vec![
            fx.rule("E", &["E", "+", "T"]),
            fx.rule("E", &["T"]),
            fx.rule("T", &["T", "*", "F"]),
            fx.rule("T", &["F"]),
            fx.rule("F", &["(", "E", ")"]),
            fx.rule("F", &["id"]),
        ];
        let g = Grammar::new(rules, None, &fx.symbols).unwrap();
        let (e, t) = (fx.sym("E"), fx.sym("T"));

        assert_eq!(g.start_symbol(), e);
        assert_eq!(g.first(e), Some(&fx.set(&["(", "id"])));
        assert_eq!(g.follow(e), Some(&fx.set(&["__EOF__", "+", ")"])));
        assert_eq!(g.follow(t), Some(&fx.set(&["__EOF__", "+", "*", ")"])));
        assert!(g.is_terminal(Symbol::EOF));
        assert!(!g.is_nullable(e));
    }

    #[test]
    fn string_sets() {
        let mut fx = Fixture::new();
        let rules = vec![
            fx.rule("S", &["A", "B", "c"]),
            fx.rule("A", &["a"]),
            fx.rule("A", &[]),
            fx.rule("B", &["b"]),
            fx.rule("B", &[]),
        ];
        let g = Grammar::new(rules, None, &fx.symbols).unwrap();
        let (a, b, c) = (fx.sym("A"), fx.sym("B"), fx.sym("c"));

        assert_eq!(g.first_of(&[]), fx.set(&["__EPSILON__"]));
        assert_eq!(g.first_of(&[a, b]), fx.set(&["a", "b", "__EPSILON__"]));
        assert_eq!(g.first_of(&[a, b, c]), fx.set(&["a", "b", "c"]));
        assert_eq!(g.first_of(&[a, b, c]), fx.set(&["a", "b", "c"]));

        assert_eq!(g.follow_of(&[]), fx.set(&["__EPSILON__"]));
        assert_eq!(g.follow_of(&[Symbol::START]), fx.set(&["__EOF__"]));
        assert_eq!(g.follow_of(&[b]), fx.set(&["c", "__EPSILON__"]));
        assert_eq!(g.follow_of(&[a]), fx.set(&["b", "c", "__EPSILON__"]));
        assert_eq!(g.follow_of(&[a, b]), fx.set(&["b", "c", "__EPSILON__"]));
    }

    #[test]
    fn invalid_grammars() {
        let mut fx = Fixture::new();
        assert!(matches!(
            Grammar::new(vec![], None, &fx.symbols),
            Err(GrammarError::Empty)
        ));

        let rules = vec![fx.rule("S", &["a"])];
        let missing = fx.sym("T");
        let err = Grammar::new(rules, Some(missing), &fx.symbols).unwrap_err();
        assert!(
            matches!(&err, GrammarError::UndefinedStart { name } if name == "T"),
            "{:?}",
            err
        );
        assert_eq!(err.to_string(), "no rule defines the start symbol `T'");

        let rules = vec![fx.rule("S", &["__EOF__"])];
        let err = Grammar::new(rules, None, &fx.symbols).unwrap_err();
        assert_eq!(
            err.to_string(),
            "reserved symbol `__EOF__' used in a right-hand side"
        );

        let rules = vec![fx.rule("__START__", &["a"])];
        let err = Grammar::new(rules, None, &fx.symbols).unwrap_err();
        assert!(
            matches!(&err, GrammarError::ReservedLhs { name } if name == "__START__"),
            "{:?}",
            err
        );
    }

    #[test]
    fn symbol_set_equality_ignores_capacity() {
        let mut big = SymbolSet::new();
        big.insert(Symbol::from_raw(200));
        big.remove(Symbol::from_raw(200));
        big.insert(Symbol::from_raw(3));
        let small: SymbolSet = [Symbol::from_raw(3)].into_iter().collect();
        assert_eq!(big, small);
        assert!(!big.clone().union_with(&small));
    }
}
