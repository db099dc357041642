//! Canonical LR(1) automaton and parse table generation.

use crate::{
    grammar::Grammar,
    item::{Item, ItemCore, ItemSet},
    types::{Map, Queue, Set},
};
use lrkit_runtime::{
    definition::StateID,
    symbol::{Symbol, SymbolTable},
    table::ParsingTable,
    util::display_fn,
};
use std::{fmt, rc::Rc};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("the automaton exceeds the limit of {limit} states")]
    TooManyStates { limit: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    max_states: Option<usize>,
}

impl Config {
    pub const fn new() -> Self {
        Self { max_states: None }
    }

    /// Fail the construction once more than `limit` configurating sets exist.
    pub fn max_states(&mut self, limit: usize) -> &mut Self {
        self.max_states = Some(limit);
        self
    }

    pub fn unlimited(&mut self) -> &mut Self {
        self.max_states = None;
        self
    }
}

/// The canonical collection of LR(1) configurating sets.
#[derive(Debug)]
pub struct Automaton {
    states: Set<ItemSet>,
    edges: Vec<Map<Symbol, StateID>>,
}

impl Automaton {
    pub fn generate(g: &Grammar) -> Result<Self, BuildError> {
        Self::generate_with_config(g, &Config::new())
    }

    pub fn generate_with_config(g: &Grammar, config: &Config) -> Result<Self, BuildError> {
        let mut closures = ClosureExpander {
            grammar: g,
            memo: Map::default(),
        };

        let lookahead = g.follow(Symbol::START).cloned().unwrap_or_default();
        let kernel: ItemSet = [Item::new(Grammar::START_RULE, 0, lookahead)]
            .into_iter()
            .collect();

        let mut states: Set<ItemSet> = Set::default();
        states.insert(closures.close(&kernel));
        let mut edges = vec![Map::default()];

        let mut index = 0;
        while index < states.len() {
            for (symbol, kernel) in extract_transitions(g, &states[index]) {
                let (target, added) = states.insert_full(closures.close(&kernel));
                if added {
                    if let Some(limit) = config.max_states {
                        if states.len() > limit {
                            return Err(BuildError::TooManyStates { limit });
                        }
                    }
                    edges.push(Map::default());
                }
                edges[index].insert(symbol, StateID::from_index(target));
            }
            index += 1;
        }

        tracing::debug!(
            "LR(1) automaton: {} states ({} memoized closures)",
            states.len(),
            closures.memo.len()
        );
        Ok(Self { states, edges })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &ItemSet, &Map<Symbol, StateID>)> + '_ {
        self.states
            .iter()
            .zip(&self.edges)
            .enumerate()
            .map(|(i, (items, edges))| (StateID::from_index(i), items, edges))
    }

    /// Fill a parse table from the automaton. Colliding entries are kept
    /// as conflicts of the table, the last one written winning.
    pub fn to_table(&self, g: &Grammar, symbols: &SymbolTable) -> ParsingTable {
        let rules = g.rules().map(|(_, rule)| rule.clone()).collect();
        let mut table = ParsingTable::new(symbols.clone(), rules, self.len());

        for (state, items, edges) in self.states() {
            for (core, lookahead) in items.iter() {
                match core.next_symbol(g) {
                    None if core.rule == Grammar::START_RULE => {
                        table.set_accept(state, Symbol::EOF);
                    }
                    None => {
                        for symbol in lookahead.iter() {
                            table.set_reduce(state, symbol, core.rule);
                        }
                    }
                    Some(symbol) if g.is_terminal(symbol) => {
                        if let Some(&next) = edges.get(&symbol) {
                            table.set_shift(state, symbol, next);
                        }
                    }
                    Some(_) => {}
                }
            }
            for (&symbol, &next) in edges {
                if g.is_nonterminal(symbol) {
                    table.set_goto(state, symbol, next);
                }
            }
        }

        for conflict in table.conflicts() {
            tracing::warn!("{}", conflict.display(&table));
        }
        tracing::debug!(
            "parse table: {} states, {} conflicts",
            table.len(),
            table.conflicts().len()
        );
        table
    }

    pub fn display<'a>(&'a self, g: &'a Grammar, symbols: &'a SymbolTable) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            for (state, items, edges) in self.states() {
                if state.index() > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:02}", state)?;
                writeln!(f, "## items")?;
                write!(f, "{}", items.display(g, symbols))?;
                writeln!(f, "## edges")?;
                for (symbol, next) in edges {
                    writeln!(f, "- {} => {:02}", symbol.display(symbols), next)?;
                }
            }
            Ok(())
        })
    }
}

/// Computes item closures, remembering the closure of every item seen.
struct ClosureExpander<'g> {
    grammar: &'g Grammar,
    memo: Map<Item, Rc<ItemSet>>,
}

impl ClosureExpander<'_> {
    fn close(&mut self, kernel: &ItemSet) -> ItemSet {
        let mut closed = ItemSet::new();
        for (core, lookahead) in kernel.iter() {
            let item = Item {
                core,
                lookahead: lookahead.clone(),
            };
            closed.union_with(&self.close_item(item));
        }
        closed
    }

    fn close_item(&mut self, item: Item) -> Rc<ItemSet> {
        if let Some(closed) = self.memo.get(&item) {
            return closed.clone();
        }

        let g = self.grammar;
        let mut set = ItemSet::new();
        set.insert(item.clone());
        let mut pending: Queue<ItemCore> = [item.core].into_iter().collect();

        while let Some(core) = pending.pop() {
            let next = match core.next_symbol(g) {
                Some(next) if g.is_nonterminal(next) => next,
                _ => continue,
            };
            let mut lookahead = g.first_of(core.rest(g));
            if lookahead.remove(Symbol::EPSILON) {
                if let Some(inherited) = set.get(core) {
                    lookahead.union_with(inherited);
                }
            }
            for (rule, _) in g.rules_of(next) {
                let expanded = ItemCore::new(rule, 0);
                if set.insert_core(expanded, &lookahead) {
                    pending.push(expanded);
                }
            }
        }

        let set = Rc::new(set);
        self.memo.insert(item, set.clone());
        set
    }
}

/// Group the items by their next symbol, shifting the marker over it.
fn extract_transitions(g: &Grammar, items: &ItemSet) -> Map<Symbol, ItemSet> {
    let mut kernels: Map<Symbol, ItemSet> = Map::default();
    for (core, lookahead) in items.iter() {
        if let Some(symbol) = core.next_symbol(g) {
            kernels
                .entry(symbol)
                .or_default()
                .insert_core(core.shifted(), lookahead);
        }
    }
    kernels
}

/// Build the parse table of `g` with the default configuration.
pub fn build_table(g: &Grammar, symbols: &SymbolTable) -> Result<ParsingTable, BuildError> {
    Ok(Automaton::generate(g)?.to_table(g, symbols))
}
