//! LR(1) items and item sets.

use crate::grammar::{Grammar, SymbolSet};
use lrkit_runtime::{
    rule::RuleID,
    symbol::{Symbol, SymbolTable},
    util::display_fn,
};
use std::{collections::BTreeMap, fmt};

/// A rule with a marker position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCore {
    pub rule: RuleID,
    pub marker: usize,
}

impl ItemCore {
    pub fn new(rule: RuleID, marker: usize) -> Self {
        Self { rule, marker }
    }

    /// The symbol right after the marker.
    pub fn next_symbol(&self, g: &Grammar) -> Option<Symbol> {
        g.rule(self.rule)?.rhs().get(self.marker).copied()
    }

    /// The symbols following the next symbol.
    pub fn rest<'g>(&self, g: &'g Grammar) -> &'g [Symbol] {
        g.rule(self.rule)
            .and_then(|rule| rule.rhs().get(self.marker + 1..))
            .unwrap_or(&[])
    }

    pub fn is_finished(&self, g: &Grammar) -> bool {
        g.rule(self.rule)
            .map_or(true, |rule| self.marker >= rule.rhs().len())
    }

    /// The core with the marker moved over the next symbol.
    pub fn shifted(self) -> Self {
        Self {
            marker: self.marker + 1,
            ..self
        }
    }

    // `(A := B . C)`
    pub fn display<'a>(&'a self, g: &'a Grammar, symbols: &'a SymbolTable) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            let rule = g.rule(self.rule).ok_or(fmt::Error)?;
            write!(f, "({} :=", rule.lhs().display(symbols))?;
            for (i, symbol) in rule.rhs().iter().enumerate() {
                if i == self.marker {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbol.display(symbols))?;
            }
            if self.marker >= rule.rhs().len() {
                f.write_str(" .")?;
            }
            f.write_str(")")
        })
    }
}

/// An item core with its lookahead symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    pub core: ItemCore,
    pub lookahead: SymbolSet,
}

impl Item {
    pub fn new(rule: RuleID, marker: usize, lookahead: SymbolSet) -> Self {
        Self {
            core: ItemCore::new(rule, marker),
            lookahead,
        }
    }
}

/// A set of items in which items with the same core are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemSet {
    items: BTreeMap<ItemCore, SymbolSet>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `lookahead` to the item with `core`. Return whether the set changed.
    pub fn insert_core(&mut self, core: ItemCore, lookahead: &SymbolSet) -> bool {
        match self.items.get_mut(&core) {
            Some(existing) => existing.union_with(lookahead),
            None => {
                self.items.insert(core, lookahead.clone());
                true
            }
        }
    }

    pub fn insert(&mut self, item: Item) -> bool {
        self.insert_core(item.core, &item.lookahead)
    }

    pub fn union_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (core, lookahead) in other.iter() {
            changed |= self.insert_core(core, lookahead);
        }
        changed
    }

    pub fn get(&self, core: ItemCore) -> Option<&SymbolSet> {
        self.items.get(&core)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items ordered by rule and marker.
    pub fn iter(&self) -> impl Iterator<Item = (ItemCore, &SymbolSet)> + '_ {
        self.items.iter().map(|(core, lookahead)| (*core, lookahead))
    }

    pub fn display<'a>(&'a self, g: &'a Grammar, symbols: &'a SymbolTable) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            for (core, lookahead) in self.iter() {
                writeln!(
                    f,
                    "- {}  {}",
                    core.display(g, symbols),
                    lookahead.display(symbols)
                )?;
            }
            Ok(())
        })
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrkit_runtime::rule::Rule;

    #[test]
    fn items_with_equal_cores_merge() {
        let mut symbols = SymbolTable::new();
        let (s, a, b) = (symbols.intern("S"), symbols.intern("a"), symbols.intern("b"));
        let g = Grammar::new(vec![Rule::new(s, [a, b])], None, &symbols).unwrap();
        let rule = RuleID::from_raw(1);

        let mut set = ItemSet::new();
        assert!(set.insert(Item::new(rule, 1, [a].into_iter().collect())));
        assert!(set.insert(Item::new(rule, 1, [b].into_iter().collect())));
        assert!(!set.insert(Item::new(rule, 1, [a].into_iter().collect())));
        assert_eq!(set.len(), 1);

        let core = ItemCore::new(rule, 1);
        assert_eq!(core.next_symbol(&g), Some(b));
        assert!(core.rest(&g).is_empty());
        assert!(core.shifted().is_finished(&g));
        assert_eq!(core.display(&g, &symbols).to_string(), "(S := a . b)");
        assert_eq!(
            set.display(&g, &symbols).to_string(),
            "- (S := a . b)  {a, b}\n"
        );
    }
}
