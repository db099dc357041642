//! Interned grammar symbols.

use crate::{types::Set, util::display_fn};
use std::fmt;

/// An opaque handle to a name registered in a [`SymbolTable`].
///
/// Handles are ordered by registration, so a symbol interned earlier always
/// compares less than one interned later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Symbol {
    raw: u32,
}

impl Symbol {
    /// The left-hand side of the augmented start rule.
    pub const START: Self = Self::new(0);

    /// The end of input.
    pub const EOF: Self = Self::new(1);

    /// The empty string. Only appears inside FIRST/FOLLOW sets.
    pub const EPSILON: Self = Self::new(2);

    const RESERVED: [&'static str; 3] = ["__START__", "__EOF__", "__EPSILON__"];

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }

    fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "too many symbols");
        Self::new(index as u32)
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self::new(raw)
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.raw
    }

    pub fn is_reserved(self) -> bool {
        (self.raw as usize) < Self::RESERVED.len()
    }

    pub fn display<'t>(self, table: &'t SymbolTable) -> impl fmt::Display + 't {
        display_fn(move |f| match table.name(self) {
            Some(name) => f.write_str(name),
            None => write!(f, "#{}", self.raw),
        })
    }
}

/// The registry mapping names to [`Symbol`] handles.
///
/// The table is owned by whoever drives the build and passed to every
/// component that creates symbols. Names are never removed.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    names: Set<Box<str>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut names = Set::default();
        for name in Symbol::RESERVED {
            names.insert(name.into());
        }
        Self { names }
    }

    /// Return the handle for `name`, registering it on first use.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(index) = self.names.get_index_of(name) {
            return Symbol::from_index(index);
        }
        let (index, _) = self.names.insert_full(name.into());
        Symbol::from_index(index)
    }

    /// Look up `name` without registering it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.names.get_index_of(name).map(Symbol::from_index)
    }

    pub fn name(&self, symbol: Symbol) -> Option<&str> {
        self.names.get_index(symbol.raw as usize).map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (Symbol::from_index(index), &**name))
    }
}
