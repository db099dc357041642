//! Production rules.

use crate::{
    symbol::{Symbol, SymbolTable},
    util::display_fn,
};
use std::{borrow::Borrow, fmt, ops::Deref};

/// An immutable sequence of symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolString {
    symbols: Vec<Symbol>,
}

impl SymbolString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out the symbols in `range`.
    pub fn slice<R>(&self, range: R) -> Self
    where
        R: std::slice::SliceIndex<[Symbol], Output = [Symbol]>,
    {
        Self {
            symbols: self.symbols[range].to_vec(),
        }
    }

    pub fn concat(&self, other: &[Symbol]) -> Self {
        let mut symbols = Vec::with_capacity(self.symbols.len() + other.len());
        symbols.extend_from_slice(&self.symbols);
        symbols.extend_from_slice(other);
        Self { symbols }
    }

    pub fn display<'t>(&'t self, table: &'t SymbolTable) -> impl fmt::Display + 't {
        display_fn(move |f| {
            crate::util::write_separated(f, self.symbols.iter().map(|s| s.display(table)), " ")
        })
    }
}

impl Deref for SymbolString {
    type Target = [Symbol];

    fn deref(&self) -> &Self::Target {
        &self.symbols[..]
    }
}

impl Borrow<[Symbol]> for SymbolString {
    fn borrow(&self) -> &[Symbol] {
        &self.symbols[..]
    }
}

impl From<Vec<Symbol>> for SymbolString {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }
}

impl From<&[Symbol]> for SymbolString {
    fn from(symbols: &[Symbol]) -> Self {
        Self {
            symbols: symbols.to_vec(),
        }
    }
}

impl<const N: usize> From<[Symbol; N]> for SymbolString {
    fn from(symbols: [Symbol; N]) -> Self {
        Self {
            symbols: symbols.to_vec(),
        }
    }
}

impl FromIterator<Symbol> for SymbolString {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u32,
}

impl RuleID {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u32 {
        self.raw
    }

    pub fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Display for RuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// How a child is attached to the node built by a reduction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum RuleOption {
    /// Keep the child, collapsing a node that has exactly one child.
    #[default]
    Default,
    /// Splice the child's children in its place.
    Unwrap,
    /// Keep the child as it is.
    Wrap,
    /// Drop the child.
    Discard,
}

impl RuleOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Unwrap => "unwrap",
            Self::Wrap => "wrap",
            Self::Discard => "discard",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "unwrap" => Some(Self::Unwrap),
            "wrap" => Some(Self::Wrap),
            "discard" => Some(Self::Discard),
            _ => None,
        }
    }
}

impl fmt::Display for RuleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A production `lhs := rhs` together with its tree-shaping annotations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    lhs: Symbol,
    rhs: SymbolString,
    options: Vec<RuleOption>,
    chained: bool,
    unwrap: bool,
}

impl Rule {
    /// Create a rule whose positions all use [`RuleOption::Default`].
    pub fn new(lhs: Symbol, rhs: impl Into<SymbolString>) -> Self {
        let rhs = rhs.into();
        Self {
            options: vec![RuleOption::Default; rhs.len()],
            lhs,
            rhs,
            chained: false,
            unwrap: false,
        }
    }

    /// Set the per-position options. Missing trailing positions stay `Default`.
    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = RuleOption>,
    {
        for (slot, option) in self.options.iter_mut().zip(options) {
            *slot = option;
        }
        self
    }

    /// Mark a left-recursive list rule whose nested occurrences are flattened.
    pub fn with_chained(mut self, chained: bool) -> Self {
        self.chained = chained;
        self
    }

    /// Reductions of a single-symbol rule leave the child in place instead
    /// of creating a node.
    pub fn with_unwrap(mut self, unwrap: bool) -> Self {
        self.unwrap = unwrap;
        self
    }

    pub fn lhs(&self) -> Symbol {
        self.lhs
    }

    pub fn rhs(&self) -> &SymbolString {
        &self.rhs
    }

    pub fn options(&self) -> &[RuleOption] {
        &self.options
    }

    pub fn is_chained(&self) -> bool {
        self.chained
    }

    pub fn unwraps_single(&self) -> bool {
        self.unwrap
    }

    /// Whether this is an epsilon production.
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    // `"LHS := R1 R2 R3"`
    pub fn display<'t>(&'t self, table: &'t SymbolTable) -> impl fmt::Display + 't {
        display_fn(move |f| {
            write!(f, "{} :=", self.lhs.display(table))?;
            for symbol in self.rhs.iter() {
                write!(f, " {}", symbol.display(table))?;
            }
            Ok(())
        })
    }
}
