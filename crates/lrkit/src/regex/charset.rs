//! Character sets labelling the leaves of a regex.

use std::collections::BTreeSet;

/// A finite set of characters labelling a leaf of a regex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    chars: BTreeSet<char>,
}

impl CharSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(c: char) -> Self {
        Self {
            chars: BTreeSet::from([c]),
        }
    }

    /// Every character the lexer can see: printable ASCII plus tab, newline
    /// and carriage return.
    pub fn all() -> Self {
        let mut chars: BTreeSet<char> = (' '..='~').collect();
        chars.extend(['\t', '\n', '\r']);
        Self { chars }
    }

    /// `\l`
    pub fn letter() -> Self {
        Self {
            chars: ('a'..='z').chain('A'..='Z').collect(),
        }
    }

    /// `\d`
    pub fn digit() -> Self {
        Self {
            chars: ('0'..='9').collect(),
        }
    }

    /// `\w`
    pub fn word() -> Self {
        let mut set = Self::letter();
        set.union_with(&Self::digit());
        set.insert('_');
        set
    }

    /// `\s`
    pub fn space() -> Self {
        Self {
            chars: BTreeSet::from([' ', '\t', '\n', '\r']),
        }
    }

    /// The characters of [`CharSet::all`] missing from this set.
    pub fn complement(&self) -> Self {
        Self {
            chars: Self::all().chars.difference(&self.chars).copied().collect(),
        }
    }

    pub fn insert(&mut self, c: char) -> bool {
        self.chars.insert(c)
    }

    pub fn union_with(&mut self, other: &Self) {
        self.chars.extend(other.chars.iter().copied());
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }
}

impl FromIterator<char> for CharSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self {
            chars: iter.into_iter().collect(),
        }
    }
}
