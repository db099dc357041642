//! Shunting-style regex parser.
//!
//! `nodes` holds finished subtrees. `markers` records what joins them:
//! `String` means the top node is still to be appended to the
//! concatenation below it, `Alternation` separates the branches of a
//! `|`, and `Paren` bounds a group.

use super::{CharSet, Regex};
use std::str::CharIndices;

#[derive(Debug, thiserror::Error)]
#[error("{kind} at offset {position}")]
pub struct RegexSyntaxError {
    pub kind: RegexErrorKind,
    /// Byte offset into the pattern.
    pub position: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RegexErrorKind {
    #[error("escape at the end of the pattern")]
    DanglingEscape,

    #[error("unterminated character class")]
    UnterminatedClass,

    #[error("unmatched `]'")]
    UnmatchedBracket,

    #[error("empty character class")]
    EmptyClass,

    #[error("unmatched `)'")]
    UnmatchedParen,

    #[error("unclosed `('")]
    UnclosedGroup,

    #[error("nothing to repeat")]
    NothingToRepeat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Marker {
    String,
    Alternation,
    Paren,
}

#[derive(Debug, Default)]
struct Parser {
    nodes: Vec<Regex>,
    markers: Vec<Marker>,
    open_groups: Vec<usize>,
}

pub(super) fn parse(pattern: &str) -> Result<Regex, RegexSyntaxError> {
    let mut parser = Parser::default();
    parser.begin_group();

    let mut chars = pattern.char_indices();
    while let Some((pos, c)) = chars.next() {
        match c {
            '(' => {
                parser.concat();
                parser.begin_group();
                parser.open_groups.push(pos);
            }
            ')' => {
                if parser.open_groups.pop().is_none() {
                    return Err(error(RegexErrorKind::UnmatchedParen, pos));
                }
                parser.end_group();
            }
            '|' => parser.alternation(),
            '*' => parser.repeat(pos, |r| Regex::KleeneStar(Box::new(r)))?,
            '+' => parser.repeat(pos, |r| Regex::KleenePlus(Box::new(r)))?,
            '?' => parser.repeat(pos, |r| Regex::Optional(Box::new(r)))?,
            '.' => parser.chars(CharSet::all()),
            '[' => {
                let set = parse_class(&mut chars, pos)?;
                parser.chars(set);
            }
            ']' => return Err(error(RegexErrorKind::UnmatchedBracket, pos)),
            '\\' => {
                let (_, escaped) = chars
                    .next()
                    .ok_or_else(|| error(RegexErrorKind::DanglingEscape, pos))?;
                parser.chars(escape(escaped));
            }
            c => parser.chars(CharSet::single(c)),
        }
    }

    if let Some(&pos) = parser.open_groups.last() {
        return Err(error(RegexErrorKind::UnclosedGroup, pos));
    }
    parser.end_group();

    Ok(parser.pop_node())
}

fn error(kind: RegexErrorKind, position: usize) -> RegexSyntaxError {
    RegexSyntaxError { kind, position }
}

impl Parser {
    fn begin_group(&mut self) {
        self.markers.push(Marker::Paren);
        self.nodes.push(Regex::Concatenation(vec![]));
    }

    fn end_group(&mut self) {
        while let Some(marker) = self.markers.pop() {
            if marker == Marker::Paren {
                break;
            }
            self.reduce(marker);
        }
    }

    /// Fold a pending `String` marker so a new node can be appended.
    fn concat(&mut self) {
        while self.markers.last() == Some(&Marker::String) {
            self.markers.pop();
            self.reduce(Marker::String);
        }
        self.markers.push(Marker::String);
    }

    fn chars(&mut self, set: CharSet) {
        self.concat();
        self.nodes.push(Regex::Leaf(set));
    }

    fn alternation(&mut self) {
        while let Some(&marker) = self.markers.last() {
            if marker == Marker::Paren {
                break;
            }
            self.markers.pop();
            self.reduce(marker);
        }
        self.markers.push(Marker::Alternation);
        self.nodes.push(Regex::Concatenation(vec![]));
    }

    /// Wrap the most recent leaf or group in a postfix operator.
    fn repeat<F>(&mut self, pos: usize, op: F) -> Result<(), RegexSyntaxError>
    where
        F: FnOnce(Regex) -> Regex,
    {
        if self.markers.last() != Some(&Marker::String) {
            return Err(error(RegexErrorKind::NothingToRepeat, pos));
        }
        let node = self.pop_node();
        self.nodes.push(op(node));
        Ok(())
    }

    fn reduce(&mut self, marker: Marker) {
        let right = self.pop_node();
        let left = self.pop_node();
        let node = match (marker, left) {
            (Marker::Alternation, Regex::Alternation(mut branches)) => {
                branches.push(right);
                Regex::Alternation(branches)
            }
            (Marker::Alternation, left) => Regex::Alternation(vec![left, right]),
            (_, Regex::Concatenation(mut items)) => {
                items.push(right);
                Regex::Concatenation(items)
            }
            (_, left) => Regex::Concatenation(vec![left, right]),
        };
        self.nodes.push(node);
    }

    fn pop_node(&mut self) -> Regex {
        self.nodes
            .pop()
            .unwrap_or_else(|| Regex::Concatenation(vec![]))
    }
}

fn escape(c: char) -> CharSet {
    match c {
        'w' => CharSet::word(),
        'l' => CharSet::letter(),
        'd' => CharSet::digit(),
        's' => CharSet::space(),
        'n' => CharSet::single('\n'),
        't' => CharSet::single('\t'),
        c => CharSet::single(c),
    }
}

// `[abc]`, `[^\n]`; the opening bracket at `start` is already consumed.
fn parse_class(chars: &mut CharIndices<'_>, start: usize) -> Result<CharSet, RegexSyntaxError> {
    let mut set = CharSet::new();
    let mut negated = false;
    let mut first = true;
    loop {
        let (pos, c) = chars
            .next()
            .ok_or_else(|| error(RegexErrorKind::UnterminatedClass, start))?;
        match c {
            '^' if first => negated = true,
            ']' => break,
            '\\' => {
                let (_, escaped) = chars
                    .next()
                    .ok_or_else(|| error(RegexErrorKind::DanglingEscape, pos))?;
                set.union_with(&escape(escaped));
            }
            c => {
                set.insert(c);
            }
        }
        first = false;
    }

    if set.is_empty() {
        return Err(error(RegexErrorKind::EmptyClass, start));
    }
    Ok(if negated { set.complement() } else { set })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(c: char) -> Regex {
        Regex::Leaf(CharSet::single(c))
    }

    fn concat(items: Vec<Regex>) -> Regex {
        Regex::Concatenation(items)
    }

    #[test]
    fn star_binds_to_last_leaf() {
        let regex = parse("ab*").unwrap();
        assert_eq!(
            regex,
            concat(vec![leaf('a'), Regex::KleeneStar(Box::new(leaf('b')))])
        );
    }

    #[test]
    fn alternation_collects_branches() {
        let regex = parse("a|bc|d").unwrap();
        assert_eq!(
            regex,
            Regex::Alternation(vec![
                concat(vec![leaf('a')]),
                concat(vec![leaf('b'), leaf('c')]),
                concat(vec![leaf('d')]),
            ])
        );
    }

    #[test]
    fn groups_bound_alternation() {
        let regex = parse("(a|b)+c").unwrap();
        let group = Regex::Alternation(vec![concat(vec![leaf('a')]), concat(vec![leaf('b')])]);
        assert_eq!(
            regex,
            concat(vec![Regex::KleenePlus(Box::new(group)), leaf('c')])
        );
    }

    #[test]
    fn classes_and_escapes() {
        let regex = parse(r"[^\n]\.").unwrap();
        match regex {
            Regex::Concatenation(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], Regex::Leaf(CharSet::single('\n').complement()));
                assert_eq!(items[1], leaf('.'));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            parse("[a.]").unwrap(),
            concat(vec![Regex::Leaf(['a', '.'].into_iter().collect())])
        );
    }

    #[test]
    fn syntax_errors() {
        let cases = [
            ("[abc", RegexErrorKind::UnterminatedClass, 0),
            ("ab]", RegexErrorKind::UnmatchedBracket, 2),
            ("a[]", RegexErrorKind::EmptyClass, 1),
            ("a)", RegexErrorKind::UnmatchedParen, 1),
            ("(ab", RegexErrorKind::UnclosedGroup, 0),
            ("a\\", RegexErrorKind::DanglingEscape, 1),
            ("*a", RegexErrorKind::NothingToRepeat, 0),
            ("a|+", RegexErrorKind::NothingToRepeat, 2),
            ("(?)", RegexErrorKind::NothingToRepeat, 1),
        ];
        for (pattern, kind, position) in cases {
            let err = parse(pattern).unwrap_err();
            assert_eq!((err.kind, err.position), (kind, position), "{}", pattern);
        }
    }
}
