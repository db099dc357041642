//! Regular expressions accepted by lexer rules.

mod charset;
mod parser;

pub use self::{
    charset::CharSet,
    parser::{RegexErrorKind, RegexSyntaxError},
};

use crate::automaton::{Label, Nfa};

/// A parsed regular expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// Any one character of the set.
    Leaf(CharSet),
    /// Each child in turn. Empty matches the empty string.
    Concatenation(Vec<Regex>),
    Alternation(Vec<Regex>),
    Optional(Box<Regex>),
    KleeneStar(Box<Regex>),
    KleenePlus(Box<Regex>),
}

impl Regex {
    pub fn parse(pattern: &str) -> Result<Self, RegexSyntaxError> {
        parser::parse(pattern)
    }

    /// Compile into an NFA by Thompson construction.
    pub fn to_nfa(&self) -> Nfa {
        let mut nfa = Nfa::new();
        match self {
            Self::Leaf(set) => {
                for c in set.iter() {
                    nfa.add_transition(Nfa::INITIAL, Label::Char(c), Nfa::FINAL);
                }
            }
            Self::Concatenation(items) if items.is_empty() => {
                nfa.add_epsilon(Nfa::INITIAL, Nfa::FINAL);
            }
            Self::Concatenation(items) => {
                let mut from = Nfa::INITIAL;
                for (i, item) in items.iter().enumerate() {
                    let to = if i + 1 == items.len() {
                        Nfa::FINAL
                    } else {
                        nfa.add_state()
                    };
                    nfa.embed(&item.to_nfa(), from, to);
                    from = to;
                }
            }
            Self::Alternation(branches) => {
                for branch in branches {
                    let start = nfa.add_state();
                    nfa.add_epsilon(Nfa::INITIAL, start);
                    nfa.embed(&branch.to_nfa(), start, Nfa::FINAL);
                }
            }
            Self::Optional(inner) => {
                nfa.embed(&inner.to_nfa(), Nfa::INITIAL, Nfa::FINAL);
                nfa.add_epsilon(Nfa::INITIAL, Nfa::FINAL);
            }
            Self::KleeneStar(inner) | Self::KleenePlus(inner) => {
                let start = nfa.add_state();
                let end = nfa.add_state();
                nfa.add_epsilon(Nfa::INITIAL, start);
                nfa.embed(&inner.to_nfa(), start, end);
                nfa.add_epsilon(end, start);
                nfa.add_epsilon(end, Nfa::FINAL);
                if matches!(self, Self::KleeneStar(..)) {
                    nfa.add_epsilon(Nfa::INITIAL, Nfa::FINAL);
                }
            }
        }
        nfa
    }
}

/// Escape every metacharacter so that `text` matches only itself.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '(' | ')' | '|' | '[' | ']' | '\\' | '+' | '*' | '?' | '.'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nfa(pattern: &str) -> Nfa {
        Regex::parse(pattern).unwrap().to_nfa()
    }

    #[test]
    fn thompson_construction() {
        let cases: &[(&str, &[&str], &[&str])] = &[
            ("abc", &["abc"], &["", "ab", "abcd"]),
            ("a|bc|", &["a", "bc", ""], &["b", "abc"]),
            ("ab?c", &["ac", "abc"], &["abbc"]),
            ("(ab)*", &["", "ab", "abab"], &["a", "aba"]),
            ("(a|b)+c", &["ac", "babc"], &["c", "ab"]),
            ("\\d+(\\.\\d+)?", &["1", "12.5"], &["1.", ".5"]),
            ("//[^\\n]*", &["//", "// x y"], &["// x\n"]),
            ("(a*)*", &["", "aaa"], &["b"]),
        ];
        for (pattern, accepted, rejected) in cases {
            let nfa = nfa(pattern);
            for input in *accepted {
                assert!(nfa.matches(input), "{} should match {:?}", pattern, input);
            }
            for input in *rejected {
                assert!(!nfa.matches(input), "{} should reject {:?}", pattern, input);
            }
        }
    }

    #[test]
    fn final_state_has_no_outgoing_edges() {
        for pattern in ["a", "a*", "(a|b)+", "a?", ""] {
            let nfa = nfa(pattern);
            assert!(nfa.edges(Nfa::FINAL).is_empty(), "{}", pattern);
            assert!(nfa
                .states()
                .all(|s| nfa.edges(s).iter().all(|&(_, to)| to != Nfa::INITIAL)));
        }
    }

    #[test]
    fn escaped_literals_match_themselves() {
        let text = "a+b*(c)|[d].e?\\";
        let nfa = nfa(&escape(text));
        assert!(nfa.matches(text));
        assert!(!nfa.matches("ab"));
    }
}
