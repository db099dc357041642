//! Maximal-munch lexer driven by a DFA.

use crate::{
    automaton::{Dfa, MultiAcceptNfa},
    regex::{self, Regex, RegexSyntaxError},
    types::Set,
};
use lrkit_runtime::{
    symbol::{Symbol, SymbolTable},
    token::Token,
};

/// What the lexer does at a position where no rule matches.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop with a [`LexError`].
    #[default]
    Strict,
    /// Drop the offending character and continue after it.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no rule matches {found:?} at offset {position}")]
pub struct LexError {
    /// Byte offset into the input.
    pub position: usize,
    pub found: char,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LexerDefError {
    #[error("invalid pattern for rule `{rule}'")]
    Regex {
        rule: String,
        #[source]
        source: RegexSyntaxError,
    },
}

/// A tokenizer compiled from an ordered list of rules.
#[derive(Debug, Clone)]
pub struct Lexer {
    dfa: Dfa,
    ignored: Set<Symbol>,
    policy: ErrorPolicy,
}

impl Lexer {
    /// Define a lexer by declaring its rules in priority order.
    pub fn define<F>(symbols: &mut SymbolTable, f: F) -> Result<Self, LexerDefError>
    where
        F: FnOnce(&mut LexerDef<'_>) -> Result<(), LexerDefError>,
    {
        let mut def = LexerDef {
            symbols,
            nfa: MultiAcceptNfa::new(),
            ignored: Set::default(),
        };
        f(&mut def)?;
        tracing::debug!("compiling {} lexer rules", def.nfa.len());
        Ok(Self {
            dfa: def.nfa.to_dfa(),
            ignored: def.ignored,
            policy: ErrorPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn is_ignored(&self, symbol: Symbol) -> bool {
        self.ignored.contains(&symbol)
    }

    /// Iterate over the tokens of `text`, ending with the end-of-input token.
    pub fn tokens<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            lexer: self,
            text,
            pos: 0,
            done: false,
        }
    }

    pub fn lex(&self, text: &str) -> Result<Vec<Token>, LexError> {
        self.tokens(text).collect()
    }

    // The symbol and byte length of the longest match at the start of `input`.
    fn longest_match(&self, input: &str) -> Option<(Symbol, usize)> {
        let mut state = Dfa::INITIAL;
        let mut last = None;
        for (offset, c) in input.char_indices() {
            state = match self.dfa.step(state, c) {
                Some(next) => next,
                None => break,
            };
            if let Some(symbol) = self.dfa.accepted(state) {
                last = Some((symbol, offset + c.len_utf8()));
            }
        }
        last
    }
}

/// The rules of a lexer under construction.
#[derive(Debug)]
pub struct LexerDef<'a> {
    symbols: &'a mut SymbolTable,
    nfa: MultiAcceptNfa,
    ignored: Set<Symbol>,
}

impl LexerDef<'_> {
    /// Add a rule emitting tokens named `name`.
    pub fn rule(&mut self, name: &str, pattern: &str) -> Result<Symbol, LexerDefError> {
        let regex = Regex::parse(pattern).map_err(|source| LexerDefError::Regex {
            rule: name.to_owned(),
            source,
        })?;
        let symbol = self.symbols.intern(name);
        self.nfa.add_rule(symbol, &regex.to_nfa());
        Ok(symbol)
    }

    /// Add a rule whose matches are consumed without producing tokens.
    pub fn ignored(&mut self, name: &str, pattern: &str) -> Result<Symbol, LexerDefError> {
        let symbol = self.rule(name, pattern)?;
        self.ignored.insert(symbol);
        Ok(symbol)
    }

    /// Add a rule matching exactly `text`, named after it.
    pub fn literal(&mut self, text: &str) -> Result<Symbol, LexerDefError> {
        self.rule(text, &regex::escape(text))
    }
}

/// The iterator returned by [`Lexer::tokens`].
#[derive(Debug)]
pub struct Tokens<'a> {
    lexer: &'a Lexer,
    text: &'a str,
    pos: usize,
    done: bool,
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let rest = &self.text[self.pos..];
            let found = match rest.chars().next() {
                Some(c) => c,
                None => {
                    self.done = true;
                    return Some(Ok(Token::eof(self.text.len())));
                }
            };

            match self.lexer.longest_match(rest) {
                Some((symbol, len)) => {
                    let start = self.pos;
                    self.pos += len;
                    if self.lexer.is_ignored(symbol) {
                        continue;
                    }
                    let token = Token::new(symbol, &self.text[start..self.pos], start, self.pos);
                    tracing::trace!("token {:?} at {}..{}", token.text, start, self.pos);
                    return Some(Ok(token));
                }
                None => match self.lexer.policy {
                    ErrorPolicy::Strict => {
                        self.done = true;
                        return Some(Err(LexError {
                            position: self.pos,
                            found,
                        }));
                    }
                    ErrorPolicy::Skip => {
                        tracing::warn!("skipping {:?} at offset {}", found, self.pos);
                        self.pos += found.len_utf8();
                    }
                },
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}
