//! Table-driven shift/reduce parser.

use crate::{
    definition::{Entry, ParseTable, StateID},
    rule::{Rule, RuleID, RuleOption},
    symbol::Symbol,
    token::Token,
    tree::{Node, SyntaxTree},
};

/// The parser driven by a generated parse table.
#[derive(Debug)]
pub struct LRParser<T> {
    table: T,
}

impl<T> LRParser<T>
where
    T: ParseTable,
{
    /// Create an instance of `LRParser` using the specified parse table.
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Begin a parse that is fed one token at a time.
    pub fn start(&self) -> Parse<'_, T> {
        Parse {
            table: &self.table,
            state_stack: vec![self.table.initial_state()],
            node_stack: vec![],
            accepted: false,
        }
    }

    /// Parse a complete token sequence, which must end with the EOF token.
    pub fn parse_tokens<I>(&self, tokens: I) -> Result<Node, ParseError>
    where
        I: IntoIterator<Item = Token>,
    {
        let span = tracing::trace_span!("parse_tokens");
        let _entered = span.enter();

        let mut parse = self.start();
        for token in tokens {
            parse.process(token)?;
        }
        parse.finish()
    }
}

/// An in-progress parse.
#[derive(Debug)]
pub struct Parse<'p, T> {
    table: &'p T,
    state_stack: Vec<StateID>,
    node_stack: Vec<Node>,
    accepted: bool,
}

impl<'p, T> Parse<'p, T>
where
    T: ParseTable,
{
    pub fn is_finished(&self) -> bool {
        self.accepted
    }

    /// The symbols acceptable as the next token.
    pub fn expected(&self) -> Vec<Symbol> {
        match self.state_stack.last() {
            Some(&state) => self.table.expected(state),
            None => vec![],
        }
    }

    /// Feed one token, performing every reduction it triggers.
    pub fn process(&mut self, token: Token) -> Result<(), ParseError> {
        if self.accepted {
            return Err(ParseError::AlreadyAccepted {
                found: self.name(token.symbol),
            });
        }

        loop {
            let current = *self
                .state_stack
                .last()
                .ok_or(ParseError::EmptyStateStack)?;

            match self.table.entry(current, token.symbol) {
                Some(Entry::Shift(next)) => {
                    tracing::trace!("shift {} -> state {}", self.name(token.symbol), next);
                    self.state_stack.push(next);
                    self.node_stack.push(Node::Token(token));
                    return Ok(());
                }
                Some(Entry::Accept) => {
                    tracing::trace!("accept");
                    self.accepted = true;
                    return Ok(());
                }
                Some(Entry::Reduce(id)) => self.reduce(id)?,
                Some(Entry::Goto(..)) | None => {
                    let expected = self.table.expected(current);
                    return Err(ParseError::UnexpectedToken {
                        state: current,
                        found: self.name(token.symbol),
                        expected: expected.into_iter().map(|s| self.name(s)).collect(),
                        token,
                    });
                }
            }
        }
    }

    /// Return the syntax tree of an accepted parse.
    pub fn finish(mut self) -> Result<Node, ParseError> {
        if !self.accepted {
            let expected = self.expected();
            return Err(ParseError::UnexpectedEnd {
                expected: expected.into_iter().map(|s| self.name(s)).collect(),
            });
        }
        match self.node_stack.len() {
            1 => self.node_stack.pop().ok_or(ParseError::EmptyNodeStack),
            n => Err(ParseError::UnbalancedNodeStack(n)),
        }
    }

    fn reduce(&mut self, id: RuleID) -> Result<(), ParseError> {
        let table = self.table;
        let rule = table.rule(id).ok_or(ParseError::UnknownRule(id))?;
        let n = rule.rhs().len();

        if self.state_stack.len() <= n {
            return Err(ParseError::EmptyStateStack);
        }
        self.state_stack.truncate(self.state_stack.len() - n);
        let top = *self
            .state_stack
            .last()
            .ok_or(ParseError::EmptyStateStack)?;
        let next = match table.entry(top, rule.lhs()) {
            Some(Entry::Goto(next)) => next,
            _ => {
                return Err(ParseError::MissingGoto {
                    state: top,
                    symbol: self.name(rule.lhs()),
                })
            }
        };
        self.state_stack.push(next);
        tracing::trace!("reduce {} -> state {}", rule.display(table.symbols()), next);

        // The lone child stands in for the reduced symbol.
        if rule.unwraps_single() && n == 1 {
            return Ok(());
        }

        if self.node_stack.len() < n {
            return Err(ParseError::EmptyNodeStack);
        }
        let popped = self.node_stack.split_off(self.node_stack.len() - n);
        let children = shape_children(rule, popped);
        self.node_stack
            .push(Node::Tree(SyntaxTree::new(rule.lhs(), children)));

        Ok(())
    }

    fn name(&self, symbol: Symbol) -> String {
        symbol.display(self.table.symbols()).to_string()
    }
}

/// Apply the rule's per-position options and chaining to the popped nodes.
fn shape_children(rule: &Rule, popped: Vec<Node>) -> Vec<Node> {
    let mut children = Vec::with_capacity(popped.len());
    for (node, option) in popped.into_iter().zip(rule.options()) {
        match (option, node) {
            (RuleOption::Default, Node::Tree(tree)) if tree.children.len() == 1 => {
                children.extend(tree.children)
            }
            (RuleOption::Unwrap, Node::Tree(tree)) => children.extend(tree.children),
            (RuleOption::Discard, _) => {}
            (_, node) => children.push(node),
        }
    }

    if rule.is_chained() {
        let nested = matches!(children.first(), Some(Node::Tree(tree)) if tree.symbol == rule.lhs());
        if nested {
            if let Node::Tree(first) = children.remove(0) {
                let mut flattened = first.children;
                flattened.append(&mut children);
                children = flattened;
            }
        }
    }

    children
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error(
        "unexpected {found} at offset {}: expected one of {}",
        .token.start,
        .expected.join(", ")
    )]
    UnexpectedToken {
        state: StateID,
        token: Token,
        found: String,
        expected: Vec<String>,
    },

    #[error("unexpected end of tokens: expected one of {}", .expected.join(", "))]
    UnexpectedEnd { expected: Vec<String> },

    #[error("{found} after the input was accepted")]
    AlreadyAccepted { found: String },

    #[error("missing goto entry for {symbol} in state {state}")]
    MissingGoto { state: StateID, symbol: String },

    #[error("unknown rule {0}")]
    UnknownRule(RuleID),

    #[error("empty state stack")]
    EmptyStateStack,

    #[error("empty node stack")]
    EmptyNodeStack,

    #[error("{0} nodes left on the stack after accept")]
    UnbalancedNodeStack(usize),
}

impl ParseError {
    /// The expected symbol names reported by the error, if any.
    pub fn expected(&self) -> &[String] {
        match self {
            Self::UnexpectedToken { expected, .. } | Self::UnexpectedEnd { expected } => expected,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{symbol::SymbolTable, table::ParsingTable};

    fn token(symbol: Symbol, text: &str) -> Node {
        Node::Token(Token::new(symbol, text, 0, text.len()))
    }

    fn tree(symbol: Symbol, children: Vec<Node>) -> Node {
        Node::Tree(SyntaxTree::new(symbol, children))
    }

    #[test]
    fn discard_and_unwrap_promote_children() {
        let mut table = SymbolTable::new();
        let item = table.intern("item");
        let options = table.intern("options");
        let lparen = table.intern("(");
        let rparen = table.intern(")");
        let name = table.intern("name");

        let rule = Rule::new(item, [lparen, options, rparen]).with_options([
            RuleOption::Discard,
            RuleOption::Unwrap,
            RuleOption::Discard,
        ]);
        let children = shape_children(
            &rule,
            vec![
                token(lparen, "("),
                tree(options, vec![token(name, "a"), token(name, "b")]),
                token(rparen, ")"),
            ],
        );
        assert_eq!(children, vec![token(name, "a"), token(name, "b")]);
    }

    #[test]
    fn default_collapses_single_child_nodes_and_wrap_keeps_them() {
        let mut table = SymbolTable::new();
        let pair = table.intern("pair");
        let inner = table.intern("inner");
        let name = table.intern("name");

        let single = || tree(inner, vec![token(name, "a")]);
        let rule = Rule::new(pair, [inner, inner]);
        assert_eq!(
            shape_children(&rule, vec![single(), single()]),
            vec![token(name, "a"), token(name, "a")]
        );

        let rule = Rule::new(pair, [inner, inner]).with_options([RuleOption::Wrap]);
        assert_eq!(
            shape_children(&rule, vec![single(), single()]),
            vec![single(), token(name, "a")]
        );
    }

    #[test]
    fn chained_rules_flatten_left_recursion() {
        let mut table = SymbolTable::new();
        let list = table.intern("list");
        let x = table.intern("x");

        let rule = Rule::new(list, [list, x]).with_chained(true);
        let nested = tree(list, vec![token(x, "1"), token(x, "2")]);
        assert_eq!(
            shape_children(&rule, vec![nested, token(x, "3")]),
            vec![token(x, "1"), token(x, "2"), token(x, "3")]
        );

        let rule = Rule::new(list, [list, x]);
        let nested = tree(list, vec![token(x, "1"), token(x, "2")]);
        assert_eq!(shape_children(&rule, vec![nested, token(x, "3")]).len(), 2);
    }

    // S := x y
    fn pair_table(symbols: &mut SymbolTable) -> ParsingTable {
        let s = symbols.intern("S");
        let x = symbols.intern("x");
        let y = symbols.intern("y");
        let rules = vec![Rule::new(Symbol::START, [s]), Rule::new(s, [x, y])];
        let mut table = ParsingTable::new(symbols.clone(), rules, 4);
        let state = StateID::from_raw;
        table.set_shift(state(0), x, state(1));
        table.set_goto(state(0), s, state(3));
        table.set_shift(state(1), y, state(2));
        table.set_reduce(state(2), Symbol::EOF, RuleID::from_raw(1));
        table.set_accept(state(3), Symbol::EOF);
        table
    }

    #[test]
    fn incremental_session() {
        let mut symbols = SymbolTable::new();
        let table = pair_table(&mut symbols);
        let (x, y) = (symbols.get("x").unwrap(), symbols.get("y").unwrap());
        let parser = LRParser::new(&table);

        let mut parse = parser.start();
        assert_eq!(parse.expected(), vec![x]);
        parse.process(Token::new(x, "x", 0, 1)).unwrap();
        assert_eq!(parse.expected(), vec![y]);
        parse.process(Token::new(y, "y", 1, 2)).unwrap();
        assert_eq!(parse.expected(), vec![Symbol::EOF]);
        assert!(!parse.is_finished());
        parse.process(Token::eof(2)).unwrap();
        assert!(parse.is_finished());

        let err = parse.process(Token::new(x, "x", 2, 3)).unwrap_err();
        assert!(
            matches!(&err, ParseError::AlreadyAccepted { found } if found == "x"),
            "{:?}",
            err
        );

        let tree = parse.finish().unwrap();
        assert_eq!(tree.symbol(), symbols.get("S").unwrap());
        assert_eq!(tree.tokens().len(), 2);
    }

    #[test]
    fn missing_eof_is_an_unexpected_end() {
        let mut symbols = SymbolTable::new();
        let table = pair_table(&mut symbols);
        let (x, y) = (symbols.get("x").unwrap(), symbols.get("y").unwrap());
        let parser = LRParser::new(&table);

        let err = parser
            .parse_tokens([Token::new(x, "x", 0, 1), Token::new(y, "y", 1, 2)])
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }), "{:?}", err);
        assert_eq!(err.expected(), ["__EOF__"]);

        let mut parse = parser.start();
        parse.process(Token::new(x, "x", 0, 1)).unwrap();
        let err = parse.finish().unwrap_err();
        assert_eq!(err.expected(), ["y"]);
    }
}
