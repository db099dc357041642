//! Syntax trees built by the parser.

use crate::{
    symbol::{Symbol, SymbolTable},
    token::Token,
    util::display_fn,
};
use std::fmt;

/// A leaf token or an internal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Token(Token),
    Tree(SyntaxTree),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    pub symbol: Symbol,
    pub children: Vec<Node>,
}

impl SyntaxTree {
    pub fn new(symbol: Symbol, children: Vec<Node>) -> Self {
        Self { symbol, children }
    }
}

impl Node {
    pub fn symbol(&self) -> Symbol {
        match self {
            Self::Token(token) => token.symbol,
            Self::Tree(tree) => tree.symbol,
        }
    }

    /// The children of an internal node; empty for a token.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Token(_) => &[],
            Self::Tree(tree) => &tree.children,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&SyntaxTree> {
        match self {
            Self::Token(_) => None,
            Self::Tree(tree) => Some(tree),
        }
    }

    /// Iterate over the tokens under this node from left to right.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens = vec![];
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Token(token) => tokens.push(token),
                Self::Tree(tree) => stack.extend(tree.children.iter().rev()),
            }
        }
        tokens
    }

    pub fn display<'t>(&'t self, table: &'t SymbolTable) -> impl fmt::Display + 't {
        display_fn(move |f| write_node(f, self, table, 0))
    }
}

fn write_node(
    f: &mut fmt::Formatter<'_>,
    node: &Node,
    table: &SymbolTable,
    depth: usize,
) -> fmt::Result {
    let indent = depth * 4;
    match node {
        Node::Token(token) => writeln!(f, "{:indent$}{}", "", token.display(table)),
        Node::Tree(tree) if tree.children.is_empty() => {
            writeln!(f, "{:indent$}{} {{}}", "", tree.symbol.display(table))
        }
        Node::Tree(tree) => {
            writeln!(f, "{:indent$}{} {{", "", tree.symbol.display(table))?;
            for child in &tree.children {
                write_node(f, child, table, depth + 1)?;
            }
            writeln!(f, "{:indent$}}}", "")
        }
    }
}
