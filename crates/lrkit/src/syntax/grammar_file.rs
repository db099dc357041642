//! Grammar rule files.
//!
//! ```text
//! program := expr
//! __CHAIN__ list := list item
//! list := __EPSILON__
//! ```
//!
//! Single-symbol rules leave their child in place unless marked `__WRAP__`.

use crate::grammar::Grammar;
use lrkit_runtime::{
    rule::Rule,
    symbol::{Symbol, SymbolTable},
};

const WRAP: &str = "__WRAP__";
const CHAIN: &str = "__CHAIN__";
const EPSILON: &str = "__EPSILON__";

pub fn parse(source: &str, symbols: &mut SymbolTable) -> anyhow::Result<Vec<Rule>> {
    let mut rules = vec![];
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if super::is_blank_or_comment(line) {
            continue;
        }

        let mut words = line.split_whitespace().peekable();
        let (mut wrap, mut chain) = (false, false);
        while let Some(&word) = words.peek() {
            match word {
                WRAP => wrap = true,
                CHAIN => chain = true,
                _ => break,
            }
            words.next();
        }

        let lhs = match words.next() {
            Some(lhs) => lhs,
            None => anyhow::bail!("line {}: missing left-hand side", line_no),
        };
        if words.next() != Some(":=") {
            anyhow::bail!("line {}: expected `:=' after `{}'", line_no, lhs);
        }

        let rhs: Vec<&str> = words.collect();
        let rhs: Vec<Symbol> = match &rhs[..] {
            [EPSILON] => vec![],
            rhs if rhs.contains(&EPSILON) => {
                anyhow::bail!("line {}: `{}' must be the only symbol", line_no, EPSILON)
            }
            rhs => rhs.iter().map(|name| symbols.intern(name)).collect(),
        };

        let rule = Rule::new(symbols.intern(lhs), rhs)
            .with_unwrap(!wrap)
            .with_chained(chain);
        tracing::trace!("line {}: {}", line_no, rule.display(symbols));
        rules.push(rule);
    }
    Ok(rules)
}

/// Read a grammar rule file. The first rule's left-hand side is the start symbol.
pub fn load(source: &str, symbols: &mut SymbolTable) -> anyhow::Result<Grammar> {
    let rules = parse(source, symbols)?;
    Ok(Grammar::new(rules, None, symbols)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_and_epsilon() {
        let mut symbols = SymbolTable::new();
        let source = "\
// lists
__CHAIN__ list := list item
__WRAP__ item := x
list := __EPSILON__
";
        let rules = parse(source, &mut symbols).unwrap();
        assert_eq!(rules.len(), 3);

        assert!(rules[0].is_chained());
        assert!(rules[0].unwraps_single());
        assert_eq!(rules[0].display(&symbols).to_string(), "list := list item");

        assert!(!rules[1].is_chained());
        assert!(!rules[1].unwraps_single());

        assert!(rules[2].is_empty());
        assert_eq!(rules[2].display(&symbols).to_string(), "list :=");

        let grammar = load(source, &mut symbols).unwrap();
        assert_eq!(grammar.start_symbol(), symbols.get("list").unwrap());
    }

    #[test]
    fn malformed_lines() {
        let mut symbols = SymbolTable::new();
        for (source, message) in [
            ("__WRAP__\n", "line 1: missing left-hand side"),
            ("a b\n", "line 1: expected `:=' after `a'"),
            ("\na := b __EPSILON__\n", "line 2: `__EPSILON__' must be the only symbol"),
        ] {
            let err = parse(source, &mut symbols).unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }
}
