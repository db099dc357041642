//! Lexer rule files.
//!
//! ```text
//! // comment
//! __IGNORED__ space := \s+
//! NUMBER := \d+
//! +
//! ```
//!
//! A bare line declares a literal token named after its own text.

use crate::{lexer::Lexer, regex};
use anyhow::Context as _;
use lrkit_runtime::symbol::SymbolTable;

const SEPARATOR: &str = ":=";
const IGNORED_PREFIX: &str = "__IGNORED__ ";

/// One declaration of a lexer rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDecl {
    pub name: String,
    pub pattern: String,
    pub ignored: bool,
    /// 1-based line of the declaration.
    pub line: usize,
}

pub fn parse(source: &str) -> anyhow::Result<Vec<RuleDecl>> {
    let mut decls = vec![];
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if super::is_blank_or_comment(line) {
            continue;
        }

        let decl = match line.split_once(SEPARATOR) {
            Some((name, pattern)) => {
                let (name, ignored) = match name.strip_prefix(IGNORED_PREFIX) {
                    Some(name) => (name.trim(), true),
                    None => (name.trim(), false),
                };
                let pattern = pattern.trim();
                if name.is_empty() {
                    anyhow::bail!("line {}: missing rule name", line_no);
                }
                if pattern.is_empty() {
                    anyhow::bail!("line {}: missing pattern for `{}'", line_no, name);
                }
                RuleDecl {
                    name: name.to_owned(),
                    pattern: pattern.to_owned(),
                    ignored,
                    line: line_no,
                }
            }
            None => RuleDecl {
                name: line.to_owned(),
                pattern: regex::escape(line),
                ignored: false,
                line: line_no,
            },
        };
        decls.push(decl);
    }
    Ok(decls)
}

/// Read a lexer rule file and compile it, registering rule names in `symbols`.
pub fn load(source: &str, symbols: &mut SymbolTable) -> anyhow::Result<Lexer> {
    let decls = parse(source)?;
    let mut failed_line = 0;
    Lexer::define(symbols, |def| {
        for decl in &decls {
            failed_line = decl.line;
            if decl.ignored {
                def.ignored(&decl.name, &decl.pattern)?;
            } else {
                def.rule(&decl.name, &decl.pattern)?;
            }
        }
        Ok(())
    })
    .with_context(|| format!("line {}", failed_line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations() {
        let source = "\
// tokens
__IGNORED__ space := \\s+

NUMBER := 0|[123456789]\\d*
a := b
(
";
        let decls = parse(source).unwrap();
        let summary: Vec<_> = decls
            .iter()
            .map(|d| (d.name.as_str(), d.pattern.as_str(), d.ignored, d.line))
            .collect();
        assert_eq!(
            summary,
            [
                ("space", "\\s+", true, 2),
                ("NUMBER", "0|[123456789]\\d*", false, 4),
                ("a", "b", false, 5),
                ("(", "\\(", false, 6),
            ]
        );
        assert!(parse(":=\n").is_err());
        assert!(parse("(\n").is_ok());
    }

    #[test]
    fn literal_lines_are_escaped() {
        let decls = parse("(\n*\nx.y\n").unwrap();
        let patterns: Vec<_> = decls.iter().map(|d| d.pattern.as_str()).collect();
        assert_eq!(patterns, ["\\(", "\\*", "x\\.y"]);

        let mut symbols = SymbolTable::new();
        let lexer = load("x.y\n__IGNORED__ s := \\s\n", &mut symbols).unwrap();
        let tokens = lexer.lex("x.y x.y").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(lexer.lex("xzy").is_err());
    }

    #[test]
    fn errors_carry_the_line() {
        let mut symbols = SymbolTable::new();
        let err = load("a := a\nb := [b\n", &mut symbols).unwrap_err();
        assert_eq!(err.to_string(), "line 2");
        assert!(format!("{:#}", err).contains("`b'"));
    }
}
