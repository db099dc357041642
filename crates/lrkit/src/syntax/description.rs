//! The grammar-description language.
//!
//! ```text
//! __ACCEPTS__ program
//! > program := statement (";" statement)?
//! > item := __DISCARD__ "(" __UNWRAP__ options __DISCARD__ ")" | name
//! ```
//!
//! Each declaration is expanded into one annotated [`Rule`] per
//! combination of its alternatives and optional items. The language
//! itself is lexed and parsed with a lexer and an LR(1) table built by
//! this crate.

use super::lexer_file;
use crate::{grammar::Grammar, lexer::Lexer, lr1};
use lrkit_runtime::{
    parser::{LRParser, ParseError},
    rule::{Rule, RuleOption},
    symbol::{Symbol, SymbolTable},
    table::ParsingTable,
    tree::Node,
};

const META_LEXER: &str = r#"
__IGNORED__ comment := //[^\n]*
__IGNORED__ space := \s
wrap := __WRAP__
unwrap := __UNWRAP__
epsilon := __EPSILON__
accepts := __ACCEPTS__
discard := __DISCARD__
name := \l+(-\l+)*|"([^"\\]|\\.)+"
sep := \:\=
?
or := \|
)
(
>
"#;

/// A parsed description: the start symbol and the expanded rules.
#[derive(Debug, Clone)]
pub struct Description {
    pub start: Symbol,
    pub rules: Vec<Rule>,
}

/// Parse a description, registering its names in `symbols`.
pub fn parse(source: &str, symbols: &mut SymbolTable) -> anyhow::Result<Description> {
    MetaParser::new()?.parse(source, symbols)
}

/// Parse a description into a grammar.
pub fn load(source: &str, symbols: &mut SymbolTable) -> anyhow::Result<Grammar> {
    let description = parse(source, symbols)?;
    Ok(Grammar::new(
        description.rules,
        Some(description.start),
        symbols,
    )?)
}

/// Symbols of the description language, in its private symbol table.
#[derive(Debug)]
struct MetaSymbols {
    grammar: Symbol,
    start_declaration: Symbol,
    rule_declarations: Symbol,
    rule_declaration: Symbol,
    lhs: Symbol,
    rhs: Symbol,
    options: Symbol,
    list: Symbol,
    item: Symbol,
    optional_item: Symbol,
    discarded_item: Symbol,
    unwrapped_item: Symbol,
    wrapped_item: Symbol,

    wrap: Symbol,
    unwrap: Symbol,
    epsilon: Symbol,
    accepts: Symbol,
    discard: Symbol,
    name: Symbol,
    sep: Symbol,
    question: Symbol,
    or: Symbol,
    lparen: Symbol,
    rparen: Symbol,
    arrow: Symbol,
}

impl MetaSymbols {
    fn new(symbols: &mut SymbolTable) -> Self {
        let mut s = |name: &str| symbols.intern(name);
        Self {
            grammar: s("grammar"),
            start_declaration: s("start-symbol-declaration"),
            rule_declarations: s("rule-declarations"),
            rule_declaration: s("rule-declaration"),
            lhs: s("lhs"),
            rhs: s("rhs"),
            options: s("options"),
            list: s("list"),
            item: s("item"),
            optional_item: s("optional-item"),
            discarded_item: s("discarded-item"),
            unwrapped_item: s("unwrapped-item"),
            wrapped_item: s("wrapped-item"),

            wrap: s("wrap"),
            unwrap: s("unwrap"),
            epsilon: s("epsilon"),
            accepts: s("accepts"),
            discard: s("discard"),
            name: s("name"),
            sep: s("sep"),
            question: s("?"),
            or: s("or"),
            lparen: s("("),
            rparen: s(")"),
            arrow: s(">"),
        }
    }

    fn rules(&self) -> Vec<Rule> {
        use RuleOption::{Default as D, Discard, Unwrap, Wrap};

        let rule = |lhs: Symbol, rhs: &[Symbol], options: &[RuleOption]| {
            Rule::new(lhs, rhs).with_options(options.iter().copied())
        };
        vec![
            rule(
                self.grammar,
                &[self.start_declaration, self.rule_declarations],
                &[Wrap, Wrap],
            ),
            rule(self.start_declaration, &[self.accepts, self.name], &[Discard, D]),
            rule(self.rule_declarations, &[], &[]),
            rule(
                self.rule_declarations,
                &[self.rule_declarations, self.rule_declaration],
                &[Unwrap, D],
            ),
            rule(
                self.rule_declaration,
                &[self.arrow, self.lhs, self.sep, self.rhs],
                &[D, Wrap, D, Wrap],
            ),
            rule(self.lhs, &[self.name], &[D]),
            rule(self.rhs, &[self.options], &[D]),
            rule(self.options, &[self.list], &[D]),
            rule(self.options, &[self.options, self.or, self.list], &[Unwrap, Discard, D]),
            rule(self.list, &[self.item], &[D]),
            rule(self.list, &[self.list, self.item], &[Unwrap, D]),
            rule(self.item, &[self.lparen, self.options, self.rparen], &[Discard, D, Discard]),
            rule(self.item, &[self.name], &[D]),
            rule(self.item, &[self.unwrapped_item], &[Wrap]),
            rule(self.item, &[self.wrapped_item], &[Wrap]),
            rule(self.item, &[self.discarded_item], &[Wrap]),
            rule(self.item, &[self.optional_item], &[Wrap]),
            rule(self.item, &[self.epsilon], &[D]),
            rule(self.optional_item, &[self.item, self.question], &[D, Discard]),
            rule(self.discarded_item, &[self.discard, self.name], &[Discard, D]),
            rule(self.unwrapped_item, &[self.unwrap, self.name], &[Discard, D]),
            rule(self.wrapped_item, &[self.wrap, self.name], &[Discard, D]),
        ]
    }
}

/// One alternative right-hand side: names with their options.
type Alternative = Vec<(String, RuleOption)>;

struct MetaParser {
    meta: MetaSymbols,
    lexer: Lexer,
    parser: LRParser<ParsingTable>,
}

impl MetaParser {
    fn new() -> anyhow::Result<Self> {
        let mut symbols = SymbolTable::new();
        let lexer = lexer_file::load(META_LEXER, &mut symbols)?;
        let meta = MetaSymbols::new(&mut symbols);
        let grammar = Grammar::new(meta.rules(), Some(meta.grammar), &symbols)?;
        let table = lr1::build_table(&grammar, &symbols)?;
        if let Some(conflict) = table.conflicts().first() {
            anyhow::bail!(
                "the description grammar is not LR(1): {}",
                conflict.display(&table)
            );
        }
        Ok(Self {
            meta,
            lexer,
            parser: LRParser::new(table),
        })
    }

    fn parse(&self, source: &str, symbols: &mut SymbolTable) -> anyhow::Result<Description> {
        let tokens = self
            .lexer
            .lex(source)
            .map_err(|err| anyhow::anyhow!("line {}: {}", line_of(source, err.position), err))?;
        let tree = self.parser.parse_tokens(tokens).map_err(|err| match &err {
            ParseError::UnexpectedToken { token, .. } => {
                anyhow::anyhow!("line {}: {}", line_of(source, token.start), err)
            }
            _ => anyhow::Error::new(err),
        })?;

        let m = &self.meta;
        let (start, declarations) = match tree.children() {
            [start, declarations] => (start, declarations),
            _ => anyhow::bail!("malformed description tree"),
        };
        let start = match start.children() {
            [Node::Token(name)] if name.symbol == m.name => symbols.intern(&unquote(&name.text)?),
            _ => anyhow::bail!("malformed start symbol declaration"),
        };

        let mut rules: Vec<Rule> = vec![];
        for declaration in declarations.children() {
            let (lhs, rhs) = match declaration.children() {
                [_, Node::Tree(lhs), _, Node::Tree(rhs)] if declaration.symbol() == m.rule_declaration => {
                    (lhs, rhs)
                }
                _ => anyhow::bail!("malformed rule declaration"),
            };
            let lhs = match &lhs.children[..] {
                [Node::Token(name)] => symbols.intern(&unquote(&name.text)?),
                _ => anyhow::bail!("malformed left-hand side"),
            };
            let body = match &rhs.children[..] {
                [body] => body,
                _ => anyhow::bail!("malformed right-hand side"),
            };

            for alternative in self.expand(body)? {
                let (rhs, options): (Vec<Symbol>, Vec<RuleOption>) = alternative
                    .iter()
                    .map(|(name, option)| (symbols.intern(name), *option))
                    .unzip();
                let rule = Rule::new(lhs, rhs).with_options(options);
                if !rules.contains(&rule) {
                    rules.push(rule);
                }
            }
        }
        tracing::debug!("description expanded into {} rules", rules.len());

        Ok(Description { start, rules })
    }

    /// Every alternative right-hand side a node stands for.
    fn expand(&self, node: &Node) -> anyhow::Result<Vec<Alternative>> {
        let m = &self.meta;
        let tree = match node {
            Node::Token(token) if token.symbol == m.name => {
                return Ok(vec![vec![(unquote(&token.text)?, RuleOption::Default)]]);
            }
            Node::Token(token) if token.symbol == m.epsilon => return Ok(vec![vec![]]),
            Node::Token(token) => {
                anyhow::bail!("unexpected {:?} at offset {}", token.text, token.start)
            }
            Node::Tree(tree) => tree,
        };

        let symbol = tree.symbol;
        if symbol == m.options {
            let mut alternatives = vec![];
            for child in &tree.children {
                alternatives.extend(self.expand(child)?);
            }
            Ok(alternatives)
        } else if symbol == m.list {
            let mut product: Vec<Alternative> = vec![vec![]];
            for child in &tree.children {
                let suffixes = self.expand(child)?;
                product = product
                    .iter()
                    .flat_map(|prefix| {
                        suffixes
                            .iter()
                            .map(move |suffix| prefix.iter().chain(suffix).cloned().collect())
                    })
                    .collect();
            }
            Ok(product)
        } else if symbol == m.item || symbol == m.rhs {
            match &tree.children[..] {
                [child] => self.expand(child),
                _ => anyhow::bail!("malformed item"),
            }
        } else if symbol == m.optional_item {
            let mut alternatives = match &tree.children[..] {
                [child] => self.expand(child)?,
                _ => anyhow::bail!("malformed optional item"),
            };
            alternatives.push(vec![]);
            Ok(alternatives)
        } else if let Some(option) = self.annotation(symbol) {
            match &tree.children[..] {
                [Node::Token(name)] => Ok(vec![vec![(unquote(&name.text)?, option)]]),
                _ => anyhow::bail!("malformed annotated item"),
            }
        } else {
            anyhow::bail!("unexpected node in rule body")
        }
    }

    fn annotation(&self, symbol: Symbol) -> Option<RuleOption> {
        let m = &self.meta;
        if symbol == m.unwrapped_item {
            Some(RuleOption::Unwrap)
        } else if symbol == m.wrapped_item {
            Some(RuleOption::Wrap)
        } else if symbol == m.discarded_item {
            Some(RuleOption::Discard)
        } else {
            None
        }
    }
}

/// Strip the quotes and escapes of a quoted name. Bare names pass through.
///
/// Table text separates names by whitespace, so a name containing any is rejected.
fn unquote(text: &str) -> anyhow::Result<String> {
    let inner = match text.strip_prefix('"') {
        Some(rest) => match rest.strip_suffix('"') {
            Some(inner) => inner,
            None => anyhow::bail!("unterminated quoted name {}", text),
        },
        None => return Ok(text.to_owned()),
    };
    let mut unquoted = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => unquoted.extend(chars.next()),
            c => unquoted.push(c),
        }
    }
    if unquoted.chars().any(char::is_whitespace) {
        anyhow::bail!("quoted name {} contains whitespace", text);
    }
    Ok(unquoted)
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}
