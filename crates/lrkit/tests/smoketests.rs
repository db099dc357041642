use lrkit::{
    build::{self, GrammarFormat},
    lr1::Config,
    LRParser, ParsingTable, SymbolTable,
};
use std::{env, fs, path::PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
        .join("tests")
        .join(name)
}

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let mut symbols = SymbolTable::new();
            let lexer = build::lexer_from_file(
                fixture(concat!(stringify!($name), ".lex")),
                &mut symbols,
            )
            .unwrap();
            let source = fs::read_to_string(fixture(concat!(stringify!($name), ".grammar"))).unwrap();
            let grammar = build::grammar_from_str(&source, GrammarFormat::Simple, &mut symbols).unwrap();
            let table = build::table_from_grammar(&grammar, &symbols, &Config::new()).unwrap();
            assert!(table.conflicts().is_empty(), "{:?}", table.conflicts());

            // the serialized table reads back to the same text
            let text = table.to_string();
            let reloaded = ParsingTable::parse(&text, &mut SymbolTable::new()).unwrap();
            assert_eq!(reloaded.len(), table.len());
            assert_eq!(reloaded.to_string(), text);

            let input = fs::read_to_string(fixture(concat!(stringify!($name), ".input"))).unwrap();
            let tokens = lexer.lex(&input).unwrap();
            let tree = LRParser::new(table).parse_tokens(tokens.clone()).unwrap();
            let leaves: Vec<_> = tree.tokens().into_iter().cloned().collect();
            assert_eq!(leaves[..], tokens[..tokens.len() - 1]);
        }
    )*};
}

define_tests! {
    arithmetic,
    json,
    lists,
}
