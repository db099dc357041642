use std::{env, fs, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use lrkit::{
    build::{self, GrammarFormat},
    lr1::Automaton,
    SymbolTable,
};

criterion_main!(benches);
criterion_group!(benches, bench_lexers, bench_tables, bench_parse);

fn bench_lexers(c: &mut Criterion) {
    bench_lexer_gen(c, "arithmetic");
    bench_lexer_gen(c, "json");
    bench_lexer_gen(c, "lists");
}

fn bench_tables(c: &mut Criterion) {
    bench_table_gen(c, "arithmetic");
    bench_table_gen(c, "json");
    bench_table_gen(c, "lists");
}

fn read_fixture(name: &str) -> String {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    fs::read_to_string(project_root.join("tests").join(name)).unwrap()
}

fn bench_lexer_gen(c: &mut Criterion, name: &str) {
    let source = read_fixture(&format!("{}.lex", name));
    c.bench_function(&format!("{}/lexer", name), |b| {
        b.iter(|| build::lexer_from_str(&source, &mut SymbolTable::new()).unwrap());
    });
}

fn bench_table_gen(c: &mut Criterion, name: &str) {
    let source = read_fixture(&format!("{}.grammar", name));
    let mut symbols = SymbolTable::new();
    let grammar = build::grammar_from_str(&source, GrammarFormat::Simple, &mut symbols).unwrap();

    let mut group = c.benchmark_group(name);
    group.bench_function("automaton", |b| {
        b.iter(|| Automaton::generate(&grammar).unwrap());
    });
    group.bench_function("table", |b| {
        b.iter(|| {
            Automaton::generate(&grammar)
                .unwrap()
                .to_table(&grammar, &symbols)
        });
    });
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut symbols = SymbolTable::new();
    let lexer = build::lexer_from_str(&read_fixture("arithmetic.lex"), &mut symbols).unwrap();
    let parser = build::parser_from_str(&read_fixture("arithmetic.grammar"), &mut symbols).unwrap();
    let input = vec!["(1 + a * (2 + 3) + 5) + 2"; 64].join(" * ");

    c.bench_function("arithmetic/parse", |b| {
        b.iter(|| {
            let tokens = lexer.lex(&input).unwrap();
            parser.parse_tokens(tokens).unwrap()
        });
    });
}
