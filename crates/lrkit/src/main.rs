use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use lrkit::{
    build::{self, GrammarFormat},
    lexer::{ErrorPolicy, Lexer},
    lr1::{Automaton, Config},
    ParsingTable, SymbolTable,
};
use lrkit_runtime::{definition::ParseTable as _, parser::LRParser};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tokenize a file and print the tokens.
    Lex {
        /// The lexer rule file.
        #[arg(long)]
        rules: PathBuf,

        /// Skip characters no rule matches instead of failing.
        #[arg(long)]
        skip_invalid: bool,

        input: PathBuf,
    },

    /// Generate the LR(1) parse table of a grammar.
    Table {
        /// The grammar file.
        #[arg(long)]
        grammar: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Simple)]
        format: Format,

        /// Write the table here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dump the LR(1) configurating sets to stderr.
        #[arg(long)]
        states: bool,

        /// Give up once the automaton has more states than this.
        #[arg(long)]
        max_states: Option<usize>,
    },

    /// Parse a file and print its syntax tree.
    Parse {
        /// The lexer rule file.
        #[arg(long)]
        rules: PathBuf,

        /// The grammar file.
        #[arg(long, conflicts_with = "table", required_unless_present = "table")]
        grammar: Option<PathBuf>,

        /// A table written by `lrkit table`.
        #[arg(long)]
        table: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Simple)]
        format: Format,

        input: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Format {
    /// `LHS := RHS...` per line.
    Simple,
    /// The annotated grammar-description language.
    Description,
}

impl From<Format> for GrammarFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Simple => GrammarFormat::Simple,
            Format::Description => GrammarFormat::Description,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    match args.command {
        Command::Lex {
            rules,
            skip_invalid,
            input,
        } => lex(rules, skip_invalid, input),
        Command::Table {
            grammar,
            format,
            output,
            states,
            max_states,
        } => table(grammar, format, output, states, max_states),
        Command::Parse {
            rules,
            grammar,
            table,
            format,
            input,
        } => parse(rules, grammar, table, format, input),
    }
}

fn load_lexer(rules: &Path, symbols: &mut SymbolTable) -> anyhow::Result<Lexer> {
    let s = Instant::now();
    let lexer = build::lexer_from_file(rules, symbols)?;
    tracing::info!("build lexer: {:?} elapsed ({} DFA states)", s.elapsed(), lexer.dfa().len());
    Ok(lexer)
}

fn lex(rules: PathBuf, skip_invalid: bool, input: PathBuf) -> anyhow::Result<()> {
    let mut symbols = SymbolTable::new();
    let mut lexer = load_lexer(&rules, &mut symbols)?;
    if skip_invalid {
        lexer = lexer.with_policy(ErrorPolicy::Skip);
    }

    let text = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let s = Instant::now();
    let tokens = lexer.lex(&text)?;
    tracing::info!("lex: {:?} elapsed", s.elapsed());

    for token in &tokens {
        println!("{}..{} {}", token.start, token.end, token.display(&symbols));
    }
    Ok(())
}

fn table(
    grammar: PathBuf,
    format: Format,
    output: Option<PathBuf>,
    states: bool,
    max_states: Option<usize>,
) -> anyhow::Result<()> {
    let source = fs::read_to_string(&grammar)
        .with_context(|| format!("failed to read {}", grammar.display()))?;

    let mut symbols = SymbolTable::new();
    let s = Instant::now();
    let g = build::grammar_from_str(&source, format.into(), &mut symbols)
        .with_context(|| format!("in {}", grammar.display()))?;
    tracing::info!("load grammar: {:?} elapsed", s.elapsed());

    let mut config = Config::new();
    if let Some(limit) = max_states {
        config.max_states(limit);
    }
    let s = Instant::now();
    let automaton = Automaton::generate_with_config(&g, &config)?;
    tracing::info!("generate automaton: {:?} elapsed", s.elapsed());
    if states {
        eprintln!("{}", automaton.display(&g, &symbols));
    }

    let table = automaton.to_table(&g, &symbols);
    report_conflicts(&table);

    match output {
        Some(path) => fs::write(&path, table.to_string())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", table),
    }
    Ok(())
}

fn parse(
    rules: PathBuf,
    grammar: Option<PathBuf>,
    table: Option<PathBuf>,
    format: Format,
    input: PathBuf,
) -> anyhow::Result<()> {
    let mut symbols = SymbolTable::new();
    let lexer = load_lexer(&rules, &mut symbols)?;

    let s = Instant::now();
    let parser: LRParser<ParsingTable> = match (grammar, table) {
        (_, Some(table)) => build::parser_from_table_file(table, &mut symbols)?,
        (Some(grammar), None) => build::parser_from_file(grammar, format.into(), &mut symbols)?,
        (None, None) => anyhow::bail!("either --grammar or --table is required"),
    };
    tracing::info!("load parser: {:?} elapsed", s.elapsed());
    report_conflicts(parser.table());

    let text = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let s = Instant::now();
    let tree = parser.parse_tokens(lexer.lex(&text)?)?;
    tracing::info!("parse: {:?} elapsed", s.elapsed());

    print!("{}", tree.display(parser.table().symbols()));
    Ok(())
}

fn report_conflicts(table: &ParsingTable) {
    let conflicts = table.conflicts();
    if conflicts.is_empty() {
        return;
    }
    let suffix = if conflicts.len() == 1 { "" } else { "s" };
    eprintln!(
        "[warning] The table has {} conflict{}:",
        conflicts.len(),
        suffix
    );
    for conflict in conflicts {
        eprintln!("[warning]   {}", conflict.display(table));
    }
}
