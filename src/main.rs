// ashl: dump the token stream or syntax tree of a shader source file

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as _;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use ashl::parser::lexer::preprocess;
use ashl::parser::retokenize::tokenize;
use ashl::{parse_source, ParseError};

/// Parse a shader file and print what the front end sees
#[derive(clap::Parser, Debug)]
#[command(name = "ashl", version, about)]
struct Args {
    /// Shader source file
    file: PathBuf,

    /// Print the typed token stream instead of the syntax tree
    #[arg(long, conflicts_with = "raw")]
    tokens: bool,

    /// Print the raw lexemes instead of the syntax tree
    #[arg(long)]
    raw: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so they never mix with the dump on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ashl=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let source = match fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} cannot read '{}': {}", "error:".red().bold(), args.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let path = args.file.display().to_string();
    match run(&args, &source, &path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, source: &str, path: &str) -> Result<(), ParseError> {
    if args.raw {
        for token in preprocess(source, path)? {
            println!("{}:{}\t{}", token.location.line, token.location.column, token.text);
        }
    } else if args.tokens {
        for token in tokenize(source, path)? {
            println!("{}:{}\t{}", token.location.line, token.location.column, token);
        }
    } else {
        let module = parse_source(source, path)?;
        println!("{:#?}", module);
    }
    Ok(())
}
