//! A one-shot verifier for Metamath proof databases.

use clap::Parser;
use log::LevelFilter;
use mmcheck::database::{Database, DbOptions};
use mmcheck::diag::Diagnostic;
use mmcheck::parser::TokenStream;
use simple_logger::SimpleLogger;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

/// A Metamath proof database verifier
#[derive(Debug, clap::Parser)]
#[command(version, about)]
struct Cli {
    /// Database file to load; reads standard input if omitted
    #[arg(id("DATABASE"))]
    db: Option<PathBuf>,
    /// Logging verbosity: 0 warnings only, 1 progress, 2 statements, 3 proof steps
    #[arg(short, long, default_value_t = 0)]
    verbosity: u32,
    /// Leave proofs unverified until this label is bound
    #[arg(long, value_name("LABEL"))]
    begin_label: Option<String>,
    /// Stop reading the database when this label is seen
    #[arg(long, value_name("LABEL"))]
    stop_label: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).init().unwrap();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(diag) => {
            eprintln!("{diag}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Diagnostic> {
    let mut stream = match &cli.db {
        Some(path) => TokenStream::open(path)?,
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            TokenStream::from_bytes(&buffer)
        }
    };
    let mut db = Database::new(DbOptions {
        begin_label: cli.begin_label,
        stop_label: cli.stop_label,
    });
    db.read(&mut stream)
}
