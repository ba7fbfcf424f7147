//! Command-line interface for clove-syntax
//! Emits the clove grammar, scans files with it (or with any TextMate-shaped grammar) and runs
//! snapshot fixtures.
//!
//! Usage:
//!   clove generate [--grammar `<path>`] [--output `<path>`] [--pretty]  - Validate and emit wire JSON
//!   clove scan `<path>` [--grammar `<path>`] [--format json|snap]       - Tokenize one file
//!   clove snap [`<dir>`] [--grammar `<path>`] [--update]                 - Check or update snapshots
//!
//! Every subcommand accepts `--config <path>`, a TOML file layered over the built-in defaults.

use clap::{Arg, ArgAction, ArgMatches, Command};
use clove_syntax::config::{CloveConfig, Loader};
use clove_syntax::grammar::{self, GrammarError, RawGrammar, Repository};
use clove_syntax::scanner::Scanner;
use clove_syntax::snapshot::{self, Outcome, SnapshotError, SnapshotRunner};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} snapshots did not match")]
    SnapshotMismatch { failed: usize, total: usize },
}

fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }

    let matches = Command::new("clove")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate, validate and exercise the clove syntax grammar")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML configuration layered over the defaults"),
        )
        .subcommand(
            Command::new("generate")
                .about("Validate a grammar and emit it as JSON")
                .arg(grammar_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write to this file instead of stdout"),
                )
                .arg(
                    Arg::new("pretty")
                        .long("pretty")
                        .action(ArgAction::SetTrue)
                        .help("Indent the JSON output"),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("Tokenize a file")
                .arg(
                    Arg::new("path")
                        .help("Path to the source file")
                        .required(true)
                        .index(1),
                )
                .arg(grammar_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format")
                        .value_parser(["json", "snap"])
                        .default_value("json"),
                ),
        )
        .subcommand(
            Command::new("snap")
                .about("Check fixtures against their snapshots")
                .arg(
                    Arg::new("dir")
                        .help("Directory searched recursively for fixtures")
                        .index(1)
                        .default_value("."),
                )
                .arg(grammar_arg())
                .arg(
                    Arg::new("update")
                        .long("update")
                        .short('u')
                        .action(ArgAction::SetTrue)
                        .help("Rewrite snapshots instead of comparing"),
                ),
        )
        .get_matches();

    let Some((name, sub)) = matches.subcommand() else {
        unreachable!("clap requires a subcommand");
    };
    // `--config` is global, so it shows up on the subcommand wherever it was given.
    let result = load_config(sub.get_one::<String>("config")).and_then(|config| match name {
        "generate" => handle_generate_command(sub, &config),
        "scan" => handle_scan_command(sub, &config),
        "snap" => handle_snap_command(sub, &config),
        _ => unreachable!(),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn grammar_arg() -> Arg {
    Arg::new("grammar")
        .long("grammar")
        .short('g')
        .help("Grammar document (JSON or YAML); defaults to the built-in clove grammar")
}

fn load_config(path: Option<&String>) -> Result<CloveConfig, CliError> {
    let loader = match path {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new(),
    };
    Ok(loader.build()?)
}

/// The raw grammar named by `--grammar`, validated, or the built-in one.
fn raw_grammar(matches: &ArgMatches, config: &CloveConfig) -> Result<RawGrammar, CliError> {
    match matches.get_one::<String>("grammar") {
        Some(path) => Ok(grammar::load(path, config.scanner.backtrack_limit)?),
        None => Ok(clove_syntax::clove::grammar()),
    }
}

fn repository(matches: &ArgMatches, config: &CloveConfig) -> Result<Repository, CliError> {
    let raw = raw_grammar(matches, config)?;
    Ok(Repository::new(&raw, config.scanner.backtrack_limit)?)
}

/// Handle the generate command
fn handle_generate_command(matches: &ArgMatches, config: &CloveConfig) -> Result<(), CliError> {
    let raw = raw_grammar(matches, config)?;
    // Compiling catches what the schema cannot, such as the built-in grammar's own regexes.
    Repository::new(&raw, config.scanner.backtrack_limit)?;

    let mut json = if matches.get_flag("pretty") {
        raw.to_json_pretty()?
    } else {
        raw.to_json()?
    };
    json.push('\n');

    match matches.get_one::<String>("output") {
        Some(path) => write_file(Path::new(path), &json),
        None => {
            print!("{}", json);
            Ok(())
        }
    }
}

/// Handle the scan command
fn handle_scan_command(matches: &ArgMatches, config: &CloveConfig) -> Result<(), CliError> {
    let Some(path) = matches.get_one::<String>("path") else {
        unreachable!("clap enforces the path argument");
    };
    let source = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: PathBuf::from(path),
        source,
    })?;

    let repository = repository(matches, config)?;
    let output = Scanner::with_config(&repository, config.scanner.clone()).scan(&source, None);
    for diagnostic in &output.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    match matches.get_one::<String>("format").map(String::as_str) {
        Some("snap") => print!("{}", snapshot::render(&source, &output.tokens)),
        _ => println!("{}", serde_json::to_string_pretty(&output.tokens)?),
    }
    Ok(())
}

/// Handle the snap command
fn handle_snap_command(matches: &ArgMatches, config: &CloveConfig) -> Result<(), CliError> {
    let dir = matches
        .get_one::<String>("dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let repository = repository(matches, config)?;

    let report = SnapshotRunner::new(
        &repository,
        config.scanner.clone(),
        config.snapshot.clone(),
    )
    .update(matches.get_flag("update"))
    .run(&dir)?;

    for fixture in &report.fixtures {
        let name = fixture.fixture.display();
        match &fixture.outcome {
            Outcome::Passed => println!("ok       {}", name),
            Outcome::Updated => println!("updated  {}", name),
            Outcome::Missing => println!("missing  {}", name),
            Outcome::Failed { diff } => {
                println!("FAILED   {}", name);
                print!("{}", diff);
            }
        }
    }

    if report.is_success() {
        println!("{} snapshots passed", report.passed());
        Ok(())
    } else {
        Err(CliError::SnapshotMismatch {
            failed: report.failed(),
            total: report.fixtures.len(),
        })
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
