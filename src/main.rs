// File: src/main.rs
//
// Main entry point for the Brewin interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, parse, or test).

use brewin::ast::Program;
use brewin::errors::{BrewinError, BrewinResult, SourceLocation};
use brewin::interpreter::Interpreter;
use brewin::parser::parse_program;
use brewin::test_runner::TestRunner;
use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(
    name = "brewin",
    about = "Brewin: closures, reference parameters and prototype objects",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Brewin program
    Run {
        /// Path to the .br file
        file: PathBuf,

        /// Treat the file as a JSON-serialized AST instead of source text
        #[arg(long)]
        ast: bool,
    },

    /// Parse a program and print its AST as JSON
    Parse {
        /// Path to the .br file
        file: PathBuf,
    },

    /// Run every script in a directory against its expected output
    Test {
        /// Directory holding .br scripts and their .out files
        #[arg(default_value = "tests/scripts")]
        dir: PathBuf,

        /// Regenerate all .out files based on actual output
        #[arg(long)]
        update: bool,

        /// Also list passing scripts
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Installs a subscriber only when RUST_LOG asks for one
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .try_init();
    }
}

fn read_file(file: &Path) -> String {
    match fs::read_to_string(file) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Failed to read {}: {}", file.display(), err);
            process::exit(1);
        }
    }
}

fn load_program(file: &Path, as_ast: bool) -> BrewinResult<Program> {
    let text = read_file(file);
    if as_ast {
        serde_json::from_str(&text).map_err(|err| {
            Box::new(BrewinError::parse_error(
                format!("Invalid AST JSON: {}", err),
                SourceLocation::new(err.line(), err.column()),
            ))
        })
    } else {
        parse_program(&text)
    }
}

fn report(file: &Path, error: Box<BrewinError>) -> ! {
    eprintln!("{}", (*error).in_file(file.display().to_string()));
    process::exit(1);
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, ast } => {
            let program = load_program(&file, ast).unwrap_or_else(|e| report(&file, e));
            let mut interpreter = Interpreter::new();
            if let Err(e) = interpreter.run(&program) {
                report(&file, e);
            }
        }

        Commands::Parse { file } => {
            let program = load_program(&file, false).unwrap_or_else(|e| report(&file, e));
            match serde_json::to_string_pretty(&program) {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    eprintln!("Failed to serialize AST: {}", err);
                    process::exit(1);
                }
            }
        }

        Commands::Test { dir, update, verbose } => {
            let mut runner = TestRunner::new(update);
            match runner.run_dir(&dir) {
                Ok(report) => {
                    report.print(verbose);
                    process::exit(report.exit_code());
                }
                Err(err) => {
                    eprintln!("Failed to run tests in {}: {}", dir.display(), err);
                    process::exit(1);
                }
            }
        }
    }
}
