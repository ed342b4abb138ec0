//! Quill CLI

use clap::{Parser, Subcommand};
use quill::config::{Config, DEFAULT_MAX_CALL_DEPTH};
use quill::error::{render_diagnostics, render_plain};
use quill::interp::StandardBuiltins;
use quill::{CompileError, Interpreter, SemanticAnalyzer};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "quill", version, about = "Quill - a small scripting language interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RunOptions {
    /// Print diagnostics as one line each instead of annotated source
    #[arg(long)]
    plain: bool,

    /// Maximum nesting of user function calls
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

impl RunOptions {
    fn config(&self) -> Config {
        Config::default()
            .with_plain_diagnostics(self.plain)
            .with_max_call_depth(self.max_call_depth)
            .with_color(std::io::stderr().is_terminal())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check and run a Quill program
    Run {
        /// Source file to run
        file: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Check a Quill program without running it
    Check {
        /// Source file to check
        file: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Parse and dump AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl {
        #[command(flatten)]
        options: RunOptions,
    },
}

/// Reason a command stopped; the message has already been printed.
struct Failed;

type CliResult = Result<(), Failed>;

fn main() -> ExitCode {
    quill::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { file, options } => run_file(&file, &options.config()),
        Command::Check { file, options } => check_file(&file, &options.config()),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
        Command::Repl { options } => start_repl(options.config()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failed) => ExitCode::FAILURE,
    }
}

fn read_source(path: &PathBuf) -> Result<String, Failed> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: cannot read {}: {e}", path.display());
        Failed
    })
}

fn report(filename: &str, source: &str, err: &CompileError, config: &Config) -> Failed {
    let diagnostics = err.diagnostics();
    if diagnostics.is_empty() {
        eprintln!("Error: {err}");
    } else if config.plain_diagnostics {
        eprint!("{}", render_plain(&diagnostics));
    } else {
        eprint!(
            "{}",
            render_diagnostics(filename, source, &diagnostics, config.color)
        );
    }
    Failed
}

fn compile(path: &PathBuf, config: &Config) -> Result<quill::Program, Failed> {
    let source = read_source(path)?;
    let filename = path.display().to_string();
    let mut analyzer = SemanticAnalyzer::new();
    quill::compile(&filename, &source, &mut analyzer)
        .map_err(|err| report(&filename, &source, &err, config))
}

fn run_file(path: &PathBuf, config: &Config) -> CliResult {
    let program = compile(path, config)?;
    let mut interpreter = Interpreter::with_config(StandardBuiltins::stdio(), config.clone());
    interpreter.run(&program).map_err(|fatal| {
        eprintln!("{fatal}");
        Failed
    })
}

fn check_file(path: &PathBuf, config: &Config) -> CliResult {
    compile(path, config)?;
    println!("✓ {} checks successfully", path.display());
    Ok(())
}

fn parse_file(path: &PathBuf) -> CliResult {
    let source = read_source(path)?;
    let filename = path.display().to_string();
    let config = Config::default().with_color(std::io::stderr().is_terminal());

    let tokens = quill::lexer::tokenize(&source)
        .map_err(|err| report(&filename, &source, &err, &config))?;
    let ast = quill::parser::parse(&filename, &source, tokens)
        .map_err(|err| report(&filename, &source, &err, &config))?;

    let json = serde_json::to_string_pretty(&ast).map_err(|e| {
        eprintln!("Error: {e}");
        Failed
    })?;
    println!("{json}");
    Ok(())
}

fn tokenize_file(path: &PathBuf) -> CliResult {
    let source = read_source(path)?;
    let filename = path.display().to_string();
    let config = Config::default().with_color(std::io::stderr().is_terminal());

    let tokens = quill::lexer::tokenize(&source)
        .map_err(|err| report(&filename, &source, &err, &config))?;
    for (tok, span) in &tokens {
        println!("{tok:?} @ {}:{} ({}..{})", span.line, span.column, span.start, span.end);
    }

    Ok(())
}

fn start_repl(config: Config) -> CliResult {
    let mut repl = quill::repl::Repl::new(config).map_err(|e| {
        eprintln!("Error: {e}");
        Failed
    })?;
    repl.run().map_err(|e| {
        eprintln!("Error: {e}");
        Failed
    })
}
