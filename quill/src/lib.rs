//! Quill interpreter library
//!
//! A small dynamically typed scripting language: lexer, parser, static
//! semantic analysis and a tree-walking interpreter.

pub mod ast;
pub mod config;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod sema;

pub use ast::{Program, Span};
pub use config::Config;
pub use error::{CompileError, Diagnostic, Result};
pub use interp::{Fatal, Interpreter};
pub use sema::SemanticAnalyzer;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output on stderr.
///
/// Safe to call multiple times. Enable with `RUST_LOG=quill=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

/// Lex, parse and analyze `source`.
///
/// Any semantic diagnostic rejects the program, so a returned `Program` is
/// ready to run.
pub fn compile(filename: &str, source: &str, analyzer: &mut SemanticAnalyzer) -> Result<Program> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parse(filename, source, tokens)?;
    let diagnostics = analyzer.analyze(&program);
    if diagnostics.is_empty() {
        Ok(program)
    } else {
        Err(CompileError::Semantic { diagnostics })
    }
}
