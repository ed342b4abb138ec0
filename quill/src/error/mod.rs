//! Error types and diagnostic reporting

use crate::ast::Span;
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Failure that stops the front end before analysis can run
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Syntax error: {} diagnostic(s)", diagnostics.len())]
    Syntax { diagnostics: Vec<Diagnostic> },

    #[error("Semantic error: {} diagnostic(s)", diagnostics.len())]
    Semantic { diagnostics: Vec<Diagnostic> },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } => Some(*span),
            Self::Syntax { diagnostics } | Self::Semantic { diagnostics } => {
                diagnostics.first().map(|d| d.span)
            }
            Self::Io { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } => message,
            Self::Syntax { diagnostics } | Self::Semantic { diagnostics } => diagnostics
                .first()
                .map_or("invalid program", |d| d.message.as_str()),
            Self::Io { message } => message,
        }
    }

    /// Diagnostics carried by this error, for uniform rendering.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Lexer { message, span } => vec![Diagnostic::new(message.clone(), *span)],
            Self::Syntax { diagnostics } | Self::Semantic { diagnostics } => diagnostics.clone(),
            Self::Io { .. } => Vec::new(),
        }
    }
}

/// A positioned, recoverable error message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: {} (line {}, column {})",
            self.message, self.span.line, self.span.column
        )
    }
}

/// Accumulates diagnostics across one pass.
///
/// After any report, unforced reports are dropped until [`Reporter::handled`]
/// re-arms the reporter. The parser reports unforced and re-arms after
/// resynchronising; semantic errors are always forced.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    pending: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, message: impl Into<String>, span: Span, force: bool) {
        let diagnostic = Diagnostic::new(message, span);
        if self.pending && !force {
            tracing::trace!(%diagnostic, "suppressed follow-on diagnostic");
            return;
        }
        self.pending = true;
        if self.diagnostics.contains(&diagnostic) {
            return;
        }
        tracing::debug!(%diagnostic, "reported");
        self.diagnostics.push(diagnostic);
    }

    /// Mark the last reported error as dealt with.
    pub fn handled(&mut self) {
        self.pending = false;
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Render diagnostics with ariadne, highlighting the offending source.
pub fn render_diagnostics(
    filename: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    color: bool,
) -> String {
    use ariadne::{Color, Config, Label, Report, ReportKind, Source};

    let mut out = Vec::new();
    for diagnostic in diagnostics {
        let span = diagnostic.span;
        let end = span.end.max(span.start + 1).min(source.len().max(span.start));
        let range = span.start..end;
        let written = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_config(Config::default().with_color(color))
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((filename, range))
                    .with_message(format!("line {}, column {}", span.line, span.column))
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut out);
        if written.is_err() {
            // Fall back to the one-line form rather than losing the message.
            out.extend_from_slice(format!("{diagnostic}\n").as_bytes());
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Render diagnostics as `Error: <message> (line L, column C)` lines.
pub fn render_plain(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(|d| format!("{d}\n")).collect()
}
