//! Built-in I/O functions
//!
//! Builtins are registered into the global scope as Function symbols flagged
//! as builtin, and invoked with already evaluated arguments. No call frame is
//! built for them.

use super::error::Fatal;
use super::scope::{ScopeRef, Symbol};
use super::value::{Function, Value};
use crate::ast::Span;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// External callables available to every program
pub trait Builtins {
    /// Name and parameter count of every builtin
    fn signatures(&self) -> &[(&'static str, usize)];

    /// Invoke `name` with evaluated arguments. Arity has already been checked.
    fn invoke(&mut self, name: &str, args: Vec<Value>, span: Span) -> Result<Value, Fatal>;
}

/// Insert a builtin Function symbol for each signature into `scope`.
pub fn register(scope: &ScopeRef, builtins: &dyn Builtins) {
    register_signatures(scope, builtins.signatures());
}

pub fn register_signatures(scope: &ScopeRef, signatures: &[(&'static str, usize)]) {
    let mut scope = scope.borrow_mut();
    for &(name, arity) in signatures {
        let function = Function::builtin(name, arity);
        scope.insert(Symbol::new(name, Some(Value::Function(Rc::new(function)))));
    }
}

/// Signatures of [`StandardBuiltins`]
pub const STANDARD: &[(&str, usize)] = &[
    ("output", 1),
    ("input", 0),
    ("read", 1),
    ("write", 2),
    ("length", 1),
];

/// Builtins backed by a line reader and an output sink
pub struct StandardBuiltins<R, W> {
    input: R,
    output: W,
}

impl StandardBuiltins<io::StdinLock<'static>, io::Stdout> {
    /// Builtins wired to the process's stdin and stdout
    pub fn stdio() -> Self {
        StandardBuiltins::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StandardBuiltins<R, W> {
    pub fn new(input: R, output: W) -> Self {
        StandardBuiltins { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn output_line(&mut self, value: &Value, span: Span) -> Result<Value, Fatal> {
        writeln!(self.output, "{value}")
            .map_err(|e| Fatal::builtin(format!("Cannot write output: {e}"), span))?;
        Ok(Value::Void)
    }

    fn input_line(&mut self, span: Span) -> Result<Value, Fatal> {
        self.output
            .flush()
            .map_err(|e| Fatal::builtin(format!("Cannot write output: {e}"), span))?;
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| Fatal::builtin(format!("Cannot read input: {e}"), span))?;
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Value::string(line))
    }
}

fn path_arg(name: &str, value: &Value, span: Span) -> Result<String, Fatal> {
    match value {
        Value::Str(path) => Ok(path.to_string()),
        other => Err(Fatal::builtin(
            format!("Argument to '{name}' must be a string path, found '{}'", other.kind()),
            span,
        )),
    }
}

impl<R: BufRead, W: Write> Builtins for StandardBuiltins<R, W> {
    fn signatures(&self) -> &[(&'static str, usize)] {
        STANDARD
    }

    #[tracing::instrument(level = "debug", skip(self, args), fields(line = span.line))]
    fn invoke(&mut self, name: &str, args: Vec<Value>, span: Span) -> Result<Value, Fatal> {
        match (name, args.as_slice()) {
            ("output", [value]) => self.output_line(value, span),
            ("input", []) => self.input_line(span),
            ("read", [path]) => {
                let path = path_arg(name, path, span)?;
                std::fs::read_to_string(&path)
                    .map(Value::string)
                    .map_err(|e| Fatal::builtin(format!("Cannot read file '{path}': {e}"), span))
            }
            ("write", [path, contents]) => {
                let path = path_arg(name, path, span)?;
                std::fs::write(&path, contents.to_string())
                    .map(|()| Value::Void)
                    .map_err(|e| Fatal::builtin(format!("Cannot write file '{path}': {e}"), span))
            }
            ("length", [value]) => match value.length() {
                Some(len) => i64::try_from(len)
                    .map(Value::Int)
                    .map_err(|_| Fatal::builtin("Length does not fit in an int", span)),
                None => Err(Fatal::builtin(
                    format!("Cannot take the length of '{}'", value.kind()),
                    span,
                )),
            },
            _ => Err(Fatal::arity(name, span)),
        }
    }
}
