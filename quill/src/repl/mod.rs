//! REPL (Read-Eval-Print Loop) for Quill
//!
//! One analyzer scope and one interpreter scope live for the whole session,
//! so variables and functions declared on earlier lines stay visible.

use crate::ast::Stmt;
use crate::config::Config;
use crate::error::{render_plain, CompileError};
use crate::interp::builtins::{Builtins, StandardBuiltins};
use crate::interp::{Interpreter, Value};
use crate::sema::SemanticAnalyzer;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::{Stdout, StdinLock};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".quill_history";

/// REPL meta commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Clear,
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Command {
        match input {
            ":quit" | ":q" | ":exit" => Command::Quit,
            ":help" | ":h" | ":?" => Command::Help,
            ":clear" => Command::Clear,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Persistent analysis and evaluation state behind the prompt
pub struct Session<B: Builtins> {
    analyzer: SemanticAnalyzer,
    interpreter: Interpreter<B>,
}

impl<B: Builtins> Session<B> {
    pub fn new(builtins: B, config: Config) -> Self {
        let analyzer = SemanticAnalyzer::with_builtins(&builtins);
        Session {
            analyzer,
            interpreter: Interpreter::with_config(builtins, config),
        }
    }

    /// Check and run one line.
    ///
    /// A line holding a single non-void expression evaluates to its value so
    /// the prompt can echo it. Errors come back as printable text.
    pub fn eval_line(&mut self, line: &str) -> Result<Option<Value>, String> {
        let program = crate::compile("<repl>", line, &mut self.analyzer)
            .map_err(|e| describe(&e))?;

        if let [stmt] = program.statements.as_slice() {
            if let Stmt::Expr(expr) = &stmt.node {
                let value = self
                    .interpreter
                    .eval_expr(expr)
                    .map_err(|fatal| fatal.to_string())?;
                return Ok((!matches!(value, Value::Void)).then_some(value));
            }
        }

        self.interpreter
            .run(&program)
            .map_err(|fatal| fatal.to_string())?;
        Ok(None)
    }

    pub fn interpreter(&self) -> &Interpreter<B> {
        &self.interpreter
    }
}

fn describe(err: &CompileError) -> String {
    match err {
        CompileError::Io { message } => format!("Error: {message}"),
        other => render_plain(&other.diagnostics()).trim_end().to_string(),
    }
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session<StandardBuiltins<StdinLock<'static>, Stdout>>,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: Config) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let session = Session::new(StandardBuiltins::stdio(), config);

        // Try to find history file in home directory
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session,
            history_path,
        };

        // Load history if available
        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Quill REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    // Add to history
                    let _ = self.editor.add_history_entry(line);

                    // Handle commands
                    if line.starts_with(':') {
                        if self.handle_command(Command::parse(line)) {
                            break;
                        }
                        continue;
                    }

                    match self.session.eval_line(line) {
                        Ok(Some(value)) => println!("{value}"),
                        Ok(None) => {}
                        Err(message) => eprintln!("{message}"),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        // Save history
        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Returns true when the REPL should exit.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => {
                println!("Goodbye!");
                true
            }
            Command::Help => {
                print_help();
                false
            }
            Command::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            Command::Unknown(cmd) => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }
}

fn print_help() {
    println!("Quill REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!("  :clear          Clear the screen");
    println!();
    println!("You can enter:");
    println!("  - Expressions: 1 + 2 * 3, [1, 2] + [3]");
    println!("  - Assignments: x <- 10");
    println!("  - Statements: for i in 1..3 {{ output(i) }}");
    println!("  - Function definitions: function add(a, b) {{ return a + b }}");
    println!();
    println!("Built-in functions:");
    println!("  output(x)       Print value with newline");
    println!("  input()         Read a line");
    println!("  read(path)      Read a file into a string");
    println!("  write(path, x)  Write a value to a file");
    println!("  length(x)       Length of an array or string");
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestSession = Session<StandardBuiltins<&'static [u8], Vec<u8>>>;

    fn session() -> TestSession {
        Session::new(
            StandardBuiltins::new(b"".as_slice(), Vec::new()),
            Config::default(),
        )
    }

    fn printed(session: &TestSession) -> String {
        String::from_utf8(session.interpreter().builtins().output().clone()).unwrap()
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse(":quit"), Command::Quit);
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(Command::parse(":exit"), Command::Quit);
        assert_eq!(Command::parse(":help"), Command::Help);
        assert_eq!(Command::parse(":?"), Command::Help);
        assert_eq!(Command::parse(":clear"), Command::Clear);
        assert_eq!(
            Command::parse(":nope"),
            Command::Unknown(":nope".to_string())
        );
    }

    #[test]
    fn test_expression_echoes_value() {
        let mut s = session();
        assert_eq!(s.eval_line("1 + 2 * 3"), Ok(Some(Value::Int(7))));
    }

    #[test]
    fn test_void_expression_not_echoed() {
        let mut s = session();
        assert_eq!(s.eval_line("output(\"hi\")"), Ok(None));
        assert_eq!(printed(&s), "hi\n");
    }

    #[test]
    fn test_state_persists_between_lines() {
        let mut s = session();
        assert_eq!(s.eval_line("x <- 20"), Ok(None));
        assert_eq!(s.eval_line("function twice(n) { return n * 2 }"), Ok(None));
        assert_eq!(s.eval_line("twice(x) + 2"), Ok(Some(Value::Int(42))));
    }

    #[test]
    fn test_semantic_error_reported() {
        let mut s = session();
        assert_eq!(
            s.eval_line("b <- 17 + a"),
            Err("Error: Undeclared identifier 'a' (line 1, column 11)".to_string())
        );
    }

    #[test]
    fn test_syntax_error_reported() {
        let mut s = session();
        let err = s.eval_line("x <- (").unwrap_err();
        assert!(err.starts_with("Error: Expected expression"), "{err}");
    }

    #[test]
    fn test_runtime_error_reported() {
        let mut s = session();
        assert_eq!(
            s.eval_line("1 / 0"),
            Err("Error: Division by zero (line 1, column 1)".to_string())
        );
        // The session keeps working after a fatal error
        assert_eq!(s.eval_line("2"), Ok(Some(Value::Int(2))));
    }
}
