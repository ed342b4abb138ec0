//! Integration tests for the Quill interpreter
//!
//! Tests the full pipeline:
//! - Lexing and parsing
//! - Semantic analysis diagnostics
//! - Interpreter execution against in-memory I/O
//! - Runtime aborts

use quill::error::render_plain;
use quill::interp::{FatalKind, StandardBuiltins};
use quill::{CompileError, Config, Fatal, Interpreter, SemanticAnalyzer};

/// Outcome of a whole-program run
#[derive(Debug)]
enum Outcome {
    /// Program ran to completion with this output
    Ok(String),
    /// Analysis or parsing rejected the program
    Rejected(Vec<String>),
    /// Program aborted after printing `output`
    Aborted { output: String, fatal: Fatal },
}

/// Helper to check and run a Quill program with the given stdin
fn run_with_input(source: &str, input: &'static str) -> Outcome {
    let mut analyzer = SemanticAnalyzer::new();
    let program = match quill::compile("test.ql", source, &mut analyzer) {
        Ok(program) => program,
        Err(err) => {
            return Outcome::Rejected(err.diagnostics().iter().map(ToString::to_string).collect());
        }
    };
    let builtins = StandardBuiltins::new(input.as_bytes(), Vec::new());
    let mut interp = Interpreter::with_config(builtins, Config::default());
    let result = interp.run(&program);
    let output = String::from_utf8(interp.into_builtins().into_output()).expect("utf-8");
    match result {
        Ok(()) => Outcome::Ok(output),
        Err(fatal) => Outcome::Aborted { output, fatal },
    }
}

fn run(source: &str) -> Outcome {
    run_with_input(source, "")
}

/// Helper to run and expect success
fn output_of(source: &str) -> String {
    match run(source) {
        Outcome::Ok(output) => output,
        other => panic!("expected success, got {other:?}"),
    }
}

/// Helper to collect diagnostics of a rejected program
fn diagnostics_of(source: &str) -> Vec<String> {
    match run(source) {
        Outcome::Rejected(diagnostics) => diagnostics,
        other => panic!("expected rejection, got {other:?}"),
    }
}

/// Helper to run and expect a runtime abort
fn fatal_of(source: &str) -> (String, Fatal) {
    match run(source) {
        Outcome::Aborted { output, fatal } => (output, fatal),
        other => panic!("expected abort, got {other:?}"),
    }
}

// ============================================
// Reference Programs
// ============================================

#[test]
fn test_arithmetic_precedence_prints_zero() {
    assert_eq!(output_of("output(1 * (2 + 3 * 4) / 5 - 6 % 4)"), "0\n");
}

#[test]
fn test_for_range_prints_one_to_ten() {
    let expected: String = (1..=10).map(|i| format!("{i}\n")).collect();
    assert_eq!(output_of("for i in 1..10 {output(i)}"), expected);
}

#[test]
fn test_undeclared_identifier_diagnostic() {
    assert_eq!(
        diagnostics_of("b <- 17 + a"),
        vec!["Error: Undeclared identifier 'a' (line 1, column 11)"]
    );
}

#[test]
fn test_nested_array_update() {
    let src = "a <- [[1, 2, [3, 4, 5], 6, [7]], 8, [9, 10]]\n\
               a[0] <- [1, 2, [3]]\n\
               output(a[0][2][0])";
    assert_eq!(output_of(src), "3\n");
}

// ============================================
// Control Statement Legality
// ============================================

#[test]
fn test_top_level_control_statements_rejected() {
    assert_eq!(
        diagnostics_of("stop"),
        vec!["Error: 'stop' statement outside of loop (line 1, column 1)"]
    );
    assert_eq!(
        diagnostics_of("next"),
        vec!["Error: 'next' statement outside of loop (line 1, column 1)"]
    );
    assert_eq!(
        diagnostics_of("return 1"),
        vec!["Error: 'return' statement outside of function (line 1, column 1)"]
    );
}

#[test]
fn test_control_statements_inside_if_rejected() {
    assert_eq!(diagnostics_of("if true { stop }").len(), 1);
    assert_eq!(diagnostics_of("if true { next }").len(), 1);
    assert_eq!(diagnostics_of("if true { return }").len(), 1);
}

#[test]
fn test_control_statements_in_context_accepted() {
    assert_eq!(output_of("while true { stop }"), "");
    assert_eq!(output_of("for i in [1] { if i = 1 { next } }"), "");
    assert_eq!(output_of("function f() { return 1 }\noutput(f())"), "1\n");
}

#[test]
fn test_analysis_runs_before_execution() {
    // Nothing is printed when a later statement fails analysis
    assert_eq!(
        diagnostics_of("output(1)\noutput(missing)"),
        vec!["Error: Undeclared identifier 'missing' (line 2, column 8)"]
    );
}

#[test]
fn test_multiple_semantic_errors_accumulate() {
    let diagnostics = diagnostics_of("x <- y\nstop\nf(1)\nfunction g(a) { return a }\ng()");
    assert_eq!(
        diagnostics,
        vec![
            "Error: Undeclared identifier 'y' (line 1, column 6)",
            "Error: 'stop' statement outside of loop (line 2, column 1)",
            "Error: Undeclared identifier 'f' (line 3, column 1)",
            "Error: Incorrect number of arguments to function 'g' (line 5, column 1)",
        ]
    );
}

// ============================================
// Programs
// ============================================

#[test]
fn test_fibonacci() {
    let src = "
        function fib(n) {
            if n < 2 { return n }
            return fib(n - 1) + fib(n - 2)
        }
        for i in 0..10 { output(fib(i)) }
    ";
    let expected = "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n55\n";
    assert_eq!(output_of(src), expected);
}

#[test]
fn test_bubble_sort() {
    let src = "
        function sort(a) {
            n <- length(a)
            repeat n {
                for i in 0..n - 2 {
                    if a[i] > a[i + 1] {
                        t <- a[i]
                        a[i] <- a[i + 1]
                        a[i + 1] <- t
                    }
                }
            }
            return a
        }
        data <- [5, 3, 9, 1, 4]
        sort(data)
        output(data)
    ";
    // Arrays are passed by reference: `data` itself is sorted
    assert_eq!(output_of(src), "[1, 3, 4, 5, 9]\n");
}

#[test]
fn test_string_building() {
    let src = r#"
        s <- ""
        for c in "abc" { s <- c + s }
        output(s)
        output("-" * 3)
        output(length(s))
        output(s[1])
    "#;
    assert_eq!(output_of(src), "cba\n---\n3\nb\n");
}

#[test]
fn test_countdown_range() {
    assert_eq!(output_of("for i in 3..1 { output(i) }"), "3\n2\n1\n");
}

#[test]
fn test_while_with_next_and_stop() {
    let src = "
        i <- 0
        total <- 0
        while true {
            i <- i + 1
            if i > 10 { stop }
            if i % 2 = 1 { next }
            total <- total + i
        }
        output(total)
    ";
    assert_eq!(output_of(src), "30\n");
}

#[test]
fn test_stop_leaves_innermost_loop_only() {
    let src = "
        for i in 1..2 {
            for j in 1..3 {
                if j = 2 { stop }
                output([i, j])
            }
        }
    ";
    assert_eq!(output_of(src), "[1, 1]\n[2, 1]\n");
}

#[test]
fn test_mixed_numeric_and_casts() {
    let src = "
        output(7 / 2)
        output(7 / 2.0)
        output(int(3.9))
        output(float(\"2.5\") * 2)
        output(string(1) + string(true))
        output(1 = 1.0)
    ";
    assert_eq!(output_of(src), "3\n3.5\n3\n5.0\n1true\ntrue\n");
}

#[test]
fn test_array_equality() {
    let src = "
        output([1, 2] = [1, 2])
        output([1, 2] = [1, 2, 3])
        output([1, [2]] != [1, [3]])
    ";
    assert_eq!(output_of(src), "true\nfalse\ntrue\n");
}

#[test]
fn test_bitwise_and_logic() {
    let src = "
        output(6 & 3)
        output(6 | 3)
        output(6 ^ 3)
        output(~0)
        output(not false and true or false)
    ";
    assert_eq!(output_of(src), "2\n7\n5\n-1\ntrue\n");
}

#[test]
fn test_nested_arrays_display_strings_quoted() {
    assert_eq!(output_of("output([\"a\", [1.5, true]])"), "[\"a\", [1.5, true]]\n");
}

#[test]
fn test_input_builtin() {
    let src = "name <- input()\noutput(\"hello \" + name)";
    match run_with_input(src, "quill\n") {
        Outcome::Ok(output) => assert_eq!(output, "hello quill\n"),
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn test_globals_shared_with_functions() {
    let src = "
        log <- []
        function record(x) { log <- log + [x] }
        record(1)
        record(2)
        output(log)
    ";
    assert_eq!(output_of(src), "[1, 2]\n");
}

// ============================================
// Runtime Aborts
// ============================================

#[test]
fn test_runtime_type_error_aborts() {
    let (output, fatal) = fatal_of("output(\"before\")\nx <- \"a\" - 1\noutput(\"after\")");
    assert_eq!(output, "before\n");
    assert_eq!(fatal.kind, FatalKind::Operator);
    assert_eq!(
        fatal.to_string(),
        "Error: Unsupported operator '-' for types 'string' and 'int' (line 2, column 6)"
    );
}

#[test]
fn test_assign_void_aborts() {
    let (_, fatal) = fatal_of("function f() { x <- 1 }\ny <- f()");
    assert_eq!(fatal.to_string(), "Error: cannot assign void (line 2, column 6)");
}

#[test]
fn test_bad_cast_aborts() {
    let (_, fatal) = fatal_of("x <- int(\"twelve\")");
    assert_eq!(fatal.kind, FatalKind::Cast);
}

#[test]
fn test_out_of_range_subscript_aborts() {
    let (_, fatal) = fatal_of("a <- [1, 2]\na[2] <- 3");
    assert_eq!(fatal.kind, FatalKind::Subscript);
    assert_eq!(fatal.span.line, 2);
}

#[test]
fn test_non_bool_condition_aborts() {
    let (_, fatal) = fatal_of("x <- 1\nwhile x { stop }");
    assert_eq!(
        fatal.to_string(),
        "Error: Condition must be bool, found 'int' (line 2, column 7)"
    );
}

#[test]
fn test_huge_replication_aborts() {
    let (output, fatal) = fatal_of("output(1)\ns <- \"ab\" * 9223372036854775807\noutput(2)");
    assert_eq!(output, "1\n");
    assert_eq!(fatal.kind, FatalKind::Overflow);
    assert_eq!(fatal.span.line, 2);

    let (_, fatal) = fatal_of("a <- [1, 2]\nb <- a * 9223372036854775807");
    assert_eq!(fatal.kind, FatalKind::Overflow);
    assert_eq!(fatal.span.line, 2);
}

#[test]
fn test_output_self_referential_array() {
    assert_eq!(output_of("a <- [1, 2]\na[1] <- a\noutput(a)"), "[1, [...]]\n");
}

#[test]
fn test_aliased_array_equality_is_elementwise() {
    let src = "
        a <- [0.0 / 0.0]
        b <- a
        output(a = b)
        output([1] = [1])
    ";
    assert_eq!(output_of(src), "false\ntrue\n");
}

#[test]
fn test_deep_recursion_hits_call_limit() {
    let src = "function down(n) { return down(n + 1) }\ndown(0)";
    let mut analyzer = SemanticAnalyzer::new();
    let program = quill::compile("test.ql", src, &mut analyzer).expect("compiles");
    let builtins = StandardBuiltins::new(b"".as_slice(), Vec::new());
    let mut interp = Interpreter::with_config(builtins, Config::default().with_max_call_depth(2000));
    let fatal = interp.run(&program).unwrap_err();
    assert_eq!(fatal.kind, FatalKind::CallDepth);
    assert_eq!(fatal.message, "Maximum call depth of 2000 exceeded");
}

// ============================================
// Front-end Errors
// ============================================

#[test]
fn test_syntax_errors_reported_with_positions() {
    let mut analyzer = SemanticAnalyzer::new();
    let err = quill::compile("test.ql", "x <- (1 +)\ny <- ]\nz <- 3", &mut analyzer).unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }));
    insta::assert_snapshot!(render_plain(&err.diagnostics()), @r"
    Error: Expected expression, found ')' (line 1, column 10)
    Error: Expected expression, found ']' (line 2, column 6)
    ");
}

#[test]
fn test_lexer_error() {
    let mut analyzer = SemanticAnalyzer::new();
    let err = quill::compile("test.ql", "x <- 1 @ 2", &mut analyzer).unwrap_err();
    assert!(matches!(err, CompileError::Lexer { .. }));
    assert_eq!(err.span().map(|s| (s.line, s.column)), Some((1, 8)));
}

#[test]
fn test_integer_literal_out_of_range() {
    let mut analyzer = SemanticAnalyzer::new();
    let err = quill::compile("test.ql", "output(1)\nx <- 99999999999999999999", &mut analyzer)
        .unwrap_err();
    assert_eq!(
        render_plain(&err.diagnostics()),
        "Error: Integer literal 99999999999999999999 out of range (line 2, column 6)\n"
    );
}
