//! Tree-walking evaluator
//!
//! Statements return a [`Signal`] describing how control leaves them;
//! expressions return a [`Value`]. Any [`Fatal`] aborts the whole run.

use super::builtins::{self, Builtins};
use super::error::Fatal;
use super::scope::{block_scope, child_scope, loop_scope, Scope, ScopeRef, Symbol};
use super::value::{FunctionBody, Value};
use crate::ast::{AssignTarget, Block, Expr, FunctionDecl, Program, Spanned, Span, Stmt};
use crate::config::Config;
use std::ops::ControlFlow;
use std::rc::Rc;

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// How control leaves a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Fall through to the next statement
    Normal,
    /// `stop`: leave the innermost loop
    Break,
    /// `next`: start the innermost loop's next iteration
    Continue,
    /// `return`: unwind to the nearest call site with a value
    Return(Value),
}

impl Signal {
    /// What a loop does with its body's signal: keep iterating, or finish with
    /// the given signal (`Normal` after `stop`, the return itself otherwise).
    fn in_loop(self) -> ControlFlow<Signal> {
        match self {
            Signal::Normal | Signal::Continue => ControlFlow::Continue(()),
            Signal::Break => ControlFlow::Break(Signal::Normal),
            ret @ Signal::Return(_) => ControlFlow::Break(ret),
        }
    }
}

/// The interpreter
pub struct Interpreter<B: Builtins> {
    /// Global scope; function frames are rooted here
    global: ScopeRef,
    builtins: B,
    config: Config,
    /// Current depth of nested user calls
    call_depth: usize,
}

impl<B: Builtins> Interpreter<B> {
    /// Create an interpreter with default configuration
    pub fn new(builtins: B) -> Self {
        Self::with_config(builtins, Config::default())
    }

    pub fn with_config(builtins: B, config: Config) -> Self {
        let global = Scope::global();
        builtins::register(&global, &builtins);
        Interpreter {
            global,
            builtins,
            config,
            call_depth: 0,
        }
    }

    /// Execute a program in the global scope.
    ///
    /// Bindings persist across calls, so a REPL can feed one line at a time.
    pub fn run(&mut self, program: &Program) -> Result<(), Fatal> {
        tracing::debug!(statements = program.statements.len(), "run");
        let global = Rc::clone(&self.global);
        for stmt in &program.statements {
            // Stray top-level signals are rejected by the analyzer; ignore them here.
            self.exec_stmt(stmt, &global)?;
        }
        Ok(())
    }

    /// Evaluate a single expression in the global scope
    pub fn eval_expr(&mut self, expr: &Spanned<Expr>) -> Result<Value, Fatal> {
        let global = Rc::clone(&self.global);
        self.eval(expr, &global)
    }

    pub fn global_scope(&self) -> &ScopeRef {
        &self.global
    }

    pub fn builtins(&self) -> &B {
        &self.builtins
    }

    pub fn builtins_mut(&mut self) -> &mut B {
        &mut self.builtins
    }

    pub fn into_builtins(self) -> B {
        self.builtins
    }

    // ---- statements ----

    fn exec_stmt(&mut self, stmt: &Spanned<Stmt>, scope: &ScopeRef) -> Result<Signal, Fatal> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.exec_stmt_inner(stmt, scope)
        })
    }

    fn exec_stmt_inner(&mut self, stmt: &Spanned<Stmt>, scope: &ScopeRef) -> Result<Signal, Fatal> {
        match &stmt.node {
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
                Ok(Signal::Normal)
            }

            Stmt::Assign { target, value } => {
                self.exec_assign(target, value, scope)?;
                Ok(Signal::Normal)
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                if self.eval_condition(cond, scope)? {
                    self.exec_block(then_block, &block_scope(scope))
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block, &block_scope(scope))
                } else {
                    Ok(Signal::Normal)
                }
            }

            Stmt::While { cond, body } => {
                while self.eval_condition(cond, scope)? {
                    if let ControlFlow::Break(signal) =
                        self.exec_block(body, &loop_scope(scope))?.in_loop()
                    {
                        return Ok(signal);
                    }
                }
                Ok(Signal::Normal)
            }

            Stmt::For {
                var,
                iterable,
                body,
            } => self.exec_for(var, iterable, body, scope),

            Stmt::Repeat { count, body } => {
                let times = match self.eval(count, scope)? {
                    Value::Int(n) => n,
                    other => {
                        return Err(Fatal::type_mismatch(
                            "Repeat count",
                            "int",
                            other.kind(),
                            count.span,
                        ))
                    }
                };
                for _ in 0..times.max(0) {
                    if let ControlFlow::Break(signal) =
                        self.exec_block(body, &loop_scope(scope))?.in_loop()
                    {
                        return Ok(signal);
                    }
                }
                Ok(Signal::Normal)
            }

            Stmt::Function(decl) => {
                tracing::debug!(name = %decl.name.node, arity = decl.arity(), "declare function");
                let function = super::value::Function::user(Rc::clone(decl));
                scope.borrow_mut().insert(Symbol::new(
                    decl.name.node.clone(),
                    Some(Value::Function(Rc::new(function))),
                ));
                Ok(Signal::Normal)
            }

            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Void,
                };
                Ok(Signal::Return(value))
            }

            Stmt::Stop => Ok(Signal::Break),
            Stmt::Next => Ok(Signal::Continue),
        }
    }

    /// Run statements in order, stopping at the first non-normal signal.
    fn exec_block(&mut self, block: &Block, scope: &ScopeRef) -> Result<Signal, Fatal> {
        for stmt in &block.statements {
            let signal = self.exec_stmt(stmt, scope)?;
            if signal != Signal::Normal {
                return Ok(signal);
            }
        }
        Ok(Signal::Normal)
    }

    fn exec_for(
        &mut self,
        var: &Spanned<String>,
        iterable: &Spanned<Expr>,
        body: &Block,
        scope: &ScopeRef,
    ) -> Result<Signal, Fatal> {
        let items = self.eval(iterable, scope)?;
        if !matches!(items, Value::Array(_) | Value::Str(_)) {
            return Err(Fatal::type_mismatch(
                "For loop iterable",
                "array or string",
                items.kind(),
                iterable.span,
            ));
        }

        let loop_scope = loop_scope(scope);
        let mut index = 0;
        while index < items.length().unwrap_or(0) {
            let item = items
                .subscript(&Value::Int(index as i64))
                .map_err(|e| Fatal::subscript(&items, &Value::Int(index as i64), e, iterable.span))?;
            loop_scope
                .borrow_mut()
                .insert(Symbol::new(var.node.clone(), Some(item)));
            if let ControlFlow::Break(signal) =
                self.exec_block(body, &block_scope(&loop_scope))?.in_loop()
            {
                return Ok(signal);
            }
            index += 1;
        }
        Ok(Signal::Normal)
    }

    fn exec_assign(
        &mut self,
        target: &Spanned<AssignTarget>,
        value: &Spanned<Expr>,
        scope: &ScopeRef,
    ) -> Result<(), Fatal> {
        let value_span = value.span;
        let value = self.eval(value, scope)?;
        if matches!(value, Value::Void) {
            return Err(Fatal::void_assignment(value_span));
        }

        match &target.node {
            AssignTarget::Identifier(name) => {
                let mut scope = scope.borrow_mut();
                if scope.contains(name, false) {
                    scope.assign(name, value);
                } else {
                    scope.insert(Symbol::new(name.clone(), Some(value)));
                }
                Ok(())
            }
            AssignTarget::Subscript { base, index } => {
                let container = self.eval(base, scope)?;
                let index_value = self.eval(index, scope)?;
                container
                    .subscript_update(&index_value, value)
                    .map_err(|e| Fatal::subscript(&container, &index_value, e, target.span))
            }
        }
    }

    fn eval_condition(&mut self, cond: &Spanned<Expr>, scope: &ScopeRef) -> Result<bool, Fatal> {
        match self.eval(cond, scope)? {
            Value::Bool(b) => Ok(b),
            other => Err(Fatal::type_mismatch("Condition", "bool", other.kind(), cond.span)),
        }
    }

    // ---- expressions ----

    fn eval(&mut self, expr: &Spanned<Expr>, scope: &ScopeRef) -> Result<Value, Fatal> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, scope))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>, scope: &ScopeRef) -> Result<Value, Fatal> {
        match &expr.node {
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::FloatLit(x) => Ok(Value::Float(*x)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::StringLit(s) => Ok(Value::string(s.as_str())),

            Expr::ArrayLit(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, scope)?);
                }
                Ok(Value::array(values))
            }

            Expr::Var(name) => {
                let symbol = scope.borrow().lookup(name, false);
                match symbol.and_then(|s| s.value) {
                    Some(Value::Function(_)) => Err(Fatal::is_function(name, expr.span)),
                    Some(value) => Ok(value),
                    None => Err(Fatal::undeclared(name, expr.span)),
                }
            }

            Expr::Binary { left, op, right } => {
                let lhs = self.eval(left, scope)?;
                let rhs = self.eval(right, scope)?;
                lhs.binary(*op, &rhs)
                    .map_err(|e| Fatal::binary(*op, &lhs, &rhs, e, expr.span))
            }

            Expr::Unary { op, expr: operand } => {
                let value = self.eval(operand, scope)?;
                value
                    .unary(*op)
                    .map_err(|e| Fatal::unary(*op, &value, e, expr.span))
            }

            Expr::Range { start, end } => {
                let from = self.eval(start, scope)?;
                let to = self.eval(end, scope)?;
                match (&from, &to) {
                    (Value::Int(a), Value::Int(b)) => Ok(range_array(*a, *b)),
                    (Value::Int(_), other) | (other, _) => Err(Fatal::type_mismatch(
                        "Range bound",
                        "int",
                        other.kind(),
                        expr.span,
                    )),
                }
            }

            Expr::Index { base, index } => {
                let container = self.eval(base, scope)?;
                let index_value = self.eval(index, scope)?;
                container
                    .subscript(&index_value)
                    .map_err(|e| Fatal::subscript(&container, &index_value, e, expr.span))
            }

            Expr::Call { func, args } => self.call(func, args, scope),

            Expr::Cast { target, expr: operand } => {
                let value = self.eval(operand, scope)?;
                value
                    .cast(*target)
                    .map_err(|e| Fatal::cast(&value, *target, e, expr.span))
            }
        }
    }

    // ---- calls ----

    fn call(
        &mut self,
        func: &Spanned<String>,
        args: &[Spanned<Expr>],
        scope: &ScopeRef,
    ) -> Result<Value, Fatal> {
        let symbol = scope.borrow().lookup(&func.node, false);
        let function = match symbol.and_then(|s| s.value) {
            Some(Value::Function(function)) => function,
            Some(_) => return Err(Fatal::not_function(&func.node, func.span)),
            None => return Err(Fatal::undeclared(&func.node, func.span)),
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, scope)?);
        }
        if values.len() != function.arity {
            return Err(Fatal::arity(&func.node, func.span));
        }

        match &function.body {
            FunctionBody::Builtin => self.builtins.invoke(&function.name, values, func.span),
            FunctionBody::User(decl) => self.call_user(decl, values, func.span),
        }
    }

    /// Run a user function in a frame rooted at the global scope.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %decl.name.node, depth = self.call_depth))]
    fn call_user(&mut self, decl: &FunctionDecl, args: Vec<Value>, span: Span) -> Result<Value, Fatal> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(Fatal::call_depth(self.config.max_call_depth, span));
        }

        let frame = child_scope(&self.global, false, true);
        {
            let mut frame = frame.borrow_mut();
            for (param, value) in decl.params.iter().zip(args) {
                frame.insert(Symbol::new(param.node.clone(), Some(value)));
            }
        }

        self.call_depth += 1;
        let result = self.exec_block(&decl.body, &frame);
        self.call_depth -= 1;

        match result? {
            Signal::Return(value) => Ok(value),
            Signal::Normal | Signal::Break | Signal::Continue => Ok(Value::Void),
        }
    }
}

/// Inclusive range stepping by one toward `end`.
fn range_array(start: i64, end: i64) -> Value {
    let values = if start <= end {
        (start..=end).map(Value::Int).collect()
    } else {
        (end..=start).rev().map(Value::Int).collect()
    };
    Value::array(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::builtins::StandardBuiltins;
    use crate::interp::error::FatalKind;

    type TestInterpreter = Interpreter<StandardBuiltins<&'static [u8], Vec<u8>>>;

    fn interpreter() -> TestInterpreter {
        Interpreter::new(StandardBuiltins::new(b"".as_slice(), Vec::new()))
    }

    fn spanned<T>(node: T) -> Spanned<T> {
        Spanned::new(node, Span::default())
    }

    fn int(n: i64) -> Box<Spanned<Expr>> {
        Box::new(spanned(Expr::IntLit(n)))
    }

    fn parse_source(source: &str) -> Program {
        let tokens = crate::lexer::tokenize(source).expect("tokenize failed");
        crate::parser::parse("test.ql", source, tokens).expect("parse failed")
    }

    /// Run without static analysis so runtime checks are exercised directly.
    fn run_source(source: &str) -> Result<String, Fatal> {
        let program = parse_source(source);
        let mut interp = interpreter();
        interp.run(&program)?;
        Ok(String::from_utf8(interp.into_builtins().into_output()).expect("utf-8 output"))
    }

    fn output_of(source: &str) -> String {
        run_source(source).expect("run failed")
    }

    fn fatal_of(source: &str) -> Fatal {
        run_source(source).expect_err("expected a fatal error")
    }

    #[test]
    fn test_eval_literals() {
        let mut interp = interpreter();
        assert_eq!(interp.eval_expr(&spanned(Expr::IntLit(42))).unwrap(), Value::Int(42));
        assert_eq!(interp.eval_expr(&spanned(Expr::BoolLit(true))).unwrap(), Value::Bool(true));
        assert_eq!(
            interp.eval_expr(&spanned(Expr::StringLit("s".to_string()))).unwrap(),
            Value::string("s")
        );
    }

    #[test]
    fn test_eval_binary() {
        let mut interp = interpreter();
        let expr = Expr::Binary {
            left: int(2),
            op: crate::ast::BinOp::Add,
            right: int(3),
        };
        assert_eq!(interp.eval_expr(&spanned(expr)).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_eval_range() {
        let mut interp = interpreter();
        let up = interp
            .eval_expr(&spanned(Expr::Range { start: int(1), end: int(3) }))
            .unwrap();
        assert_eq!(up, Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        let down = interp
            .eval_expr(&spanned(Expr::Range { start: int(2), end: int(0) }))
            .unwrap();
        assert_eq!(down, Value::array(vec![Value::Int(2), Value::Int(1), Value::Int(0)]));
        let single = interp
            .eval_expr(&spanned(Expr::Range { start: int(4), end: int(4) }))
            .unwrap();
        assert_eq!(single, Value::array(vec![Value::Int(4)]));
    }

    #[test]
    fn test_signal_in_loop() {
        assert_eq!(Signal::Normal.in_loop(), ControlFlow::Continue(()));
        assert_eq!(Signal::Continue.in_loop(), ControlFlow::Continue(()));
        assert_eq!(Signal::Break.in_loop(), ControlFlow::Break(Signal::Normal));
        assert_eq!(
            Signal::Return(Value::Int(1)).in_loop(),
            ControlFlow::Break(Signal::Return(Value::Int(1)))
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(output_of("output(1 * (2 + 3 * 4) / 5 - 6 % 4)"), "0\n");
    }

    #[test]
    fn test_for_over_range() {
        let expected: String = (1..=10).map(|i| format!("{i}\n")).collect();
        assert_eq!(output_of("for i in 1..10 {output(i)}"), expected);
    }

    #[test]
    fn test_for_over_string() {
        assert_eq!(output_of("for c in \"ab\" { output(c) }"), "a\nb\n");
    }

    #[test]
    fn test_for_sees_element_updates() {
        let src = "a <- [1, 2, 3]\nfor x in a { a[2] <- 30\n output(x) }";
        assert_eq!(output_of(src), "1\n2\n30\n");
    }

    #[test]
    fn test_while_and_stop() {
        let src = "i <- 0\nwhile true { i <- i + 1\n if i = 3 { stop } }\noutput(i)";
        assert_eq!(output_of(src), "3\n");
    }

    #[test]
    fn test_next_skips_rest_of_body() {
        let src = "for i in 1..5 { if i % 2 = 0 { next }\n output(i) }";
        assert_eq!(output_of(src), "1\n3\n5\n");
    }

    #[test]
    fn test_repeat() {
        assert_eq!(output_of("repeat 3 { output(\"x\") }"), "x\nx\nx\n");
        assert_eq!(output_of("repeat 0 { output(\"x\") }\noutput(1)"), "1\n");
        assert_eq!(output_of("repeat -2 { output(\"x\") }\noutput(1)"), "1\n");
    }

    #[test]
    fn test_return_unwinds_nested_loops() {
        let src = "function find(a, target) {\n\
                     for i in 0..2 {\n\
                       for j in 0..2 {\n\
                         if a[i][j] = target { return [i, j] }\n\
                       }\n\
                     }\n\
                     return [-1, -1]\n\
                   }\n\
                   output(find([[1, 2, 3], [4, 5, 6], [7, 8, 9]], 6))\n\
                   output(find([[1, 2, 3], [4, 5, 6], [7, 8, 9]], 10))";
        assert_eq!(output_of(src), "[1, 2]\n[-1, -1]\n");
    }

    #[test]
    fn test_return_inside_while_in_function() {
        let src = "function first_over(limit) { n <- 1\n while true { n <- n * 2\n if n > limit { return n } } }\n\
                   output(first_over(50))";
        assert_eq!(output_of(src), "64\n");
    }

    #[test]
    fn test_function_without_return_is_void() {
        let src = "function noop() { x <- 1 }\noutput(noop())";
        assert_eq!(output_of(src), "void\n");
    }

    #[test]
    fn test_bare_return_is_void() {
        let src = "function early(x) { if x { return }\n output(\"late\") }\nearly(true)\nearly(false)";
        assert_eq!(output_of(src), "late\n");
    }

    #[test]
    fn test_recursion() {
        let src = "function fact(n) { if n <= 1 { return 1 }\n return n * fact(n - 1) }\noutput(fact(10))";
        assert_eq!(output_of(src), "3628800\n");
    }

    #[test]
    fn test_function_cannot_see_caller_locals() {
        let src = "function peek() { return hidden }\nif true { hidden <- 1\n output(peek()) }";
        let err = fatal_of(src);
        assert_eq!(err.kind, FatalKind::Undeclared);
        assert_eq!(err.message, "Undeclared identifier 'hidden'");
    }

    #[test]
    fn test_function_sees_globals() {
        let src = "g <- 5\nfunction get() { return g }\noutput(get())";
        assert_eq!(output_of(src), "5\n");
    }

    #[test]
    fn test_function_assigns_global() {
        let src = "count <- 0\nfunction bump() { count <- count + 1 }\nbump()\nbump()\noutput(count)";
        assert_eq!(output_of(src), "2\n");
    }

    #[test]
    fn test_parameters_are_frame_local() {
        let src = "function f(p) { return p }\noutput(f(1))\np <- 2\noutput(p)";
        assert_eq!(output_of(src), "1\n2\n");
    }

    #[test]
    fn test_assignment_updates_outer_binding() {
        let src = "x <- 1\nif true { x <- 2\n y <- 3 }\noutput(x)";
        assert_eq!(output_of(src), "2\n");
    }

    #[test]
    fn test_block_local_invisible_outside() {
        let err = fatal_of("if true { y <- 3 }\noutput(y)");
        assert_eq!(err.message, "Undeclared identifier 'y'");
        assert_eq!((err.span.line, err.span.column), (2, 8));
    }

    #[test]
    fn test_nested_mutation_through_alias() {
        let src = "a <- [[1, 2, [3, 4, 5], 6, [7]], 8, [9, 10]]\n\
                   a[0] <- [1, 2, [3]]\n\
                   output(a[0][2][0])";
        assert_eq!(output_of(src), "3\n");
    }

    #[test]
    fn test_plain_assignment_aliases_arrays() {
        let src = "a <- [1, 2]\nb <- a\nb[0] <- 9\noutput(a)";
        assert_eq!(output_of(src), "[9, 2]\n");
    }

    #[test]
    fn test_nested_subscript_assignment() {
        let src = "m <- [[0, 0], [0, 0]]\nrow <- m[1]\nm[1][0] <- 5\noutput(row)\noutput(m)";
        assert_eq!(output_of(src), "[5, 0]\n[[0, 0], [5, 0]]\n");
    }

    #[test]
    fn test_replication_copies() {
        let src = "a <- [[0]] * 2\na[0][0] <- 1\noutput(a)";
        assert_eq!(output_of(src), "[[1], [0]]\n");
    }

    #[test]
    fn test_cast_array_copies() {
        let src = "a <- [1]\nb <- array(a)\nb[0] <- 2\noutput(a)\noutput(b)";
        assert_eq!(output_of(src), "[1]\n[2]\n");
    }

    #[test]
    fn test_casts() {
        let src = "output(int(\"12\") + 1)\noutput(float(1))\noutput(string(3) + \"!\")\noutput(bool(0))";
        assert_eq!(output_of(src), "13\n1.0\n3!\nfalse\n");
    }

    #[test]
    fn test_unsupported_operator_is_fatal() {
        let err = fatal_of("x <- 1 + \"a\"");
        assert_eq!(err.kind, FatalKind::Operator);
        assert_eq!(err.message, "Unsupported operator '+' for types 'int' and 'string'");
        assert_eq!((err.span.line, err.span.column), (1, 6));
    }

    #[test]
    fn test_fatal_stops_execution() {
        let out = run_source("output(1)\noutput(1 / 0)\noutput(2)");
        let err = out.unwrap_err();
        assert_eq!(err.kind, FatalKind::DivisionByZero);
        assert_eq!(err.span.line, 2);
    }

    #[test]
    fn test_assign_void_is_fatal() {
        let err = fatal_of("x <- output(1)");
        assert_eq!(err.kind, FatalKind::VoidAssignment);
        assert_eq!(err.message, "cannot assign void");
    }

    #[test]
    fn test_subscript_out_of_range_is_fatal() {
        let err = fatal_of("a <- [1]\na[1] <- 2");
        assert_eq!(err.kind, FatalKind::Subscript);
        let err = fatal_of("a <- [1]\noutput(a[3])");
        assert_eq!(err.kind, FatalKind::Subscript);
    }

    #[test]
    fn test_condition_must_be_bool() {
        let err = fatal_of("if 1 { output(1) }");
        assert_eq!(err.message, "Condition must be bool, found 'int'");
        let err = fatal_of("while \"yes\" { stop }");
        assert_eq!(err.kind, FatalKind::TypeMismatch);
    }

    #[test]
    fn test_loop_operand_kinds() {
        assert_eq!(fatal_of("for x in 5 { output(x) }").kind, FatalKind::TypeMismatch);
        assert_eq!(fatal_of("repeat 1.5 { output(1) }").kind, FatalKind::TypeMismatch);
        assert_eq!(fatal_of("x <- 1..2.0").kind, FatalKind::TypeMismatch);
    }

    #[test]
    fn test_runtime_arity_mismatch() {
        let err = fatal_of("function f(a) { return a }\nf(1, 2)");
        assert_eq!(err.kind, FatalKind::Arity);
    }

    #[test]
    fn test_call_depth_limit() {
        let program = parse_source("function down(n) { return down(n + 1) }\ndown(0)");
        let builtins = StandardBuiltins::new(b"".as_slice(), Vec::new());
        let mut interp = Interpreter::with_config(builtins, Config::default().with_max_call_depth(50));
        let err = interp.run(&program).unwrap_err();
        assert_eq!(err.kind, FatalKind::CallDepth);
    }

    #[test]
    fn test_bindings_persist_between_runs() {
        let mut interp = interpreter();
        interp.run(&parse_source("x <- 41")).unwrap();
        interp.run(&parse_source("output(x + 1)")).unwrap();
        assert_eq!(interp.builtins().output().as_slice(), b"42\n");
    }
}
