//! Static semantic analysis
//!
//! Walks the AST building scopes exactly the way the interpreter will, and
//! reports identifier and control-statement misuse without evaluating
//! anything. Variables are recorded as placeholder symbols; functions and
//! builtins carry their real `Function` values so call arity can be checked.

use crate::ast::{AssignTarget, Block, Expr, FunctionDecl, Program, Span, Spanned, Stmt};
use crate::error::{Diagnostic, Reporter};
use crate::interp::builtins::{self, Builtins};
use crate::interp::scope::{block_scope, child_scope, loop_scope, Scope, ScopeRef, Symbol};
use crate::interp::value::{Function, Value};
use std::rc::Rc;

/// Semantic analyzer
///
/// The global scope persists across [`analyze`](Self::analyze) calls so a
/// REPL can check one line at a time against earlier declarations.
pub struct SemanticAnalyzer {
    global: ScopeRef,
    reporter: Reporter,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    /// Analyzer that knows the standard builtins
    pub fn new() -> Self {
        let global = Scope::global();
        builtins::register_signatures(&global, builtins::STANDARD);
        SemanticAnalyzer {
            global,
            reporter: Reporter::new(),
        }
    }

    /// Analyzer that knows the builtins of a custom provider
    pub fn with_builtins(builtins: &dyn Builtins) -> Self {
        let global = Scope::global();
        builtins::register(&global, builtins);
        SemanticAnalyzer {
            global,
            reporter: Reporter::new(),
        }
    }

    /// Analyze a program, returning every diagnostic found.
    pub fn analyze(&mut self, program: &Program) -> Vec<Diagnostic> {
        let global = Rc::clone(&self.global);
        for stmt in &program.statements {
            self.analyze_stmt(stmt, &global);
        }
        let diagnostics = std::mem::take(&mut self.reporter).into_diagnostics();
        tracing::debug!(errors = diagnostics.len(), "analysis finished");
        diagnostics
    }

    pub fn global_scope(&self) -> &ScopeRef {
        &self.global
    }

    fn error(&mut self, message: String, span: Span) {
        self.reporter.report(message, span, true);
    }

    /// A variable use must name a declared, non-function symbol.
    fn check_identifier(&mut self, name: &str, span: Span, scope: &ScopeRef) {
        let symbol = scope.borrow().lookup(name, false);
        match symbol {
            None => self.error(format!("Undeclared identifier '{name}'"), span),
            Some(symbol) if matches!(symbol.value, Some(Value::Function(_))) => {
                self.error(format!("Identifier '{name}' is a function"), span)
            }
            Some(_) => {}
        }
    }

    fn analyze_stmt(&mut self, stmt: &Spanned<Stmt>, scope: &ScopeRef) {
        match &stmt.node {
            Stmt::Expr(expr) => self.analyze_expr(expr, scope),

            Stmt::Assign { target, value } => {
                self.analyze_expr(value, scope);
                match &target.node {
                    AssignTarget::Identifier(name) => {
                        let declared = scope.borrow().contains(name, false);
                        if !declared {
                            tracing::trace!(%name, "declare variable");
                            scope.borrow_mut().insert(Symbol::new(name.clone(), None));
                        }
                    }
                    AssignTarget::Subscript { base, index } => {
                        // Element updates never declare; the root must exist
                        if let Some((root, span)) = AssignTarget::root(target) {
                            self.check_identifier(root, span, scope);
                        }
                        self.analyze_expr(base, scope);
                        self.analyze_expr(index, scope);
                    }
                }
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                self.analyze_expr(cond, scope);
                self.analyze_block(then_block, &block_scope(scope));
                if let Some(else_block) = else_block {
                    self.analyze_block(else_block, &block_scope(scope));
                }
            }

            Stmt::While { cond, body } => {
                self.analyze_expr(cond, scope);
                self.analyze_block(body, &loop_scope(scope));
            }

            Stmt::For {
                var,
                iterable,
                body,
            } => {
                self.analyze_expr(iterable, scope);
                let loop_scope = loop_scope(scope);
                loop_scope
                    .borrow_mut()
                    .insert(Symbol::new(var.node.clone(), None));
                self.analyze_block(body, &block_scope(&loop_scope));
            }

            Stmt::Repeat { count, body } => {
                self.analyze_expr(count, scope);
                self.analyze_block(body, &loop_scope(scope));
            }

            Stmt::Function(decl) => self.analyze_function(decl, scope),

            Stmt::Return(value) => {
                if !scope.borrow().is_function() {
                    self.error("'return' statement outside of function".to_string(), stmt.span);
                }
                if let Some(value) = value {
                    self.analyze_expr(value, scope);
                }
            }

            Stmt::Stop => self.check_in_loop("stop", stmt, scope),
            Stmt::Next => self.check_in_loop("next", stmt, scope),
        }
    }

    fn analyze_block(&mut self, block: &Block, scope: &ScopeRef) {
        for stmt in &block.statements {
            self.analyze_stmt(stmt, scope);
        }
    }

    fn check_in_loop(&mut self, keyword: &str, stmt: &Spanned<Stmt>, scope: &ScopeRef) {
        if !scope.borrow().is_loop() {
            self.error(format!("'{keyword}' statement outside of loop"), stmt.span);
        }
    }

    fn analyze_function(&mut self, decl: &Rc<FunctionDecl>, scope: &ScopeRef) {
        let name = &decl.name.node;
        let at_global = scope.borrow().is_global_scope();
        if !at_global {
            self.error(
                "Function declaration outside of global scope".to_string(),
                decl.span,
            );
        }

        let redeclared = at_global && scope.borrow().contains(name, true);
        if redeclared {
            self.error(format!("Identifier '{name}' already declared"), decl.name.span);
        } else {
            tracing::trace!(%name, arity = decl.arity(), "declare function");
            let function = Function::user(Rc::clone(decl));
            scope.borrow_mut().insert(Symbol::new(
                name.clone(),
                Some(Value::Function(Rc::new(function))),
            ));
        }

        let params = child_scope(scope, false, true);
        for param in &decl.params {
            params
                .borrow_mut()
                .insert(Symbol::new(param.node.clone(), None));
        }
        self.analyze_block(&decl.body, &params);
    }

    fn analyze_expr(&mut self, expr: &Spanned<Expr>, scope: &ScopeRef) {
        match &expr.node {
            Expr::IntLit(_) | Expr::FloatLit(_) | Expr::BoolLit(_) | Expr::StringLit(_) => {}

            Expr::ArrayLit(elements) => {
                for element in elements {
                    self.analyze_expr(element, scope);
                }
            }

            Expr::Var(name) => self.check_identifier(name, expr.span, scope),

            Expr::Binary { left, right, .. } => {
                self.analyze_expr(left, scope);
                self.analyze_expr(right, scope);
            }

            Expr::Unary { expr: operand, .. } | Expr::Cast { expr: operand, .. } => {
                self.analyze_expr(operand, scope)
            }

            Expr::Range { start, end } => {
                self.analyze_expr(start, scope);
                self.analyze_expr(end, scope);
            }

            Expr::Index { base, index } => {
                self.analyze_expr(base, scope);
                self.analyze_expr(index, scope);
            }

            Expr::Call { func, args } => {
                let name = &func.node;
                let symbol = scope.borrow().lookup(name, false);
                match symbol.map(|s| s.value) {
                    None => self.error(format!("Undeclared identifier '{name}'"), func.span),
                    Some(Some(Value::Function(function))) => {
                        if function.arity != args.len() {
                            self.error(
                                format!("Incorrect number of arguments to function '{name}'"),
                                func.span,
                            );
                        }
                    }
                    Some(_) => {
                        self.error(format!("Identifier '{name}' is not a function"), func.span)
                    }
                }
                for arg in args {
                    self.analyze_expr(arg, scope);
                }
            }
        }
    }
}
