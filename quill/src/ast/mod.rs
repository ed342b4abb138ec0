//! Abstract Syntax Tree definitions

mod expr;
mod span;

pub use expr::*;
pub use span::*;

use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A program is a sequence of top-level statements
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Spanned<Stmt>>,
}

/// Braced statement list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Spanned<Stmt>>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression evaluated for its side effects
    Expr(Spanned<Expr>),

    /// Assignment: target <- value
    Assign {
        target: Spanned<AssignTarget>,
        value: Spanned<Expr>,
    },

    /// Conditional; `else if` chains nest inside `else_block`
    If {
        cond: Spanned<Expr>,
        then_block: Block,
        else_block: Option<Block>,
    },

    /// while cond { body }
    While { cond: Spanned<Expr>, body: Block },

    /// for var in iterable { body }
    For {
        var: Spanned<String>,
        iterable: Spanned<Expr>,
        body: Block,
    },

    /// repeat count { body }
    Repeat { count: Spanned<Expr>, body: Block },

    /// Function declaration
    Function(Rc<FunctionDecl>),

    /// return [value]
    Return(Option<Spanned<Expr>>),

    /// Leave the innermost loop
    Stop,

    /// Skip to the next iteration of the innermost loop
    Next,
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssignTarget {
    /// Bare identifier
    Identifier(String),
    /// Subscript chain rooted at an identifier: a[i][j]
    Subscript {
        base: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
}

impl AssignTarget {
    /// Root identifier (name and span) of the target.
    pub fn root<'a>(target: &'a Spanned<AssignTarget>) -> Option<(&'a str, Span)> {
        match &target.node {
            AssignTarget::Identifier(name) => Some((name, target.span)),
            AssignTarget::Subscript { base, .. } => {
                Expr::root_identifier(base).and_then(|root| match &root.node {
                    Expr::Var(name) => Some((name.as_str(), root.span)),
                    _ => None,
                })
            }
        }
    }
}

/// Function declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Spanned<String>,
    pub params: Vec<Spanned<String>>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
