//! Fatal runtime errors
//!
//! The first fatal condition aborts interpretation. Nothing inside the
//! evaluator catches a `Fatal`; it propagates to the caller of
//! [`Interpreter::run`](super::Interpreter::run), which reports it and stops.

use super::value::{OpError, Value, ValueKind};
use crate::ast::{BinOp, CastTarget, Span, UnOp};
use thiserror::Error;

/// Runtime abort with the position of the offending node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error: {message} ({span})")]
pub struct Fatal {
    pub kind: FatalKind,
    pub message: String,
    pub span: Span,
}

/// Kinds of runtime aborts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// Operator applied to unsupported operand kinds
    Operator,
    /// Division or modulo by zero
    DivisionByZero,
    /// Integer overflow or an oversized replication
    Overflow,
    /// Invalid or failed conversion
    Cast,
    /// Bad subscript or subscript assignment
    Subscript,
    /// Assignment of a void value
    VoidAssignment,
    /// Condition, iterable, count or range of the wrong kind
    TypeMismatch,
    /// Name not bound at runtime
    Undeclared,
    /// Call target is not a function, or a function used as a value
    NotCallable,
    /// Argument count mismatch
    Arity,
    /// Call depth limit reached
    CallDepth,
    /// Builtin I/O failure or bad builtin argument
    Builtin,
}

impl Fatal {
    pub fn new(kind: FatalKind, message: impl Into<String>, span: Span) -> Self {
        Fatal {
            kind,
            message: message.into(),
            span,
        }
    }

    /// Failure of a binary operator.
    pub fn binary(op: BinOp, lhs: &Value, rhs: &Value, err: OpError, span: Span) -> Self {
        match err {
            OpError::Unsupported => Fatal::new(
                FatalKind::Operator,
                format!(
                    "Unsupported operator '{op}' for types '{}' and '{}'",
                    lhs.kind(),
                    rhs.kind()
                ),
                span,
            ),
            other => Fatal::from_op_error(&op.to_string(), other, span),
        }
    }

    /// Failure of a unary operator.
    pub fn unary(op: UnOp, operand: &Value, err: OpError, span: Span) -> Self {
        match err {
            OpError::Unsupported => Fatal::new(
                FatalKind::Operator,
                format!("Unsupported operator '{op}' for type '{}'", operand.kind()),
                span,
            ),
            other => Fatal::from_op_error(&op.to_string(), other, span),
        }
    }

    pub fn cast(value: &Value, target: CastTarget, err: OpError, span: Span) -> Self {
        let message = match err {
            OpError::Unsupported => format!("Cannot cast '{}' to '{target}'", value.kind()),
            other => format!("Invalid cast: {other}"),
        };
        Fatal::new(FatalKind::Cast, message, span)
    }

    pub fn subscript(base: &Value, index: &Value, err: OpError, span: Span) -> Self {
        let message = match err {
            OpError::Unsupported => format!(
                "Cannot subscript '{}' with '{}'",
                base.kind(),
                index.kind()
            ),
            other => format!("Invalid subscript: {other}"),
        };
        Fatal::new(FatalKind::Subscript, message, span)
    }

    pub fn void_assignment(span: Span) -> Self {
        Fatal::new(FatalKind::VoidAssignment, "cannot assign void", span)
    }

    pub fn type_mismatch(what: &str, expected: &str, found: ValueKind, span: Span) -> Self {
        Fatal::new(
            FatalKind::TypeMismatch,
            format!("{what} must be {expected}, found '{found}'"),
            span,
        )
    }

    pub fn undeclared(name: &str, span: Span) -> Self {
        Fatal::new(
            FatalKind::Undeclared,
            format!("Undeclared identifier '{name}'"),
            span,
        )
    }

    pub fn is_function(name: &str, span: Span) -> Self {
        Fatal::new(
            FatalKind::NotCallable,
            format!("Identifier '{name}' is a function"),
            span,
        )
    }

    pub fn not_function(name: &str, span: Span) -> Self {
        Fatal::new(
            FatalKind::NotCallable,
            format!("Identifier '{name}' is not a function"),
            span,
        )
    }

    pub fn arity(name: &str, span: Span) -> Self {
        Fatal::new(
            FatalKind::Arity,
            format!("Incorrect number of arguments to function '{name}'"),
            span,
        )
    }

    pub fn call_depth(limit: usize, span: Span) -> Self {
        Fatal::new(
            FatalKind::CallDepth,
            format!("Maximum call depth of {limit} exceeded"),
            span,
        )
    }

    pub fn builtin(message: impl Into<String>, span: Span) -> Self {
        Fatal::new(FatalKind::Builtin, message, span)
    }

    fn from_op_error(op: &str, err: OpError, span: Span) -> Self {
        match err {
            OpError::DivisionByZero => Fatal::new(FatalKind::DivisionByZero, "Division by zero", span),
            OpError::Overflow => Fatal::new(
                FatalKind::Overflow,
                format!("Overflow in '{op}'"),
                span,
            ),
            other => Fatal::new(
                FatalKind::Operator,
                format!("Invalid operands for '{op}': {other}"),
                span,
            ),
        }
    }
}
