//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    IntLit(i64),
    /// Float literal
    FloatLit(f64),
    /// Boolean literal
    BoolLit(bool),
    /// String literal (escapes already resolved)
    StringLit(String),
    /// Array literal: [a, b, c]
    ArrayLit(Vec<Spanned<Expr>>),

    /// Variable reference
    Var(String),

    /// Binary operation
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },

    /// Unary operation
    Unary {
        op: UnOp,
        expr: Box<Spanned<Expr>>,
    },

    /// Inclusive integer range: start..end
    Range {
        start: Box<Spanned<Expr>>,
        end: Box<Spanned<Expr>>,
    },

    /// Subscript: base[index]
    Index {
        base: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },

    /// Function call
    Call {
        func: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },

    /// Conversion: int(x), float(x), bool(x), string(x), array(x)
    Cast {
        target: CastTarget,
        expr: Box<Spanned<Expr>>,
    },
}

impl Expr {
    /// Root identifier of a subscript chain (`a` for `a[1][2]`).
    pub fn root_identifier(expr: &Spanned<Expr>) -> Option<&Spanned<Expr>> {
        match &expr.node {
            Expr::Var(_) => Some(expr),
            Expr::Index { base, .. } => Expr::root_identifier(base),
            _ => None,
        }
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    // Logical
    And,
    Or,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::BitAnd => write!(f, "&"),
            BinOp::BitOr => write!(f, "|"),
            BinOp::BitXor => write!(f, "^"),
            BinOp::Eq => write!(f, "="),
            BinOp::Ne => write!(f, "!="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Gt => write!(f, ">"),
            BinOp::Le => write!(f, "<="),
            BinOp::Ge => write!(f, ">="),
            BinOp::And => write!(f, "and"),
            BinOp::Or => write!(f, "or"),
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    /// Unary plus (+)
    Pos,
    /// Negation (-)
    Neg,
    /// Bitwise not (~)
    BitNot,
    /// Logical not
    Not,
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Pos => write!(f, "+"),
            UnOp::Neg => write!(f, "-"),
            UnOp::BitNot => write!(f, "~"),
            UnOp::Not => write!(f, "not"),
        }
    }
}

/// Target kind of a conversion expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastTarget {
    Int,
    Float,
    Bool,
    String,
    Array,
}

impl std::fmt::Display for CastTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CastTarget::Int => "int",
            CastTarget::Float => "float",
            CastTarget::Bool => "bool",
            CastTarget::String => "string",
            CastTarget::Array => "array",
        };
        f.write_str(name)
    }
}
