//! Runtime values for the interpreter
//!
//! Every operator is a method returning [`OpResult`]. An unsupported operand
//! combination yields `Err(OpError::Unsupported)` and the evaluator turns it
//! into a fatal error that names the operator and both operand kinds.

use crate::ast::{BinOp, CastTarget, FunctionDecl, UnOp};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Shared, mutable array storage. Cloning a `Value::Array` aliases it.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Outcome of a value operation
pub type OpResult = Result<Value, OpError>;

/// Why a value operation could not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("unsupported operand kinds")]
    Unsupported,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result too large")]
    Overflow,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("negative repetition count {0}")]
    NegativeCount(i64),
    #[error("cannot convert {value} to {target}")]
    InvalidConversion { value: String, target: CastTarget },
}

/// Kind tag of a value (or of a symbol without one)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    String,
    Array,
    Function,
    Void,
    Undefined,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Function => "function",
            ValueKind::Void => "void",
            ValueKind::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// Callable stored in a symbol
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub arity: usize,
    pub body: FunctionBody,
}

#[derive(Debug)]
pub enum FunctionBody {
    /// Declared in the program; the declaration owns parameters and body
    User(Rc<FunctionDecl>),
    /// Provided by the builtins collaborator
    Builtin,
}

impl Function {
    pub fn user(decl: Rc<FunctionDecl>) -> Self {
        Function {
            name: decl.name.node.clone(),
            arity: decl.arity(),
            body: FunctionBody::User(decl),
        }
    }

    pub fn builtin(name: &str, arity: usize) -> Self {
        Function {
            name: name.to_string(),
            arity,
            body: FunctionBody::Builtin,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.body, FunctionBody::Builtin)
    }
}

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<String>),
    Array(ArrayRef),
    Function(Rc<Function>),
    Void,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Str(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Function(_) => ValueKind::Function,
            Value::Void => ValueKind::Void,
        }
    }

    /// Numeric view used for mixed Int/Float operations
    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Apply a binary operator.
    pub fn binary(&self, op: BinOp, rhs: &Value) -> OpResult {
        match op {
            BinOp::Add => self.add(rhs),
            BinOp::Sub => self.subtract(rhs),
            BinOp::Mul => self.multiply(rhs),
            BinOp::Div => self.divide(rhs),
            BinOp::Mod => self.modulo(rhs),
            BinOp::BitAnd => self.bitwise_and(rhs),
            BinOp::BitOr => self.bitwise_or(rhs),
            BinOp::BitXor => self.bitwise_xor(rhs),
            BinOp::Eq => self.equal(rhs),
            BinOp::Ne => self.not_equal(rhs),
            BinOp::Lt => self.less_than(rhs),
            BinOp::Gt => self.greater_than(rhs),
            BinOp::Le => self.less_than_equal(rhs),
            BinOp::Ge => self.greater_than_equal(rhs),
            BinOp::And => self.logical_and(rhs),
            BinOp::Or => self.logical_or(rhs),
        }
    }

    /// Apply a unary operator.
    pub fn unary(&self, op: UnOp) -> OpResult {
        match op {
            UnOp::Pos => self.positive(),
            UnOp::Neg => self.negative(),
            UnOp::BitNot => self.bitwise_not(),
            UnOp::Not => self.logical_not(),
        }
    }

    // ---- arithmetic ----

    pub fn add(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or(OpError::Overflow),
            (Value::Str(a), Value::Str(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::string(joined))
            }
            (Value::Array(a), Value::Array(b)) => {
                let mut joined = a.borrow().clone();
                joined.extend(b.borrow().iter().cloned());
                Ok(Value::array(joined))
            }
            _ => self.float_op(rhs, |a, b| a + b),
        }
    }

    pub fn subtract(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_sub(*b).map(Value::Int).ok_or(OpError::Overflow),
            _ => self.float_op(rhs, |a, b| a - b),
        }
    }

    pub fn multiply(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map(Value::Int).ok_or(OpError::Overflow),
            (Value::Str(s), Value::Int(n)) => {
                let count = repeat_count(*n)?;
                replicated_len(s.len(), count)?;
                Ok(Value::string(s.repeat(count)))
            }
            (Value::Array(elements), Value::Int(n)) => {
                let elements = elements.borrow();
                let total = replicated_len(elements.len(), repeat_count(*n)?)?;
                let replicated = (0..total)
                    .map(|i| elements[i % elements.len()].duplicate())
                    .collect();
                Ok(Value::array(replicated))
            }
            _ => self.float_op(rhs, |a, b| a * b),
        }
    }

    pub fn divide(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(OpError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => a.checked_div(*b).map(Value::Int).ok_or(OpError::Overflow),
            _ => self.float_op(rhs, |a, b| a / b),
        }
    }

    pub fn modulo(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(OpError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => a.checked_rem(*b).map(Value::Int).ok_or(OpError::Overflow),
            _ => Err(OpError::Unsupported),
        }
    }

    /// Mixed Int/Float arithmetic; Int∘Int never reaches here.
    fn float_op(&self, rhs: &Value, f: impl Fn(f64, f64) -> f64) -> OpResult {
        match (self.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(f(a, b))),
            _ => Err(OpError::Unsupported),
        }
    }

    pub fn positive(&self) -> OpResult {
        match self {
            Value::Int(_) | Value::Float(_) => Ok(self.clone()),
            _ => Err(OpError::Unsupported),
        }
    }

    pub fn negative(&self) -> OpResult {
        match self {
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(OpError::Overflow),
            Value::Float(x) => Ok(Value::Float(-x)),
            _ => Err(OpError::Unsupported),
        }
    }

    // ---- bitwise ----

    pub fn bitwise_and(&self, rhs: &Value) -> OpResult {
        self.int_op(rhs, |a, b| a & b)
    }

    pub fn bitwise_or(&self, rhs: &Value) -> OpResult {
        self.int_op(rhs, |a, b| a | b)
    }

    pub fn bitwise_xor(&self, rhs: &Value) -> OpResult {
        self.int_op(rhs, |a, b| a ^ b)
    }

    pub fn bitwise_not(&self) -> OpResult {
        match self {
            Value::Int(n) => Ok(Value::Int(!n)),
            _ => Err(OpError::Unsupported),
        }
    }

    fn int_op(&self, rhs: &Value, f: impl Fn(i64, i64) -> i64) -> OpResult {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(f(*a, *b))),
            _ => Err(OpError::Unsupported),
        }
    }

    // ---- comparison ----

    pub fn equal(&self, rhs: &Value) -> OpResult {
        self.equals(rhs).map(Value::Bool)
    }

    pub fn not_equal(&self, rhs: &Value) -> OpResult {
        self.equals(rhs).map(|eq| Value::Bool(!eq))
    }

    fn equals(&self, rhs: &Value) -> Result<bool, OpError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ if self.is_numeric() && rhs.is_numeric() => {
                Ok(self.as_float() == rhs.as_float())
            }
            _ => Err(OpError::Unsupported),
        }
    }

    fn compare(&self, rhs: &Value) -> Result<Option<Ordering>, OpError> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
            (Value::Str(a), Value::Str(b)) => Ok(Some(a.as_str().cmp(b.as_str()))),
            _ => match (self.as_float(), rhs.as_float()) {
                (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
                _ => Err(OpError::Unsupported),
            },
        }
    }

    pub fn less_than(&self, rhs: &Value) -> OpResult {
        self.compare(rhs).map(|o| Value::Bool(o == Some(Ordering::Less)))
    }

    pub fn greater_than(&self, rhs: &Value) -> OpResult {
        self.compare(rhs).map(|o| Value::Bool(o == Some(Ordering::Greater)))
    }

    pub fn less_than_equal(&self, rhs: &Value) -> OpResult {
        self.compare(rhs)
            .map(|o| Value::Bool(matches!(o, Some(Ordering::Less | Ordering::Equal))))
    }

    pub fn greater_than_equal(&self, rhs: &Value) -> OpResult {
        self.compare(rhs)
            .map(|o| Value::Bool(matches!(o, Some(Ordering::Greater | Ordering::Equal))))
    }

    // ---- logical ----

    pub fn logical_and(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a && *b)),
            _ => Err(OpError::Unsupported),
        }
    }

    pub fn logical_or(&self, rhs: &Value) -> OpResult {
        match (self, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
            _ => Err(OpError::Unsupported),
        }
    }

    pub fn logical_not(&self) -> OpResult {
        match self {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => Err(OpError::Unsupported),
        }
    }

    // ---- conversion ----

    pub fn cast(&self, target: CastTarget) -> OpResult {
        let invalid = || OpError::InvalidConversion {
            value: self.to_string(),
            target,
        };
        match (self, target) {
            (Value::Void | Value::Function(_), _) => Err(OpError::Unsupported),

            (Value::Int(_), CastTarget::Int) => Ok(self.clone()),
            (Value::Int(n), CastTarget::Float) => Ok(Value::Float(*n as f64)),
            (Value::Int(n), CastTarget::Bool) => Ok(Value::Bool(*n != 0)),

            (Value::Float(x), CastTarget::Int) => {
                if x.is_finite() && x.trunc() >= i64::MIN as f64 && x.trunc() < i64::MAX as f64 {
                    Ok(Value::Int(x.trunc() as i64))
                } else {
                    Err(invalid())
                }
            }
            (Value::Float(_), CastTarget::Float) => Ok(self.clone()),
            (Value::Float(x), CastTarget::Bool) => Ok(Value::Bool(*x != 0.0)),

            (Value::Bool(b), CastTarget::Int) => Ok(Value::Int(i64::from(*b))),
            (Value::Bool(b), CastTarget::Float) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            (Value::Bool(_), CastTarget::Bool) => Ok(self.clone()),

            (Value::Str(s), CastTarget::Int) => {
                s.trim().parse::<i64>().map(Value::Int).map_err(|_| invalid())
            }
            (Value::Str(s), CastTarget::Float) => {
                s.trim().parse::<f64>().map(Value::Float).map_err(|_| invalid())
            }
            (Value::Str(s), CastTarget::Bool) => match s.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },

            (Value::Array(_), CastTarget::Array) => Ok(self.duplicate()),
            (Value::Array(_), _) | (_, CastTarget::Array) => Err(OpError::Unsupported),

            (_, CastTarget::String) => Ok(Value::string(self.to_string())),
        }
    }

    // ---- subscript ----

    /// Element at `index`. Array elements are returned aliased.
    pub fn subscript(&self, index: &Value) -> OpResult {
        let Value::Int(i) = index else {
            return Err(OpError::Unsupported);
        };
        match self {
            Value::Array(elements) => {
                let elements = elements.borrow();
                let at = checked_index(*i, elements.len())?;
                Ok(elements[at].clone())
            }
            Value::Str(s) => {
                let len = s.chars().count();
                let at = checked_index(*i, len)?;
                s.chars()
                    .nth(at)
                    .map(|c| Value::string(c.to_string()))
                    .ok_or(OpError::IndexOutOfRange { index: *i, len })
            }
            _ => Err(OpError::Unsupported),
        }
    }

    /// Replace the element at `index` in place.
    pub fn subscript_update(&self, index: &Value, value: Value) -> Result<(), OpError> {
        match (self, index) {
            (Value::Array(elements), Value::Int(i)) => {
                let mut elements = elements.borrow_mut();
                let at = checked_index(*i, elements.len())?;
                elements[at] = value;
                Ok(())
            }
            _ => Err(OpError::Unsupported),
        }
    }

    /// Deep copy: arrays get fresh storage all the way down.
    pub fn duplicate(&self) -> Value {
        match self {
            Value::Array(elements) => {
                Value::array(elements.borrow().iter().map(Value::duplicate).collect())
            }
            other => other.clone(),
        }
    }

    /// Number of elements (Array) or characters (String)
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Array(elements) => Some(elements.borrow().len()),
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    /// Write the value, printing an array already being written as `[...]`.
    fn write_to(
        &self,
        f: &mut fmt::Formatter<'_>,
        open: &mut Vec<*const RefCell<Vec<Value>>>,
    ) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(elements) => {
                let ptr = Rc::as_ptr(elements);
                if open.contains(&ptr) {
                    return write!(f, "[...]");
                }
                open.push(ptr);
                write!(f, "[")?;
                for (i, v) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match v {
                        Value::Str(s) => write!(f, "{s:?}")?,
                        other => other.write_to(f, open)?,
                    }
                }
                open.pop();
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Void => write!(f, "void"),
        }
    }
}

/// Upper bound on elements (or bytes) produced by one replication
pub const MAX_REPLICATED_LEN: usize = 1 << 28;

fn repeat_count(n: i64) -> Result<usize, OpError> {
    usize::try_from(n).map_err(|_| OpError::NegativeCount(n))
}

fn replicated_len(len: usize, count: usize) -> Result<usize, OpError> {
    len.checked_mul(count)
        .filter(|&total| total <= MAX_REPLICATED_LEN)
        .ok_or(OpError::Overflow)
}

fn checked_index(index: i64, len: usize) -> Result<usize, OpError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(OpError::IndexOutOfRange { index, len })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, &mut Vec::new())
    }
}

/// Structural equality for tests and host code; language `=` is [`Value::equal`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Void, Value::Void) => true,
            _ => false,
        }
    }
}
