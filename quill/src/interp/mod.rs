//! Quill interpreter
//!
//! Walks the AST directly. Values live in [`value`], lexical environments in
//! [`scope`], and the first runtime fault aborts the run as a [`Fatal`].

pub mod builtins;
pub mod error;
pub mod eval;
pub mod scope;
pub mod value;

pub use builtins::{Builtins, StandardBuiltins};
pub use error::{Fatal, FatalKind};
pub use eval::{Interpreter, Signal};
pub use scope::{Scope, ScopeRef, Symbol};
pub use value::{Function, OpError, Value, ValueKind};
