//! Lexical scopes shared by the analyzer and the interpreter
//!
//! Scopes form a tree through `Rc` parent links: a child keeps its ancestors
//! alive, and dropping the last handle to a block's scope frees its bindings.
//! Every non-global scope also holds the global scope directly so function
//! frames can be rooted there in O(1).

use super::value::{Value, ValueKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared reference to a scope
pub type ScopeRef = Rc<RefCell<Scope>>;

/// A named binding. The analyzer inserts variables without a value.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub value: Option<Value>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, value: Option<Value>) -> Self {
        Symbol {
            name: name.into(),
            value,
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.value.as_ref().map_or(ValueKind::Undefined, Value::kind)
    }
}

/// Symbol table for one block, loop body, function body or call frame
#[derive(Debug)]
pub struct Scope {
    symbols: HashMap<String, Symbol>,
    parent: Option<ScopeRef>,
    /// `None` only for the global scope itself
    global: Option<ScopeRef>,
    is_loop: bool,
    is_function: bool,
}

impl Scope {
    /// Create a new global scope
    pub fn global() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            symbols: HashMap::new(),
            parent: None,
            global: None,
            is_loop: false,
            is_function: false,
        }))
    }

    /// Insert or overwrite a binding in this scope only.
    pub fn insert(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name.clone(), symbol);
    }

    /// Whether `name` is bound here (or anywhere outward unless `current_scope_only`).
    pub fn contains(&self, name: &str, current_scope_only: bool) -> bool {
        if self.symbols.contains_key(name) {
            true
        } else if current_scope_only {
            false
        } else if let Some(parent) = &self.parent {
            parent.borrow().contains(name, false)
        } else {
            false
        }
    }

    /// First binding of `name` walking outward.
    pub fn lookup(&self, name: &str, current_scope_only: bool) -> Option<Symbol> {
        if let Some(symbol) = self.symbols.get(name) {
            Some(symbol.clone())
        } else if current_scope_only {
            None
        } else if let Some(parent) = &self.parent {
            parent.borrow().lookup(name, false)
        } else {
            None
        }
    }

    /// Update the first binding of `name` in the chain. Returns false if there is none.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.value = Some(value);
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    pub fn is_loop(&self) -> bool {
        self.is_loop
    }

    pub fn is_function(&self) -> bool {
        self.is_function
    }

    pub fn is_global_scope(&self) -> bool {
        self.parent.is_none()
    }

    /// Bindings made directly in this scope
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Create a child scope with explicitly chosen context flags.
pub fn child_scope(parent: &ScopeRef, is_loop: bool, is_function: bool) -> ScopeRef {
    let global = global_scope(parent);
    Rc::new(RefCell::new(Scope {
        symbols: HashMap::new(),
        parent: Some(Rc::clone(parent)),
        global: Some(global),
        is_loop,
        is_function,
    }))
}

/// Child scope inheriting both flags (plain blocks such as `if` branches).
pub fn block_scope(parent: &ScopeRef) -> ScopeRef {
    let (is_loop, is_function) = {
        let p = parent.borrow();
        (p.is_loop, p.is_function)
    };
    child_scope(parent, is_loop, is_function)
}

/// Child scope for a loop body: in a loop, function context inherited.
pub fn loop_scope(parent: &ScopeRef) -> ScopeRef {
    let is_function = parent.borrow().is_function;
    child_scope(parent, true, is_function)
}

/// The global scope of the tree `scope` belongs to.
pub fn global_scope(scope: &ScopeRef) -> ScopeRef {
    match &scope.borrow().global {
        Some(global) => Rc::clone(global),
        None => Rc::clone(scope),
    }
}
