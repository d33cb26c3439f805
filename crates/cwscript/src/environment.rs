//! Scope chain used for variable lookup and recursion limiting

use crate::error::{EvalError, Result};
use crate::value::{Container, FieldKey, IdGenerator, ObjectRef, VariableRef};

/// Stack of scope objects.
///
/// The bottom entry is the global scope, created once and never popped.
/// Each function call or object literal pushes a fresh object and pops it
/// on exit, in strict LIFO order.
///
/// # Example
///
/// ```
/// use cwscript::{IdGenerator, ScopeChain, Value};
///
/// let mut ids = IdGenerator::new();
/// let mut scopes = ScopeChain::new(ids.empty_object(), 8);
///
/// scopes.global().set("x", Value::Int(1));
/// scopes.push(ids.empty_object()).unwrap();
/// scopes.current().set("x", Value::Int(10));
///
/// assert!(matches!(scopes.current().get("x"), Ok(Value::Int(10))));
/// assert!(matches!(scopes.global().get("x"), Ok(Value::Int(1))));
///
/// scopes.pop();
/// assert!(scopes.is_global_scope());
/// ```
#[derive(Debug, Clone)]
pub struct ScopeChain {
    /// Global scope first, innermost last
    scopes: Vec<ObjectRef>,

    /// Maximum number of scopes above the global one
    max_depth: usize,
}

impl ScopeChain {
    /// Create a chain holding only `global`.
    pub fn new(global: ObjectRef, max_depth: usize) -> Self {
        Self {
            scopes: vec![global],
            max_depth,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scope Entry/Exit
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a new scope. Fails once `max_depth` scopes are active above
    /// the global one.
    pub fn push(&mut self, scope: ObjectRef) -> Result<()> {
        if self.depth() >= self.max_depth {
            return Err(EvalError::RecursionLimit {
                max: self.max_depth,
            });
        }
        self.scopes.push(scope);
        Ok(())
    }

    /// Leave the innermost scope. Never pops the global scope.
    pub fn pop(&mut self) -> Option<ObjectRef> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Number of scopes above the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Check if only the global scope is active.
    pub fn is_global_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    /// The global scope.
    pub fn global(&self) -> &ObjectRef {
        &self.scopes[0]
    }

    /// The innermost scope (the global one at top level).
    pub fn current(&self) -> &ObjectRef {
        // `scopes` is never empty
        &self.scopes[self.scopes.len() - 1]
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve a variable path to a write-through reference.
    ///
    /// The first name is looked up in the global or current scope; every
    /// further name indexes into the object bound so far. Only the
    /// intermediate steps are read, so the final slot may not exist yet.
    pub fn resolve(
        &self,
        global: bool,
        path: &[String],
        ids: &mut IdGenerator,
    ) -> Result<VariableRef> {
        let Some((last, parents)) = path.split_last() else {
            return Err(EvalError::Internal("empty variable path".into()));
        };
        let mut container = if global {
            self.global().clone()
        } else {
            self.current().clone()
        };
        for name in parents {
            let next = container.get(name)?;
            container = next.as_object()?.clone();
        }
        Ok(ids.variable(Container::Object(container), FieldKey::Name(last.clone())))
    }
}
