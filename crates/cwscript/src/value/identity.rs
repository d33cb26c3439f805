//! Identity allocation for shared values

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Container, FieldKey, FunctionValue, ListRef, ObjectRef, Value, VariableRef};
use crate::ast::Block;

/// Identity of a list, object, function or variable reference.
///
/// Unique within one [`IdGenerator`]; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u64);

impl ValueId {
    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::LowerHex for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Monotonic identity source, owned by the machine that creates values.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator starting at 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next identity.
    pub fn next_id(&mut self) -> ValueId {
        let id = ValueId(self.next);
        self.next += 1;
        id
    }

    /// Create a list handle.
    pub fn list(&mut self, items: Vec<Value>) -> ListRef {
        ListRef::new(self.next_id(), items)
    }

    /// Create an object handle.
    pub fn object(&mut self, fields: IndexMap<String, Value>) -> ObjectRef {
        ObjectRef::new(self.next_id(), fields)
    }

    /// Create an empty object handle.
    pub fn empty_object(&mut self) -> ObjectRef {
        self.object(IndexMap::new())
    }

    /// Create a function value.
    pub fn function(&mut self, params: Rc<[String]>, body: Rc<Block>) -> FunctionValue {
        FunctionValue::new(self.next_id(), params, body)
    }

    /// Create a variable reference.
    pub fn variable(&mut self, container: Container, key: FieldKey) -> VariableRef {
        VariableRef::new(self.next_id(), container, key)
    }

    /// Shorthand for `Value::List(self.list(items))`.
    pub fn list_value(&mut self, items: Vec<Value>) -> Value {
        Value::List(self.list(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut ids = IdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_separate_generators_are_independent() {
        let mut first = IdGenerator::new();
        let mut second = IdGenerator::new();
        assert_eq!(first.next_id(), second.next_id());
    }
}
