//! Shared container handles and variable references

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Value, ValueId};
use crate::error::{CatchableError, EvalError, Result};

/// Map a possibly negative index into `[0, len)`.
///
/// Negative indices count from the end; anything outside `[-len, len)`
/// yields `None`.
pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let idx = if index < 0 { index.checked_add(len)? } else { index };
    if (0..len).contains(&idx) {
        usize::try_from(idx).ok()
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Lists
// ═══════════════════════════════════════════════════════════════════════

/// Shared handle to a mutable list.
#[derive(Debug, Clone)]
pub struct ListRef {
    id: ValueId,
    items: Rc<RefCell<Vec<Value>>>,
}

impl ListRef {
    pub(crate) fn new(id: ValueId, items: Vec<Value>) -> Self {
        Self {
            id,
            items: Rc::new(RefCell::new(items)),
        }
    }

    /// Identity of this list.
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// Whether both handles point at the same list.
    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Borrow the elements.
    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.items.borrow()
    }

    /// Mutably borrow the elements.
    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.items.borrow_mut()
    }

    /// Copy out the current elements (handles inside are shared).
    pub fn snapshot(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }

    /// Read the element at `index`.
    pub fn get(&self, index: i64) -> Result<Value> {
        let items = self.items.borrow();
        resolve_index(index, items.len())
            .map(|i| items[i].clone())
            .ok_or(EvalError::IndexOutOfBounds {
                index,
                len: items.len(),
            })
    }

    /// Overwrite the element at `index`.
    pub fn set(&self, index: i64, value: Value) -> Result<()> {
        let mut items = self.items.borrow_mut();
        let len = items.len();
        let slot = resolve_index(index, len)
            .and_then(|i| items.get_mut(i))
            .ok_or(EvalError::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Append an element.
    pub fn push(&self, value: Value) {
        self.items.borrow_mut().push(value);
    }

    /// Remove and return the element at `index`.
    ///
    /// An out-of-range index is catchable by scripts.
    pub fn pop(&self, index: i64) -> Result<Value> {
        let mut items = self.items.borrow_mut();
        match resolve_index(index, items.len()) {
            Some(i) => Ok(items.remove(i)),
            None => Err(CatchableError::invalid_index(format!(
                "List index '{}' out of bounds",
                index
            ))
            .into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Objects
// ═══════════════════════════════════════════════════════════════════════

/// Shared handle to a mutable, insertion-ordered object.
///
/// Objects double as variable scopes.
#[derive(Debug, Clone)]
pub struct ObjectRef {
    id: ValueId,
    fields: Rc<RefCell<IndexMap<String, Value>>>,
}

impl ObjectRef {
    pub(crate) fn new(id: ValueId, fields: IndexMap<String, Value>) -> Self {
        Self {
            id,
            fields: Rc::new(RefCell::new(fields)),
        }
    }

    /// Identity of this object.
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// Whether both handles point at the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    /// Whether the object has no keys.
    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }

    /// Borrow the fields.
    pub fn borrow(&self) -> Ref<'_, IndexMap<String, Value>> {
        self.fields.borrow()
    }

    /// Read the value bound to `key`.
    pub fn get(&self, key: &str) -> Result<Value> {
        self.fields
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| EvalError::MissingKey {
                name: key.to_string(),
            })
    }

    /// Bind `key`, inserting it at the end if new.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.fields.borrow_mut().insert(key.into(), value);
    }

    /// Remove and return the value bound to `key`, keeping the order of
    /// the remaining keys.
    pub fn remove(&self, key: &str) -> Result<Value> {
        self.fields
            .borrow_mut()
            .shift_remove(key)
            .ok_or_else(|| EvalError::MissingKey {
                name: key.to_string(),
            })
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    /// Values in insertion order.
    pub fn values(&self) -> Vec<Value> {
        self.fields.borrow().values().cloned().collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Teardown
// ═══════════════════════════════════════════════════════════════════════

// Scripts can nest containers arbitrarily deep, so dropping the last handle
// moves uniquely owned children onto a heap worklist instead of recursing.

impl Drop for ListRef {
    fn drop(&mut self) {
        if let Some(items) = take_unique(&self.items) {
            release(items);
        }
    }
}

impl Drop for ObjectRef {
    fn drop(&mut self) {
        if let Some(fields) = take_unique(&self.fields) {
            release(fields.into_values().collect());
        }
    }
}

/// Empty the cell if this handle is its last owner.
fn take_unique<T: Default>(cell: &Rc<RefCell<T>>) -> Option<T> {
    if Rc::strong_count(cell) != 1 {
        return None;
    }
    cell.try_borrow_mut().ok().map(|mut inner| std::mem::take(&mut *inner))
}

/// Drop `pending` one value at a time. Each container is emptied before
/// its handle goes away, so its own `Drop` has nothing left to walk.
fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::List(list) => {
                if let Some(items) = take_unique(&list.items) {
                    pending.extend(items);
                }
            }
            Value::Object(obj) => {
                if let Some(fields) = take_unique(&obj.fields) {
                    pending.extend(fields.into_values());
                }
            }
            Value::Variable(var) => pending.push(match var.container {
                Container::List(list) => Value::List(list),
                Container::Object(obj) => Value::Object(obj),
            }),
            _ => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Variable references
// ═══════════════════════════════════════════════════════════════════════

/// Container side of a [`VariableRef`].
#[derive(Debug, Clone)]
pub enum Container {
    /// A list slot
    List(ListRef),
    /// An object (or scope) slot
    Object(ObjectRef),
}

/// Key side of a [`VariableRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    /// Object key or variable name
    Name(String),
    /// List index, possibly negative
    Index(i64),
}

/// A write-through handle to one slot of a container.
///
/// Produced by variable lookups and indexing, consumed by assignment,
/// increment and iteration. Reads fail if the slot does not exist;
/// object writes create the key.
#[derive(Debug, Clone)]
pub struct VariableRef {
    id: ValueId,
    container: Container,
    key: FieldKey,
}

impl VariableRef {
    pub(crate) fn new(id: ValueId, container: Container, key: FieldKey) -> Self {
        Self { id, container, key }
    }

    /// Identity of this reference.
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// The referenced container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The referenced key.
    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    /// Read through the reference.
    pub fn get(&self) -> Result<Value> {
        match (&self.container, &self.key) {
            (Container::Object(obj), FieldKey::Name(name)) => obj.get(name),
            (Container::List(list), FieldKey::Index(index)) => list.get(*index),
            _ => Err(self.mismatch()),
        }
    }

    /// Write through the reference.
    pub fn set(&self, value: Value) -> Result<()> {
        match (&self.container, &self.key) {
            (Container::Object(obj), FieldKey::Name(name)) => {
                obj.set(name.clone(), value);
                Ok(())
            }
            (Container::List(list), FieldKey::Index(index)) => list.set(*index, value),
            _ => Err(self.mismatch()),
        }
    }

    fn mismatch(&self) -> EvalError {
        EvalError::Internal(format!("variable reference with mismatched key {:?}", self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IdGenerator;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(0, 3), Some(0));
        assert_eq!(resolve_index(2, 3), Some(2));
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-3, 3), Some(0));
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(0, 0), None);
        assert_eq!(resolve_index(i64::MIN, 3), None);
    }

    #[test]
    fn test_list_negative_get_and_set() {
        let mut ids = IdGenerator::new();
        let list = ids.list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(matches!(list.get(-1), Ok(Value::Int(3))));
        list.set(-3, Value::Int(10)).unwrap();
        assert!(matches!(list.get(0), Ok(Value::Int(10))));
        assert!(matches!(
            list.set(3, Value::Null),
            Err(EvalError::IndexOutOfBounds { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_list_pop_out_of_range_is_catchable() {
        let mut ids = IdGenerator::new();
        let list = ids.list(vec![Value::Int(1)]);
        assert!(matches!(list.pop(5), Err(EvalError::Catchable(_))));
        assert!(matches!(list.pop(0), Ok(Value::Int(1))));
        assert!(list.is_empty());
    }

    #[test]
    fn test_object_remove_keeps_order() {
        let mut ids = IdGenerator::new();
        let obj = ids.empty_object();
        obj.set("a", Value::Int(1));
        obj.set("b", Value::Int(2));
        obj.set("c", Value::Int(3));
        obj.remove("b").unwrap();
        assert_eq!(obj.keys(), vec!["a".to_string(), "c".to_string()]);
        assert!(matches!(obj.remove("b"), Err(EvalError::MissingKey { .. })));
    }

    #[test]
    fn test_variable_ref_writes_through() {
        let mut ids = IdGenerator::new();
        let scope = ids.empty_object();
        let var = ids.variable(Container::Object(scope.clone()), FieldKey::Name("x".into()));
        assert!(matches!(var.get(), Err(EvalError::MissingKey { .. })));
        var.set(Value::Int(5)).unwrap();
        assert!(matches!(scope.get("x"), Ok(Value::Int(5))));
    }

    #[test]
    fn test_deep_nesting_drops_without_recursion() {
        let mut ids = IdGenerator::new();
        let mut value = ids.list_value(Vec::new());
        for _ in 0..500_000 {
            let obj = ids.empty_object();
            obj.set("next", value);
            value = ids.list_value(vec![Value::Object(obj)]);
        }
        drop(value);
    }

    #[test]
    fn test_drop_keeps_shared_children_alive() {
        let mut ids = IdGenerator::new();
        let shared = ids.list(vec![Value::Int(7)]);
        let outer = ids.list_value(vec![Value::List(shared.clone())]);
        drop(outer);
        assert_eq!(shared.snapshot(), vec![Value::Int(7)]);
    }
}
