//! Value trait implementations: constructors, predicates, extractors, equality

use std::collections::HashSet;

use super::*;
use crate::error::{EvalError, Result};

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Type Predicates
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Script-visible type name, as returned by the `type` built-in.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Variable(_) => "variable",
        }
    }

    /// Check if this is Bool, Int or Float
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    /// Truthiness: false, zero, empty string/list/object and null are
    /// falsy; functions and variable references never are.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(list) => !list.is_empty(),
            Value::Object(obj) => !obj.is_empty(),
            Value::Function(_) | Value::Variable(_) => true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Extractors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Scalar payload of a numeric or string value.
    pub fn get_value(&self) -> Result<Scalar<'_>> {
        match self {
            Value::String(s) => Ok(Scalar::Str(s)),
            other => other.as_number().map(Scalar::Number),
        }
    }

    /// Numeric payload; booleans count as 0/1.
    pub fn as_number(&self) -> Result<Number> {
        self.number()
            .ok_or_else(|| EvalError::type_assertion(ValueType::Numeric, self))
    }

    fn number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Float(x) => Some(Number::Float(*x)),
            _ => None,
        }
    }

    /// Integral payload; booleans count as 0/1.
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Int(n) => Ok(*n),
            other => Err(EvalError::type_assertion(ValueType::Integral, other)),
        }
    }

    /// Numeric payload widened to `f64`.
    pub fn as_float(&self) -> Result<f64> {
        self.as_number().map(Number::as_f64)
    }

    /// String payload.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(EvalError::type_assertion(ValueType::String, other)),
        }
    }

    /// List handle.
    pub fn as_list(&self) -> Result<&ListRef> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(EvalError::type_assertion(ValueType::List, other)),
        }
    }

    /// Object handle.
    pub fn as_object(&self) -> Result<&ObjectRef> {
        match self {
            Value::Object(obj) => Ok(obj),
            other => Err(EvalError::type_assertion(ValueType::Object, other)),
        }
    }

    /// Function payload.
    pub fn as_function(&self) -> Result<&FunctionValue> {
        match self {
            Value::Function(func) => Ok(func),
            other => Err(EvalError::type_assertion(ValueType::Function, other)),
        }
    }

    /// Variable reference payload.
    pub fn as_variable(&self) -> Result<&VariableRef> {
        match self {
            Value::Variable(var) => Ok(var),
            other => Err(EvalError::type_assertion(ValueType::Variable, other)),
        }
    }

    /// Resolve a variable reference to the value it points at; any other
    /// value is returned unchanged.
    pub fn deref(self) -> Result<Value> {
        match self {
            Value::Variable(var) => var.get(),
            other => Ok(other),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Equality and Identity
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Structural equality.
    ///
    /// Bool/Int/Float compare numerically across tags. Lists compare
    /// element-wise in order; objects compare key sets and per-key values
    /// regardless of insertion order. Functions and variable references
    /// compare by identity.
    ///
    /// Containers are walked with a worklist. A pair of containers already
    /// under comparison is assumed equal, so cyclic values terminate.
    pub fn is_equal(&self, other: &Value) -> bool {
        let mut assumed = HashSet::new();
        let mut pending = vec![(self.clone(), other.clone())];
        while let Some((a, b)) = pending.pop() {
            match (&a, &b) {
                (Value::List(x), Value::List(y)) => {
                    if x.ptr_eq(y) || !assumed.insert((x.id(), y.id())) {
                        continue;
                    }
                    let (x, y) = (x.borrow(), y.borrow());
                    if x.len() != y.len() {
                        return false;
                    }
                    pending.extend(x.iter().cloned().zip(y.iter().cloned()));
                }
                (Value::Object(x), Value::Object(y)) => {
                    if x.ptr_eq(y) || !assumed.insert((x.id(), y.id())) {
                        continue;
                    }
                    let (x, y) = (x.borrow(), y.borrow());
                    if x.len() != y.len() {
                        return false;
                    }
                    for (key, item) in x.iter() {
                        match y.get(key) {
                            Some(counterpart) => pending.push((item.clone(), counterpart.clone())),
                            None => return false,
                        }
                    }
                }
                _ if !a.scalar_equal(&b) => return false,
                _ => {}
            }
        }
        true
    }

    /// Equality for everything except list/list and object/object pairs.
    fn scalar_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.id() == b.id(),
            (Value::Variable(a), Value::Variable(b)) => a.id() == b.id(),
            (a, b) => match (a.number(), b.number()) {
                (Some(Number::Int(x)), Some(Number::Int(y))) => x == y,
                (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
                _ => false,
            },
        }
    }

    /// Identity: whether both values are the same shared handle.
    ///
    /// Primitives have no identity and are never the same.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.id() == b.id(),
            (Value::Variable(a), Value::Variable(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality_across_tags() {
        assert!(Value::Int(1).is_equal(&Value::Float(1.0)));
        assert!(Value::Bool(true).is_equal(&Value::Int(1)));
        assert!(!Value::Int(1).is_equal(&Value::string("1")));
        assert!(!Value::Null.is_equal(&Value::Int(0)));
    }

    #[test]
    fn test_cyclic_lists_compare_equal() {
        let mut ids = IdGenerator::new();
        let a = ids.list(vec![Value::Int(1)]);
        a.push(Value::List(a.clone()));
        let b = ids.list(vec![Value::Int(1)]);
        b.push(Value::List(b.clone()));
        assert!(Value::List(a.clone()).is_equal(&Value::List(b.clone())));

        let c = ids.list(vec![Value::Int(2)]);
        c.push(Value::List(c.clone()));
        assert!(!Value::List(a).is_equal(&Value::List(c)));
    }

    #[test]
    fn test_list_never_equals_object() {
        let mut ids = IdGenerator::new();
        assert!(!ids.list_value(Vec::new()).is_equal(&Value::Object(ids.empty_object())));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.to_bool());
        assert!(!Value::Int(0).to_bool());
        assert!(!Value::Float(0.0).to_bool());
        assert!(!Value::string("").to_bool());
        assert!(Value::string("0").to_bool());
        let mut ids = IdGenerator::new();
        assert!(!ids.list_value(Vec::new()).to_bool());
        assert!(ids.list_value(vec![Value::Null]).to_bool());
    }

    #[test]
    fn test_get_value() {
        assert_eq!(Value::Int(3).get_value().ok(), Some(Scalar::Number(Number::Int(3))));
        assert_eq!(Value::string("x").get_value().ok(), Some(Scalar::Str("x")));
        assert!(Value::Null.get_value().is_err());
    }

    #[test]
    fn test_as_int_rejects_float() {
        assert!(matches!(
            Value::Float(1.5).as_int(),
            Err(EvalError::TypeAssertion {
                expected: ValueType::Integral,
                ..
            })
        ));
    }
}
