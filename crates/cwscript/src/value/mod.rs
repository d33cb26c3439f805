//! Value representation for runtime values

mod callable;
mod container;
mod display;
mod identity;
mod impls;

pub use callable::FunctionValue;
pub use container::{Container, FieldKey, ListRef, ObjectRef, VariableRef};
pub use identity::{IdGenerator, ValueId};

pub(crate) use container::resolve_index;
pub(crate) use display::format_float;

use std::fmt;

/// Runtime value of a CWScript expression.
///
/// Primitives are stored inline. Lists and objects are shared handles:
/// cloning a `Value` clones the handle, so both copies observe each
/// other's mutations.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Primitives
    // ═══════════════════════════════════════════════════════════════════
    /// `null`
    Null,

    /// `true` or `false`; behaves as 1/0 in arithmetic
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Immutable text
    String(String),

    // ═══════════════════════════════════════════════════════════════════
    // Shared handles
    // ═══════════════════════════════════════════════════════════════════
    /// Ordered, mutable sequence
    List(ListRef),

    /// Insertion-ordered, mutable string-keyed map
    Object(ObjectRef),

    /// Parameter list plus body block
    Function(FunctionValue),

    /// Write-through slot inside a list or object
    Variable(VariableRef),
}

/// Numeric payload of a numeric-compatible value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer (also used for booleans)
    Int(i64),
    /// Float
    Float(f64),
}

impl Number {
    /// Widen to `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }
}

/// Scalar payload returned by [`Value::get_value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    /// Numeric payload
    Number(Number),
    /// String payload
    Str(&'a str),
}

/// Type constraint an operation places on one of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Anything, including variable references
    Any,
    /// Bool, Int or Float
    Numeric,
    /// Bool or Int
    Integral,
    /// String
    String,
    /// List
    List,
    /// Object
    Object,
    /// List or Object
    Container,
    /// Function
    Function,
    /// Variable reference
    Variable,
}

impl ValueType {
    /// Whether `value` satisfies this constraint.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::Numeric => matches!(value, Value::Bool(_) | Value::Int(_) | Value::Float(_)),
            ValueType::Integral => matches!(value, Value::Bool(_) | Value::Int(_)),
            ValueType::String => matches!(value, Value::String(_)),
            ValueType::List => matches!(value, Value::List(_)),
            ValueType::Object => matches!(value, Value::Object(_)),
            ValueType::Container => matches!(value, Value::List(_) | Value::Object(_)),
            ValueType::Function => matches!(value, Value::Function(_)),
            ValueType::Variable => matches!(value, Value::Variable(_)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Any => "any",
            ValueType::Numeric => "numeric",
            ValueType::Integral => "integral",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Object => "object",
            ValueType::Container => "container",
            ValueType::Function => "function",
            ValueType::Variable => "variable",
        };
        f.write_str(name)
    }
}
