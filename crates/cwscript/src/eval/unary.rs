//! Prefix operators: `- ! ++ -- !!`

use crate::ast::Op;
use crate::error::{EvalError, Result};
use crate::value::Number;
use crate::Value;

/// Evaluate `-value`.
pub(crate) fn eval_neg(value: &Value) -> Result<Value> {
    match value.as_number()? {
        Number::Int(n) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow("-")),
        Number::Float(x) => Ok(Value::Float(-x)),
    }
}

/// Evaluate `!value`: the negated truthiness.
pub(crate) fn eval_not(value: &Value) -> Value {
    Value::Bool(!value.to_bool())
}

/// Evaluate `++`, `--` or `!!` on a variable reference, writing the new
/// value through it. Yields the reference.
pub(crate) fn eval_update(op: Op, target: &Value) -> Result<Value> {
    let var = target.as_variable()?;
    let current = var.get()?;
    let updated = match op {
        Op::Inc => step(&current, 1, op)?,
        Op::Dec => step(&current, -1, op)?,
        Op::Invert => Value::Bool(!current.to_bool()),
        other => {
            return Err(EvalError::Internal(format!(
                "'{}' is not an update operator",
                other.name()
            )))
        }
    };
    var.set(updated)?;
    Ok(target.clone())
}

fn step(current: &Value, delta: i64, op: Op) -> Result<Value> {
    match current.as_number()? {
        Number::Int(n) => n
            .checked_add(delta)
            .map(Value::Int)
            .ok_or(EvalError::Overflow(op.name())),
        Number::Float(x) => Ok(Value::Float(x + delta as f64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Container, FieldKey, IdGenerator};
    use pretty_assertions::assert_eq;

    fn slot(initial: Value) -> (Value, crate::value::ObjectRef) {
        let mut ids = IdGenerator::new();
        let scope = ids.empty_object();
        scope.set("x", initial);
        let var = ids.variable(Container::Object(scope.clone()), FieldKey::Name("x".into()));
        (Value::Variable(var), scope)
    }

    #[test]
    fn test_neg() {
        assert_eq!(eval_neg(&Value::Int(3)).unwrap(), Value::Int(-3));
        assert_eq!(eval_neg(&Value::Bool(true)).unwrap(), Value::Int(-1));
        assert!(matches!(eval_neg(&Value::Int(i64::MIN)), Err(EvalError::Overflow(_))));
        assert!(eval_neg(&Value::string("a")).is_err());
    }

    #[test]
    fn test_increment_writes_through() {
        let (var, scope) = slot(Value::Int(1));
        eval_update(Op::Inc, &var).unwrap();
        eval_update(Op::Inc, &var).unwrap();
        assert_eq!(scope.get("x").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_decrement_float() {
        let (var, scope) = slot(Value::Float(0.5));
        eval_update(Op::Dec, &var).unwrap();
        assert!(matches!(scope.get("x"), Ok(Value::Float(x)) if x == -0.5));
    }

    #[test]
    fn test_invert_toggles_truthiness() {
        let (var, scope) = slot(Value::string(""));
        eval_update(Op::Invert, &var).unwrap();
        assert!(matches!(scope.get("x"), Ok(Value::Bool(true))));
    }

    #[test]
    fn test_not() {
        assert!(matches!(eval_not(&Value::Null), Value::Bool(true)));
        assert!(matches!(eval_not(&Value::Int(2)), Value::Bool(false)));
    }
}
