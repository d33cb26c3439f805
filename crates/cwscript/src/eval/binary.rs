//! Binary operators: arithmetic, comparison, indexing and assignment

use std::cmp::Ordering;

use crate::ast::Op;
use crate::error::{CatchableError, EvalError, Result};
use crate::value::{resolve_index, Container, FieldKey, IdGenerator, Number};
use crate::Value;

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate an arithmetic operator.
///
/// Numeric results are Float if either operand is Float, else Int, with
/// these exceptions: `/` always yields Float, `//` always yields Int
/// (truncating toward zero) and `**` yields Float for negative
/// exponents. `+` also concatenates two strings or two lists.
pub(crate) fn eval_arithmetic(
    op: Op,
    left: &Value,
    right: &Value,
    ids: &mut IdGenerator,
) -> Result<Value> {
    if op == Op::Add {
        match (left, right) {
            (Value::String(a), Value::String(b)) => return Ok(Value::String(format!("{}{}", a, b))),
            (Value::List(a), Value::List(b)) => {
                let mut items = a.snapshot();
                items.extend(b.snapshot());
                return Ok(ids.list_value(items));
            }
            _ if !left.is_numeric() || !right.is_numeric() => {
                return Err(EvalError::UnsupportedOperands {
                    op: op.name(),
                    left: left.type_name(),
                    right: right.type_name(),
                })
            }
            _ => {}
        }
    }

    let a = left.as_number()?;
    let b = right.as_number()?;
    match op {
        Op::Add => combine(a, b, op, i64::checked_add, |x, y| x + y),
        Op::Sub => combine(a, b, op, i64::checked_sub, |x, y| x - y),
        Op::Mul => combine(a, b, op, i64::checked_mul, |x, y| x * y),
        Op::Div => {
            check_divisor(b)?;
            Ok(Value::Float(a.as_f64() / b.as_f64()))
        }
        Op::IntDiv => eval_int_div(a, b),
        Op::Mod => {
            check_divisor(b)?;
            combine(a, b, op, i64::checked_rem, |x, y| x % y)
        }
        Op::Pow => eval_pow(a, b),
        other => Err(EvalError::Internal(format!(
            "'{}' is not an arithmetic operator",
            other.name()
        ))),
    }
}

/// Apply `int` when both operands are Int, else `float` on the widened
/// operands.
fn combine(
    a: Number,
    b: Number,
    op: Op,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int(x, y)
            .map(Value::Int)
            .ok_or(EvalError::Overflow(op.name())),
        _ => Ok(Value::Float(float(a.as_f64(), b.as_f64()))),
    }
}

fn check_divisor(b: Number) -> Result<()> {
    if b.as_f64() == 0.0 {
        return Err(CatchableError::zero_division().into());
    }
    Ok(())
}

fn eval_int_div(a: Number, b: Number) -> Result<Value> {
    check_divisor(b)?;
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x
            .checked_div(y)
            .map(Value::Int)
            .ok_or(EvalError::Overflow("//")),
        _ => float_to_int((a.as_f64() / b.as_f64()).trunc()).map(Value::Int),
    }
}

fn eval_pow(base: Number, exp: Number) -> Result<Value> {
    if base.as_f64() == 0.0 && exp.as_f64() < 0.0 {
        return Err(CatchableError::zero_division().into());
    }
    match (base, exp) {
        (Number::Int(x), Number::Int(y)) if y >= 0 => u32::try_from(y)
            .ok()
            .and_then(|y| x.checked_pow(y))
            .map(Value::Int)
            .ok_or(EvalError::Overflow("**")),
        _ => Ok(Value::Float(base.as_f64().powf(exp.as_f64()))),
    }
}

/// Convert an integral-valued float to Int, failing outside i64 range.
pub(crate) fn float_to_int(x: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Ok(x as i64)
    } else {
        Err(EvalError::Invalid(format!(
            "Cannot convert {} to an integer",
            crate::value::format_float(x)
        )))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Comparison
// ═══════════════════════════════════════════════════════════════════════

/// Numeric ordering; `None` when a NaN is involved.
pub(crate) fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

/// Evaluate `> < >= <= == !=`.
pub(crate) fn eval_comparison(op: Op, left: &Value, right: &Value) -> Result<Value> {
    let result = match op {
        Op::Eq => left.is_equal(right),
        Op::Ne => !left.is_equal(right),
        _ => {
            let ordering = compare_numbers(left.as_number()?, right.as_number()?);
            match op {
                Op::Gt => ordering == Some(Ordering::Greater),
                Op::Lt => ordering == Some(Ordering::Less),
                Op::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                Op::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                other => {
                    return Err(EvalError::Internal(format!(
                        "'{}' is not a comparison",
                        other.name()
                    )))
                }
            }
        }
    };
    Ok(Value::Bool(result))
}

// ═══════════════════════════════════════════════════════════════════════
// Indexing
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate `container : key`.
///
/// Objects and lists yield a write-through reference (the slot is only
/// checked when read or written); strings yield a one-character string.
pub(crate) fn eval_index(container: &Value, key: &Value, ids: &mut IdGenerator) -> Result<Value> {
    match (container, key) {
        (Value::Object(obj), Value::String(name)) => Ok(Value::Variable(ids.variable(
            Container::Object(obj.clone()),
            FieldKey::Name(name.clone()),
        ))),
        (Value::List(list), Value::Int(_) | Value::Bool(_)) => Ok(Value::Variable(ids.variable(
            Container::List(list.clone()),
            FieldKey::Index(key.as_int()?),
        ))),
        (Value::String(s), Value::Int(_) | Value::Bool(_)) => {
            let index = key.as_int()?;
            let len = s.chars().count();
            resolve_index(index, len)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .ok_or(EvalError::IndexOutOfBounds { index, len })
        }
        _ => Err(EvalError::UnsupportedOperands {
            op: ":",
            left: container.type_name(),
            right: key.type_name(),
        }),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Assignment
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate `=` and the compound assignments. Yields the target reference.
///
/// Compound forms read through the target, combine with the full
/// arithmetic rules, then write back.
pub(crate) fn eval_assign(op: Op, target: &Value, value: Value, ids: &mut IdGenerator) -> Result<Value> {
    let var = target.as_variable()?;
    let new_value = match base_operator(op) {
        None => value,
        Some(base) => eval_arithmetic(base, &var.get()?, &value, ids)?,
    };
    var.set(new_value)?;
    Ok(target.clone())
}

/// Arithmetic operator behind a compound assignment.
fn base_operator(op: Op) -> Option<Op> {
    match op {
        Op::AddAssign => Some(Op::Add),
        Op::SubAssign => Some(Op::Sub),
        Op::MulAssign => Some(Op::Mul),
        Op::DivAssign => Some(Op::Div),
        Op::IntDivAssign => Some(Op::IntDiv),
        Op::ModAssign => Some(Op::Mod),
        Op::PowAssign => Some(Op::Pow),
        _ => None,
    }
}
