//! Fixed-arity operations: dispatch plus the named built-ins

use std::cmp::Ordering;
use std::io::Write;

use rand::Rng;

use super::binary::{
    compare_numbers, eval_arithmetic, eval_assign, eval_comparison, eval_index, float_to_int,
};
use super::control::Interrupt;
use super::unary::{eval_neg, eval_not, eval_update};
use super::State;
use crate::ast::Op;
use crate::error::{CatchableError, EvalError, Result};
use crate::value::Number;
use crate::Value;

/// Apply `op` to its fully evaluated arguments (in source order).
pub(crate) fn apply(op: Op, args: Vec<Value>, st: &mut State) -> Result<Value> {
    if args.len() != op.arity() {
        return Err(EvalError::Internal(format!(
            "'{}' applied to {} arguments",
            op.name(),
            args.len()
        )));
    }
    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or(Value::Null);

    match op {
        // ═══════════════════════════════════════════════════════════════
        // Operators
        // ═══════════════════════════════════════════════════════════════
        Op::Add | Op::Sub | Op::Mul | Op::Div | Op::IntDiv | Op::Mod | Op::Pow => {
            let (a, b) = (next(), next());
            eval_arithmetic(op, &a, &b, &mut st.ids)
        }
        Op::Gt | Op::Lt | Op::Ge | Op::Le | Op::Eq | Op::Ne => {
            let (a, b) = (next(), next());
            eval_comparison(op, &a, &b)
        }
        Op::Index => {
            let (a, b) = (next(), next());
            eval_index(&a, &b, &mut st.ids)
        }
        Op::Assign
        | Op::AddAssign
        | Op::SubAssign
        | Op::MulAssign
        | Op::DivAssign
        | Op::IntDivAssign
        | Op::ModAssign
        | Op::PowAssign => {
            let (target, value) = (next(), next());
            eval_assign(op, &target, value, &mut st.ids)
        }
        Op::Neg => eval_neg(&next()),
        Op::Not => Ok(eval_not(&next())),
        Op::Inc | Op::Dec | Op::Invert => eval_update(op, &next()),

        // ═══════════════════════════════════════════════════════════════
        // Output, scopes and interrupts
        // ═══════════════════════════════════════════════════════════════
        Op::Print => {
            writeln!(st.out, "{}", next().to_display(true))?;
            Ok(Value::Null)
        }
        Op::Local => Ok(Value::Object(st.scopes.current().clone())),
        Op::Global => Ok(Value::Object(st.scopes.global().clone())),
        Op::Return => {
            let interrupt = Interrupt::return_value(next(), st.line);
            st.raise(interrupt)?;
            Ok(Value::Null)
        }
        Op::Break => {
            st.raise(Interrupt::break_loop(st.line))?;
            Ok(Value::Null)
        }
        Op::Continue => {
            st.raise(Interrupt::continue_loop(st.line))?;
            Ok(Value::Null)
        }
        Op::Throw => {
            let interrupt = Interrupt::exception(next(), st.line);
            st.raise(interrupt)?;
            Ok(Value::Null)
        }

        // ═══════════════════════════════════════════════════════════════
        // Strings and containers
        // ═══════════════════════════════════════════════════════════════
        Op::Len => eval_len(&next()),
        Op::Slice => {
            let (source, start, end) = (next(), next(), next());
            eval_slice(&source, start.as_int()?, Some(end.as_int()?), st)
        }
        Op::SliceAfter => {
            let (source, start) = (next(), next());
            eval_slice(&source, start.as_int()?, None, st)
        }
        Op::Find => {
            let (source, needle) = (next(), next());
            eval_find(&source, &needle)
        }
        Op::Replace => {
            let (s, from, to) = (next(), next(), next());
            Ok(Value::String(s.as_str()?.replace(from.as_str()?, to.as_str()?)))
        }
        Op::Upper => Ok(Value::String(next().as_str()?.to_uppercase())),
        Op::Lower => Ok(Value::String(next().as_str()?.to_lowercase())),
        Op::Merge => {
            let (a, b) = (next(), next());
            let mut items = a.as_list()?.snapshot();
            items.extend(b.as_list()?.snapshot());
            Ok(st.ids.list_value(items))
        }
        Op::Pop => {
            let (container, key) = (next(), next());
            match &container {
                Value::List(list) => list.pop(key.as_int()?),
                _ => container.as_object()?.remove(key.as_str()?),
            }
        }
        Op::Push => {
            let (list, value) = (next(), next());
            list.as_list()?.push(value);
            Ok(list)
        }
        Op::Range => {
            let end = next().as_int()?;
            Ok(st.ids.list_value((0..end.max(0)).map(Value::Int).collect()))
        }
        Op::RangeStep => {
            let (start, end, step) = (next().as_int()?, next().as_int()?, next().as_int()?);
            let items = stepped_range(start, end, step)?;
            Ok(st.ids.list_value(items))
        }
        Op::Keys => {
            let keys = next().as_object()?.keys();
            Ok(st.ids.list_value(keys.into_iter().map(Value::String).collect()))
        }
        Op::Values => {
            let values = next().as_object()?.values();
            Ok(st.ids.list_value(values))
        }

        // ═══════════════════════════════════════════════════════════════
        // Math
        // ═══════════════════════════════════════════════════════════════
        Op::Max | Op::Min => {
            let (a, b) = (next(), next());
            let ordering = compare_numbers(a.as_number()?, b.as_number()?);
            let wanted = if op == Op::Max {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            Ok(if ordering == Some(wanted) { a } else { b })
        }
        Op::Abs => match next().as_number()? {
            Number::Int(n) => n.checked_abs().map(Value::Int).ok_or(EvalError::Overflow("abs")),
            Number::Float(x) => Ok(Value::Float(x.abs())),
        },
        Op::Floor => round_with(next(), f64::floor),
        Op::Ceil => round_with(next(), f64::ceil),
        Op::Round => round_with(next(), f64::round_ties_even),
        Op::Sqrt => {
            let x = next().as_float()?;
            if x < 0.0 {
                return Err(CatchableError::math_domain("square root of a negative number").into());
            }
            Ok(Value::Float(x.sqrt()))
        }
        Op::Log => {
            let x = next().as_float()?;
            if x <= 0.0 {
                return Err(CatchableError::math_domain("logarithm of a non-positive number").into());
            }
            Ok(Value::Float(x.ln()))
        }
        Op::Sin => Ok(Value::Float(next().as_float()?.sin())),
        Op::Cos => Ok(Value::Float(next().as_float()?.cos())),
        Op::Tan => Ok(Value::Float(next().as_float()?.tan())),
        Op::Pi => Ok(Value::Float(std::f64::consts::PI)),
        Op::Random => Ok(Value::Float(st.rng.gen::<f64>())),
        Op::RandomInt => {
            let (low, high) = (next().as_int()?, next().as_int()?);
            if low > high {
                return Err(EvalError::Invalid(format!(
                    "random_int() range is empty: {} > {}",
                    low, high
                )));
            }
            Ok(Value::Int(st.rng.gen_range(low..=high)))
        }

        // ═══════════════════════════════════════════════════════════════
        // Conversion
        // ═══════════════════════════════════════════════════════════════
        Op::Str => Ok(Value::String(next().to_display(true))),
        Op::Int => to_int(&next()),
        Op::Float => to_float(&next()),
        Op::Type => Ok(Value::string(next().type_name())),
    }
}

fn eval_len(value: &Value) -> Result<Value> {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::List(list) => list.len(),
        Value::Object(obj) => obj.len(),
        other => {
            return Err(EvalError::Invalid(format!(
                "len() is not defined for {}",
                other.type_name()
            )))
        }
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| EvalError::Overflow("len"))
}

/// Clamp slice bounds into `[0, len]` the way sequence slicing does:
/// negative bounds count from the end, out-of-range bounds saturate and an
/// inverted range is empty.
fn slice_bounds(len: usize, start: i64, end: Option<i64>) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |i: i64| -> usize {
        let i = if i < 0 { i.saturating_add(len_i).max(0) } else { i.min(len_i) };
        usize::try_from(i).unwrap_or(0)
    };
    let start = clamp(start);
    let end = end.map_or(len, clamp);
    (start, end.max(start))
}

fn eval_slice(source: &Value, start: i64, end: Option<i64>, st: &mut State) -> Result<Value> {
    match source {
        Value::String(s) => {
            let (from, to) = slice_bounds(s.chars().count(), start, end);
            Ok(Value::String(s.chars().skip(from).take(to - from).collect()))
        }
        Value::List(list) => {
            let items = {
                let items = list.borrow();
                let (from, to) = slice_bounds(items.len(), start, end);
                items[from..to].to_vec()
            };
            Ok(st.ids.list_value(items))
        }
        other => Err(EvalError::Invalid(format!(
            "Cannot slice a value of type {}",
            other.type_name()
        ))),
    }
}

/// Strings and lists yield the first index or -1; objects yield the
/// first key bound to an equal value, or null.
fn eval_find(source: &Value, needle: &Value) -> Result<Value> {
    let index = match source {
        Value::String(s) => s
            .find(needle.as_str()?)
            .map(|byte| s[..byte].chars().count()),
        Value::List(list) => list.borrow().iter().position(|item| item.is_equal(needle)),
        Value::Object(obj) => {
            let found = obj
                .borrow()
                .iter()
                .find(|(_, value)| value.is_equal(needle))
                .map(|(key, _)| Value::String(key.clone()));
            return Ok(found.unwrap_or(Value::Null));
        }
        other => {
            return Err(EvalError::Invalid(format!(
                "find() is not defined for {}",
                other.type_name()
            )))
        }
    };
    match index {
        Some(i) => i64::try_from(i)
            .map(Value::Int)
            .map_err(|_| EvalError::Overflow("find")),
        None => Ok(Value::Int(-1)),
    }
}

/// Integers from `start` toward `end` (exclusive) by `step`; empty when
/// the step moves away from `end`.
fn stepped_range(start: i64, end: i64, step: i64) -> Result<Vec<Value>> {
    if step == 0 {
        return Err(EvalError::Invalid("range_step() step must not be zero".into()));
    }
    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        items.push(Value::Int(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(items)
}

fn round_with(value: Value, round: fn(f64) -> f64) -> Result<Value> {
    match value.as_number()? {
        Number::Int(n) => Ok(Value::Int(n)),
        Number::Float(x) => float_to_int(round(x)).map(Value::Int),
    }
}

fn to_int(value: &Value) -> Result<Value> {
    match value {
        Value::Bool(_) | Value::Int(_) => value.as_int().map(Value::Int),
        Value::Float(x) => float_to_int(x.trunc()).map(Value::Int),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::Invalid(format!("Invalid integer literal: '{}'", s))),
        other => Err(EvalError::Invalid(format!(
            "Cannot convert {} to int",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| EvalError::Invalid(format!("Invalid float literal: '{}'", s))),
        other => other.as_float().map(Value::Float),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice_bounds(5, 1, Some(3)), (1, 3));
        assert_eq!(slice_bounds(5, -2, None), (3, 5));
        assert_eq!(slice_bounds(5, 4, Some(2)), (4, 4));
        assert_eq!(slice_bounds(5, -10, Some(100)), (0, 5));
        assert_eq!(slice_bounds(0, 0, Some(1)), (0, 0));
    }

    #[test]
    fn test_stepped_range() {
        let ints = |v: Vec<Value>| -> Vec<i64> { v.iter().map(|x| x.as_int().unwrap()).collect() };
        assert_eq!(ints(stepped_range(0, 10, 3).unwrap()), vec![0, 3, 6, 9]);
        assert_eq!(ints(stepped_range(5, 0, -2).unwrap()), vec![5, 3, 1]);
        assert!(stepped_range(0, 5, -1).unwrap().is_empty());
        assert!(stepped_range(0, 5, 0).is_err());
    }

    #[test]
    fn test_find_in_string_counts_chars() {
        let found = eval_find(&Value::string("añb"), &Value::string("b")).unwrap();
        assert_eq!(found, Value::Int(2));
        let missing = eval_find(&Value::string("abc"), &Value::string("z")).unwrap();
        assert_eq!(missing, Value::Int(-1));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(to_int(&Value::Float(-2.7)).unwrap(), Value::Int(-2));
        assert_eq!(to_int(&Value::string(" 42 ")).unwrap(), Value::Int(42));
        assert!(to_int(&Value::string("4.2")).is_err());
        assert!(matches!(to_float(&Value::string("2.5")), Ok(Value::Float(x)) if x == 2.5));
        assert!(to_float(&Value::Null).is_err());
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_with(Value::Float(2.5), f64::round_ties_even).unwrap(), Value::Int(2));
        assert_eq!(round_with(Value::Float(3.5), f64::round_ties_even).unwrap(), Value::Int(4));
        assert_eq!(round_with(Value::Int(7), f64::floor).unwrap(), Value::Int(7));
    }
}
