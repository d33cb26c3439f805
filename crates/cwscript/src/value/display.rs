//! Display and Debug implementations for Value

use std::collections::HashSet;
use std::fmt;

use super::*;

impl Value {
    /// Human-readable rendering.
    ///
    /// `isolated` is false for values nested inside a list or object, in
    /// which case strings are wrapped in double quotes. The output is not
    /// escaped and cannot be parsed back.
    pub fn to_display(&self, isolated: bool) -> String {
        let mut out = String::new();
        render(self, isolated, &mut out);
        out
    }
}

/// Pending rendering work, processed from the end of the worklist.
enum Piece {
    Value(Value, bool),
    Separator,
    Key(String),
    Close(ValueId, char),
}

/// Render without native recursion, so nesting depth is bounded only by
/// memory. `open` holds the ids of containers currently being rendered; a
/// container that contains itself prints as `[...]` / `{...}`.
fn render(value: &Value, isolated: bool, out: &mut String) {
    let mut open = HashSet::new();
    let mut pending = vec![Piece::Value(value.clone(), isolated)];
    while let Some(piece) = pending.pop() {
        let value = match piece {
            Piece::Value(value, isolated) => match value {
                Value::String(s) if isolated => {
                    out.push_str(&s);
                    continue;
                }
                other => other,
            },
            Piece::Separator => {
                out.push_str(", ");
                continue;
            }
            Piece::Key(key) => {
                out.push_str(&key);
                out.push_str(": ");
                continue;
            }
            Piece::Close(id, bracket) => {
                open.remove(&id);
                out.push(bracket);
                continue;
            }
        };
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if b { "true" } else { "false" }),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(x) => out.push_str(&format_float(x)),
            Value::String(s) => {
                out.push('"');
                out.push_str(&s);
                out.push('"');
            }
            Value::List(list) => {
                if !open.insert(list.id()) {
                    out.push_str("[...]");
                    continue;
                }
                out.push('[');
                pending.push(Piece::Close(list.id(), ']'));
                let items = list.borrow();
                for (i, item) in items.iter().enumerate().rev() {
                    pending.push(Piece::Value(item.clone(), false));
                    if i > 0 {
                        pending.push(Piece::Separator);
                    }
                }
            }
            Value::Object(obj) => {
                if !open.insert(obj.id()) {
                    out.push_str("{...}");
                    continue;
                }
                out.push('{');
                pending.push(Piece::Close(obj.id(), '}'));
                let fields = obj.borrow();
                for (i, (key, item)) in fields.iter().enumerate().rev() {
                    pending.push(Piece::Value(item.clone(), false));
                    pending.push(Piece::Key(key.clone()));
                    if i > 0 {
                        pending.push(Piece::Separator);
                    }
                }
            }
            Value::Function(func) => out.push_str(&format!("FUNC:0x{:x}", func.id())),
            Value::Variable(var) => out.push_str(&format!("VAR:0x{:x}", var.id())),
        }
    }
}

/// Floats always show a fractional part or exponent, so `3.0` never
/// prints like the integer `3`.
pub(crate) fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // Rust prints `1e20`; keep an explicit sign on the exponent.
        let s = format!("{:e}", x);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }
    if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display(true))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.to_display(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_float_format() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(2.5e-7), "2.5e-7");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_nested_strings_are_quoted() {
        let mut ids = IdGenerator::new();
        let list = ids.list_value(vec![Value::string("a"), Value::Int(1), Value::Null]);
        assert_eq!(list.to_display(true), r#"["a", 1, null]"#);
        assert_eq!(Value::string("a").to_display(true), "a");
        assert_eq!(Value::string("a").to_display(false), r#""a""#);
    }

    #[test]
    fn test_object_display() {
        let mut ids = IdGenerator::new();
        let obj = ids.empty_object();
        obj.set("name", Value::string("x"));
        obj.set("n", Value::Float(2.0));
        assert_eq!(Value::Object(obj).to_string(), r#"{name: "x", n: 2.0}"#);
    }

    #[test]
    fn test_self_containing_list() {
        let mut ids = IdGenerator::new();
        let list = ids.list(vec![Value::Int(1)]);
        list.push(Value::List(list.clone()));
        assert_eq!(Value::List(list).to_string(), "[1, [...]]");
    }

    #[test]
    fn test_shared_sibling_is_not_a_cycle() {
        let mut ids = IdGenerator::new();
        let inner = ids.list_value(vec![Value::Int(1)]);
        let outer = ids.list_value(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "[[1], [1]]");
    }

    #[test]
    fn test_nested_object_in_list() {
        let mut ids = IdGenerator::new();
        let obj = ids.empty_object();
        obj.set("k", Value::string("v"));
        let list = ids.list_value(vec![Value::Object(obj), Value::string("s")]);
        assert_eq!(list.to_string(), r#"[{k: "v"}, "s"]"#);
    }

    #[test]
    fn test_function_display_uses_hex_id() {
        let mut ids = IdGenerator::new();
        for _ in 0..9 {
            ids.next_id();
        }
        let body = std::rc::Rc::new(crate::ast::Block::new(0, Vec::new()));
        let func = ids.function(std::rc::Rc::from(Vec::<String>::new()), body);
        assert_eq!(Value::Function(func).to_string(), "FUNC:0xa");
    }
}
