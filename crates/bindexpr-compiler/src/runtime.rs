//! Runtime semantics shared by compiled fragments and static folding.
//!
//! Host objects answer member, method, and indexer requests themselves
//! through [`ScriptObject`](bindexpr_core::ScriptObject). Strings, lists, and
//! functions get a small set of built-ins here.

use std::cmp::Ordering;

use bindexpr_core::{BinaryOp, RuntimeError, UnaryOp, Value};

type Result<T> = std::result::Result<T, RuntimeError>;

/// Read a member of a value.
pub fn get_member(target: &Value, name: &str) -> Result<Value> {
    match target {
        Value::Object(obj) => obj.get_member(name),
        Value::Null => Err(RuntimeError::NullReference {
            member: name.to_string(),
        }),
        Value::String(s) if name == "Length" => Ok(Value::Int(s.chars().count() as i64)),
        Value::List(items) if name == "Count" || name == "Length" => {
            Ok(Value::Int(items.len() as i64))
        }
        other => Err(RuntimeError::UnknownMember {
            member: name.to_string(),
            type_name: other.type_name(),
        }),
    }
}

/// Read through an indexer.
pub fn get_index(target: &Value, args: &[Value]) -> Result<Value> {
    match (target, args) {
        (Value::Object(obj), _) => obj.get_index(args),
        (Value::Null, _) => Err(RuntimeError::NullReference {
            member: "[]".to_string(),
        }),
        (Value::List(items), [Value::Int(i)]) => usize::try_from(*i)
            .ok()
            .and_then(|idx| items.get(idx))
            .cloned()
            .ok_or(RuntimeError::IndexOutOfRange {
                index: *i,
                len: items.len(),
            }),
        (Value::String(s), [Value::Int(i)]) => usize::try_from(*i)
            .ok()
            .and_then(|idx| s.chars().nth(idx))
            .map(|ch| Value::from(ch.to_string()))
            .ok_or_else(|| RuntimeError::IndexOutOfRange {
                index: *i,
                len: s.chars().count(),
            }),
        (other, _) => Err(RuntimeError::TypeMismatch {
            expected: "indexable value".to_string(),
            actual: other.type_name(),
        }),
    }
}

/// Invoke a method on a value.
pub fn call_method(target: &Value, name: &str, args: &[Value]) -> Result<Value> {
    match target {
        Value::Object(obj) => obj.call_method(name, args),
        Value::Null => Err(RuntimeError::NullReference {
            member: format!("{}()", name),
        }),
        Value::Function(func) if name == "Invoke" => func.call(args),
        _ => call_builtin(target, name, args),
    }
}

fn call_builtin(target: &Value, name: &str, args: &[Value]) -> Result<Value> {
    match (name, args) {
        ("ToString", []) => return Ok(Value::from(target.to_string())),
        ("Equals", [other]) => return Ok(Value::Bool(target == other)),
        _ => {}
    }

    match target {
        Value::String(s) => match (name, args) {
            ("ToUpper", []) => Ok(Value::from(s.to_uppercase())),
            ("ToLower", []) => Ok(Value::from(s.to_lowercase())),
            ("Trim", []) => Ok(Value::from(s.trim())),
            ("Contains", [Value::String(p)]) => Ok(Value::Bool(s.contains(&**p))),
            ("StartsWith", [Value::String(p)]) => Ok(Value::Bool(s.starts_with(&**p))),
            ("EndsWith", [Value::String(p)]) => Ok(Value::Bool(s.ends_with(&**p))),
            ("Substring", [Value::Int(start)]) => substring(s, *start, None),
            ("Substring", [Value::Int(start), Value::Int(len)]) => substring(s, *start, Some(*len)),
            _ => Err(unknown_method(target, name)),
        },
        Value::List(items) => match (name, args) {
            ("Contains", [value]) => Ok(Value::Bool(items.iter().any(|item| item == value))),
            ("Any", []) => Ok(Value::Bool(!items.is_empty())),
            ("First", []) => items.first().cloned().ok_or(RuntimeError::IndexOutOfRange {
                index: 0,
                len: 0,
            }),
            ("Select", [Value::Function(f)]) => {
                let mapped = items
                    .iter()
                    .map(|item| f.call(std::slice::from_ref(item)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::from(mapped))
            }
            ("Where", [Value::Function(f)]) => {
                let mut kept = Vec::new();
                for item in items.iter() {
                    if expect_bool(&f.call(std::slice::from_ref(item))?)? {
                        kept.push(item.clone());
                    }
                }
                Ok(Value::from(kept))
            }
            ("Any", [Value::Function(f)]) => {
                for item in items.iter() {
                    if expect_bool(&f.call(std::slice::from_ref(item))?)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            _ => Err(unknown_method(target, name)),
        },
        _ => Err(unknown_method(target, name)),
    }
}

fn substring(s: &str, start: i64, len: Option<i64>) -> Result<Value> {
    let count = s.chars().count();
    let start_idx = usize::try_from(start)
        .ok()
        .filter(|&i| i <= count)
        .ok_or(RuntimeError::IndexOutOfRange { index: start, len: count })?;
    let take = match len {
        Some(len) => usize::try_from(len)
            .ok()
            .filter(|&l| l <= count - start_idx)
            .ok_or_else(|| RuntimeError::IndexOutOfRange {
                index: start.saturating_add(len),
                len: count,
            })?,
        None => count - start_idx,
    };
    Ok(Value::from(s.chars().skip(start_idx).take(take).collect::<String>()))
}

fn unknown_method(target: &Value, name: &str) -> RuntimeError {
    RuntimeError::UnknownMethod {
        method: name.to_string(),
        type_name: target.type_name(),
    }
}

/// Require a boolean value.
pub fn expect_bool(value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| RuntimeError::TypeMismatch {
        expected: "bool".to_string(),
        actual: value.type_name(),
    })
}

fn no_operator(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::NoOperator {
        op: op.to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

/// Integer arithmetic and bitwise operators.
pub fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value> {
    use BinaryOp::*;
    Ok(match op {
        Add => Value::Int(a.wrapping_add(b)),
        Sub => Value::Int(a.wrapping_sub(b)),
        Mul => Value::Int(a.wrapping_mul(b)),
        Div if b == 0 => return Err(RuntimeError::DivisionByZero),
        Div => Value::Int(a.wrapping_div(b)),
        Rem if b == 0 => return Err(RuntimeError::DivisionByZero),
        Rem => Value::Int(a.wrapping_rem(b)),
        BitwiseAnd => Value::Int(a & b),
        BitwiseOr => Value::Int(a | b),
        BitwiseXor => Value::Int(a ^ b),
        ShiftLeft => Value::Int(a.wrapping_shl(b as u32)),
        ShiftRight => Value::Int(a.wrapping_shr(b as u32)),
        _ => return Err(no_operator(op, &Value::Int(a), &Value::Int(b))),
    })
}

/// Floating point arithmetic.
pub fn double_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value> {
    use BinaryOp::*;
    Ok(Value::Double(match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div => a / b,
        Rem => a % b,
        _ => return Err(no_operator(op, &Value::Double(a), &Value::Double(b))),
    }))
}

/// String concatenation; null renders as empty.
pub fn concat(left: &Value, right: &Value) -> Value {
    Value::from(format!("{}{}", left, right))
}

/// Evaluate a comparison or equality operator.
pub fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<bool> {
    use BinaryOp::*;
    match op {
        Equal => return Ok(left == right),
        NotEqual => return Ok(left != right),
        _ => {}
    }

    let ordering = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return Ok(false),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) => match (a.as_double(), b.as_double()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => return Err(no_operator(op, left, right)),
        },
    };

    Ok(match ordering {
        None => false,
        Some(ord) => match op {
            Less => ord == Ordering::Less,
            LessEqual => ord != Ordering::Greater,
            Greater => ord == Ordering::Greater,
            GreaterEqual => ord != Ordering::Less,
            _ => return Err(no_operator(op, left, right)),
        },
    })
}

/// Evaluate any binary operator on already-evaluated operands.
///
/// Short-circuit operators are evaluated eagerly here; compiled fragments
/// short-circuit before reaching this function.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    use BinaryOp::*;
    match op {
        NullCoalescing => Ok(if left.is_null() {
            right.clone()
        } else {
            left.clone()
        }),
        LogicalAnd => Ok(Value::Bool(expect_bool(left)? && expect_bool(right)?)),
        LogicalOr => Ok(Value::Bool(expect_bool(left)? || expect_bool(right)?)),
        _ if op.is_comparison() => compare(op, left, right).map(Value::Bool),
        _ => match (left, right) {
            (Value::Int(a), Value::Int(b)) => int_binary(op, *a, *b),
            (Value::Bool(a), Value::Bool(b)) => match op {
                BitwiseAnd => Ok(Value::Bool(a & b)),
                BitwiseOr => Ok(Value::Bool(a | b)),
                BitwiseXor => Ok(Value::Bool(a ^ b)),
                _ => Err(no_operator(op, left, right)),
            },
            (Value::String(_), _) | (_, Value::String(_)) if op == Add => Ok(concat(left, right)),
            (a, b) => match (a.as_double(), b.as_double()) {
                (Some(x), Some(y)) => double_binary(op, x, y),
                _ => Err(no_operator(op, left, right)),
            },
        },
    }
}

/// Evaluate an arithmetic or logical unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Minus, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
        (UnaryOp::Minus, Value::Double(v)) => Ok(Value::Double(-v)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::BitwiseNot, Value::Int(v)) => Ok(Value::Int(!v)),
        (op, value) => Err(RuntimeError::TypeMismatch {
            expected: format!("operand for '{}'", op),
            actual: value.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindexpr_core::Function;

    #[test]
    fn builtin_members() {
        assert_eq!(
            get_member(&Value::from("héllo"), "Length").unwrap(),
            Value::Int(5)
        );
        let list = Value::list([Value::from(1), Value::from(2)]);
        assert_eq!(get_member(&list, "Count").unwrap(), Value::Int(2));
        assert!(matches!(
            get_member(&Value::Null, "Name"),
            Err(RuntimeError::NullReference { .. })
        ));
        assert!(matches!(
            get_member(&Value::Int(1), "Name"),
            Err(RuntimeError::UnknownMember { .. })
        ));
    }

    #[test]
    fn list_and_string_indexers() {
        let list = Value::list([Value::from("a"), Value::from("b")]);
        assert_eq!(
            get_index(&list, &[Value::Int(1)]).unwrap(),
            Value::from("b")
        );
        assert_eq!(
            get_index(&list, &[Value::Int(2)]),
            Err(RuntimeError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            get_index(&Value::from("xyz"), &[Value::Int(0)]).unwrap(),
            Value::from("x")
        );
        assert!(get_index(&list, &[Value::Int(-1)]).is_err());
    }

    #[test]
    fn string_builtins() {
        let s = Value::from("  Hello ");
        assert_eq!(call_method(&s, "Trim", &[]).unwrap(), Value::from("Hello"));
        let s = Value::from("Hello");
        assert_eq!(
            call_method(&s, "ToUpper", &[]).unwrap(),
            Value::from("HELLO")
        );
        assert_eq!(
            call_method(&s, "Substring", &[Value::Int(1), Value::Int(3)]).unwrap(),
            Value::from("ell")
        );
        assert!(call_method(&s, "Substring", &[Value::Int(9)]).is_err());
        assert_eq!(
            call_method(&s, "Substring", &[Value::Int(1), Value::Int(i64::MAX)]),
            Err(RuntimeError::IndexOutOfRange { index: i64::MAX, len: 5 })
        );
        assert!(call_method(&s, "Substring", &[Value::Int(1), Value::Int(-1)]).is_err());
        assert_eq!(
            call_method(&Value::Int(4), "ToString", &[]).unwrap(),
            Value::from("4")
        );
    }

    #[test]
    fn list_builtins_with_functions() {
        let list = Value::list([Value::from(1), Value::from(2), Value::from(3)]);
        let double = Value::Function(Function::new(1, |args| {
            Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
        }));
        let odd = Value::Function(Function::new(1, |args| {
            Ok(Value::Bool(args[0].as_int().unwrap_or(0) % 2 == 1))
        }));
        assert_eq!(
            call_method(&list, "Select", &[double]).unwrap(),
            Value::list([Value::from(2), Value::from(4), Value::from(6)])
        );
        assert_eq!(
            call_method(&list, "Where", &[odd.clone()]).unwrap(),
            Value::list([Value::from(1), Value::from(3)])
        );
        assert_eq!(
            call_method(&list, "Any", &[odd]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn arithmetic_and_division() {
        assert_eq!(int_binary(BinaryOp::Add, 2, 3).unwrap(), Value::Int(5));
        assert_eq!(
            int_binary(BinaryOp::Div, 1, 0),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Mul, &Value::Int(2), &Value::Double(1.5)).unwrap(),
            Value::Double(3.0)
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::from("n="), &Value::Int(1)).unwrap(),
            Value::from("n=1")
        );
        assert!(binary(BinaryOp::Sub, &Value::from("a"), &Value::Int(1)).is_err());
    }

    #[test]
    fn comparisons() {
        assert!(compare(BinaryOp::Less, &Value::Int(1), &Value::Double(1.5)).unwrap());
        assert!(compare(BinaryOp::GreaterEqual, &Value::from("b"), &Value::from("a")).unwrap());
        assert!(!compare(BinaryOp::Less, &Value::Null, &Value::Int(1)).unwrap());
        assert!(compare(BinaryOp::Equal, &Value::Null, &Value::Null).unwrap());
        assert!(compare(BinaryOp::Less, &Value::Bool(true), &Value::Int(1)).is_err());
    }

    #[test]
    fn null_coalescing_and_logic() {
        let coalesce = |l: Value| binary(BinaryOp::NullCoalescing, &l, &Value::Int(1)).unwrap();
        assert_eq!(coalesce(Value::Null), Value::Int(1));
        assert_eq!(coalesce(Value::Int(2)), Value::Int(2));
        assert!(binary(BinaryOp::LogicalAnd, &Value::Int(1), &Value::Bool(true)).is_err());
    }

    #[test]
    fn unary_operators() {
        assert_eq!(
            unary(UnaryOp::Minus, &Value::Int(3)).unwrap(),
            Value::Int(-3)
        );
        assert_eq!(
            unary(UnaryOp::Not, &Value::Bool(false)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            unary(UnaryOp::BitwiseNot, &Value::Int(0)).unwrap(),
            Value::Int(-1)
        );
        assert!(unary(UnaryOp::Not, &Value::Int(1)).is_err());
    }
}
