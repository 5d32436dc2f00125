//! Conversions between [`Value`]s, declared slot types, and Rust types.
//!
//! - [`Value::convert_to`]: coerce a runtime value to a declared [`TypeHash`]
//! - [`FromValue`]: extract a Rust value from a [`Value`]
//!
//! ## Coercion rules
//!
//! | from \ to | same type | `object` | `double` | `string` |
//! |-----------|-----------|----------|----------|----------|
//! | `int`     | identity  | identity | widen    | error    |
//! | null      | identity  | identity | error    | identity |
//!
//! Null converts to every non-primitive type (strings, lists, objects) and
//! is rejected for `bool`, `int` and `double`.

use crate::error::RuntimeError;
use crate::type_hash::{TypeHash, primitives};
use crate::value::Value;

impl Value {
    /// Coerce this value to a declared slot type.
    pub fn convert_to(self, ty: TypeHash) -> Result<Value, RuntimeError> {
        if ty == primitives::OBJECT || self.type_hash() == ty {
            return Ok(self);
        }
        match (self, ty) {
            (Value::Int(v), primitives::DOUBLE) => Ok(Value::Double(v as f64)),
            (Value::Null, ty) if !is_value_type(ty) => Ok(Value::Null),
            (value, ty) => Err(RuntimeError::TypeMismatch {
                expected: ty.to_string(),
                actual: value.type_name(),
            }),
        }
    }
}

/// Whether the type cannot hold null.
pub fn is_value_type(ty: TypeHash) -> bool {
    ty == primitives::BOOL || ty == primitives::INT || ty == primitives::DOUBLE
}

/// Extract a Rust value from a [`Value`].
pub trait FromValue: Sized {
    /// Extract, failing with a type mismatch when the value has another kind.
    fn from_value(value: &Value) -> Result<Self, RuntimeError>;
}

fn mismatch(expected: &str, value: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected: expected.to_string(),
        actual: value.type_name(),
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, RuntimeError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            RuntimeError::TypeMismatch {
                                expected: stringify!($ty).to_string(),
                                actual: format!("int {}", v),
                            }
                        }),
                        other => Err(mismatch(stringify!($ty), other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        value.as_double().ok_or_else(|| mismatch("double", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_and_object_conversions() {
        let v = Value::from("x").convert_to(primitives::STRING).unwrap();
        assert_eq!(v, Value::from("x"));
        let v = Value::from(3).convert_to(primitives::OBJECT).unwrap();
        assert_eq!(v, Value::Int(3));
    }

    #[test]
    fn int_widens_to_double() {
        let v = Value::from(3).convert_to(primitives::DOUBLE).unwrap();
        assert!(matches!(v, Value::Double(d) if d == 3.0));
    }

    #[test]
    fn null_converts_to_reference_types_only() {
        assert!(Value::Null.convert_to(primitives::STRING).is_ok());
        assert!(Value::Null.convert_to(TypeHash::from_name("Person")).is_ok());
        assert!(Value::Null.convert_to(primitives::INT).is_err());
    }

    #[test]
    fn mismatch_reports_types() {
        let err = Value::from("x").convert_to(primitives::INT).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TypeMismatch {
                expected: "int".into(),
                actual: "string".into()
            }
        );
    }

    #[test]
    fn from_value_extraction() {
        assert_eq!(i32::from_value(&Value::Int(7)).unwrap(), 7);
        assert!(u8::from_value(&Value::Int(300)).is_err());
        assert_eq!(f64::from_value(&Value::Int(2)).unwrap(), 2.0);
        assert_eq!(String::from_value(&Value::from("a")).unwrap(), "a");
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert!(bool::from_value(&Value::Int(1)).is_err());
    }
}
