//! Runtime values flowing through compiled binding expressions.
//!
//! [`Value`] is the dynamic representation of anything a binding member can
//! produce or a compiled expression can return. Host objects participate
//! through the [`ScriptObject`] trait; compiled lambdas are [`Function`]s.

use std::fmt;
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::type_hash::{TypeHash, primitives};

/// A host object reachable from binding expressions.
///
/// Implementors expose members, methods, and indexers by name. The default
/// implementations report the member as unknown.
pub trait ScriptObject: Send + Sync + fmt::Debug {
    /// Runtime type identity of this object.
    fn type_hash(&self) -> TypeHash;

    /// Human-readable type name, used in error messages.
    fn type_name(&self) -> &str;

    /// Read a member (property or field).
    fn get_member(&self, name: &str) -> Result<Value, RuntimeError> {
        Err(RuntimeError::UnknownMember {
            member: name.to_string(),
            type_name: self.type_name().to_string(),
        })
    }

    /// Invoke a method.
    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let _ = args;
        Err(RuntimeError::UnknownMethod {
            method: name.to_string(),
            type_name: self.type_name().to_string(),
        })
    }

    /// Read through an indexer.
    fn get_index(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        let _ = args;
        Err(RuntimeError::UnknownMember {
            member: "[]".to_string(),
            type_name: self.type_name().to_string(),
        })
    }
}

type FunctionBody = dyn Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync;

/// A callable value, produced by compiling a lambda.
#[derive(Clone)]
pub struct Function {
    arity: usize,
    body: Arc<FunctionBody>,
}

impl Function {
    /// Wrap a closure taking `arity` arguments.
    pub fn new<F>(arity: usize, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            arity,
            body: Arc::new(body),
        }
    }

    /// Number of parameters the function expects.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Call the function.
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        if args.len() != self.arity {
            return Err(RuntimeError::ArgumentCount {
                expected: self.arity,
                got: args.len(),
            });
        }
        (self.body)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function(arity={})", self.arity)
    }
}

/// A dynamic runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// Null / absent
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Double(f64),
    /// Immutable string
    String(Arc<str>),
    /// Immutable list
    List(Arc<[Value]>),
    /// Host object
    Object(Arc<dyn ScriptObject>),
    /// Compiled lambda
    Function(Function),
}

impl Value {
    /// Runtime type of this value. Null has the empty type.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            Value::Null => TypeHash::EMPTY,
            Value::Bool(_) => primitives::BOOL,
            Value::Int(_) => primitives::INT,
            Value::Double(_) => primitives::DOUBLE,
            Value::String(_) => primitives::STRING,
            Value::List(_) => primitives::LIST,
            Value::Object(obj) => obj.type_hash(),
            Value::Function(_) => primitives::FUNCTION,
        }
    }

    /// Human-readable type name.
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(obj) => obj.type_name().to_string(),
            other => other.type_hash().to_string(),
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer payload.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get a numeric payload, widening integers.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    /// Get the list payload.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(&**items),
            _ => None,
        }
    }

    /// Get the host object.
    pub fn as_object(&self) -> Option<&Arc<dyn ScriptObject>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get the function payload.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Build a host object value.
    pub fn object(obj: impl ScriptObject + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Double(v) => write!(f, "Double({})", v),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(obj) => write!(f, "Object({:?})", obj),
            Value::Function(func) => write!(f, "{:?}", func),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => f.write_str(obj.type_name()),
            Value::Function(_) => f.write_str("<function>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Int(a), Value::Double(b)) | (Value::Double(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.body, &b.body),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v.into())
    }
}

impl From<Arc<dyn ScriptObject>> for Value {
    fn from(v: Arc<dyn ScriptObject>) -> Self {
        Value::Object(v)
    }
}

impl From<Function> for Value {
    fn from(v: Function) -> Self {
        Value::Function(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One runtime-bound argument slot: a value and its declared type.
///
/// An empty slot carries `TypeHash::EMPTY` and `Value::Null`. A typed null
/// (for example a string member that currently holds null) keeps its type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterValue {
    /// Declared type of the slot.
    pub ty: TypeHash,
    /// Current value.
    pub value: Value,
}

impl ParameterValue {
    /// Create a slot whose type is taken from the value itself.
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            ty: value.type_hash(),
            value,
        }
    }

    /// Create a slot with an explicit declared type.
    pub fn typed(ty: TypeHash, value: impl Into<Value>) -> Self {
        let value = value.into();
        debug_assert!(
            !(ty.is_empty() && !value.is_null()),
            "non-null argument values must carry a type"
        );
        Self { ty, value }
    }

    /// The empty slot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty slot.
    pub fn is_empty(&self) -> bool {
        self.ty.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Probe;

    impl ScriptObject for Probe {
        fn type_hash(&self) -> TypeHash {
            TypeHash::from_name("Probe")
        }

        fn type_name(&self) -> &str {
            "Probe"
        }
    }

    #[test]
    fn value_type_hashes() {
        assert_eq!(Value::Null.type_hash(), TypeHash::EMPTY);
        assert_eq!(Value::from(1).type_hash(), primitives::INT);
        assert_eq!(Value::from(1.5).type_hash(), primitives::DOUBLE);
        assert_eq!(Value::from("a").type_hash(), primitives::STRING);
        assert_eq!(
            Value::object(Probe).type_hash(),
            TypeHash::from_name("Probe")
        );
    }

    #[test]
    fn numeric_equality_crosses_kinds() {
        assert_eq!(Value::Int(2), Value::Double(2.0));
        assert_ne!(Value::Int(2), Value::from("2"));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a: Arc<dyn ScriptObject> = Arc::new(Probe);
        let b: Arc<dyn ScriptObject> = Arc::new(Probe);
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn default_object_members_are_unknown() {
        let err = Probe.get_member("Name").unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownMember { .. }));
        let err = Probe.call_method("Run", &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownMethod { .. }));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::list([Value::from(1), Value::from("x")]).to_string(),
            "[1, x]"
        );
    }

    #[test]
    fn function_checks_arity() {
        let f = Function::new(1, |args| Ok(args[0].clone()));
        assert_eq!(f.call(&[Value::from(3)]).unwrap(), Value::Int(3));
        assert!(matches!(
            f.call(&[]),
            Err(RuntimeError::ArgumentCount { expected: 1, got: 0 })
        ));
    }

    #[test]
    fn parameter_value_infers_type() {
        let p = ParameterValue::new("text");
        assert_eq!(p.ty, primitives::STRING);
        assert!(ParameterValue::empty().is_empty());
        let typed_null = ParameterValue::typed(primitives::STRING, Value::Null);
        assert!(!typed_null.is_empty());
    }

    #[test]
    fn default_parameter_value_is_an_empty_slot() {
        let p = ParameterValue::default();
        assert!(p.is_empty());
        assert_eq!(p, ParameterValue::empty());
    }
}
