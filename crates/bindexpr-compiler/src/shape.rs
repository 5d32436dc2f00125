//! Argument shape keys for the invoker cache.
//!
//! A compiled expression specializes its code on the declared types of its
//! arguments. [`ShapeKey`] is the cache key: the ordered list of argument
//! types, with a dedicated single-type form.
//!
//! A one-element type list always normalizes to [`ShapeKey::Single`], so a
//! call with one argument hits the same cache entry whichever way its shape
//! was built. A `Single` key never equals a `Sequence` key.

use std::hash::{Hash, Hasher};

use bindexpr_core::{ParameterValue, TypeHash};

/// Types of one invocation's arguments.
#[derive(Debug, Clone)]
pub enum ShapeKey {
    /// Exactly one argument.
    Single(TypeHash),
    /// Zero or several arguments, in slot order.
    Sequence(Box<[TypeHash]>),
}

impl ShapeKey {
    /// Key for a single argument type.
    pub fn single(ty: TypeHash) -> Self {
        ShapeKey::Single(ty)
    }

    /// Key for an ordered list of argument types.
    pub fn from_types(types: &[TypeHash]) -> Self {
        match types {
            [ty] => ShapeKey::Single(*ty),
            _ => ShapeKey::Sequence(types.into()),
        }
    }

    /// Key for a set of argument values.
    pub fn of(args: &[ParameterValue]) -> Self {
        match args {
            [arg] => ShapeKey::Single(arg.ty),
            _ => ShapeKey::Sequence(args.iter().map(|arg| arg.ty).collect()),
        }
    }

    /// Argument types in slot order.
    pub fn types(&self) -> &[TypeHash] {
        match self {
            ShapeKey::Single(ty) => std::slice::from_ref(ty),
            ShapeKey::Sequence(types) => types,
        }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.types().len()
    }

    /// Whether this is the zero-argument shape.
    pub fn is_empty(&self) -> bool {
        self.types().is_empty()
    }
}

impl PartialEq for ShapeKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ShapeKey::Single(a), ShapeKey::Single(b)) => a == b,
            (ShapeKey::Sequence(a), ShapeKey::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ShapeKey {}

impl Hash for ShapeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(TypeHash::from_sequence(self.types()).as_u64());
    }
}
