//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash identifying the runtime type of a bound value.
//! Hashes are computed from type names, so host types and built-in value kinds
//! share one identity space without a registration step:
//!
//! - Same name = same hash
//! - Argument shapes can be hashed as an ordered sequence of type hashes
//! - `TypeHash::EMPTY` marks an empty (null) argument slot
//!
//! # Examples
//!
//! ```
//! use bindexpr_core::TypeHash;
//!
//! let a = TypeHash::from_name("Person");
//! let b = TypeHash::from_name("Person");
//! assert_eq!(a, b);
//!
//! let ab = TypeHash::from_sequence(&[a, TypeHash::from_name("int")]);
//! let ba = TypeHash::from_sequence(&[TypeHash::from_name("int"), a]);
//! assert_ne!(ab, ba);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for sequence components
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for argument shape hashes
    pub const SHAPE: u64 = 0x6b1d3c5f8e2a9047;

    /// Position mixing constants so element order matters.
    pub const POSITION_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a value type.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty hash, used for null argument slots.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Combine an ordered sequence of type hashes into one hash.
    ///
    /// Only the element hashes and their positions participate, so
    /// `[int, string]` and `[string, int]` hash differently.
    #[inline]
    pub fn from_sequence(types: &[TypeHash]) -> Self {
        let mut hash = hash_constants::SHAPE;
        for (i, ty) in types.iter().enumerate() {
            let marker = hash_constants::POSITION_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::POSITION_MARKERS[0].wrapping_add(i as u64));
            hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ ty.0);
        }
        TypeHash(hash)
    }

    /// Create a type hash for a Rust type.
    ///
    /// Uses the fully qualified Rust type name, so two distinct Rust types
    /// never collide with each other but may be referenced by name from a
    /// type resolver.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::from_name(std::any::type_name::<T>())
    }

    /// Check if this is the empty hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = primitives::name_of(*self) {
            write!(f, "TypeHash({})", name)
        } else {
            write!(f, "TypeHash({:#018x})", self.0)
        }
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match primitives::name_of(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#018x}", self.0),
        }
    }
}

/// Well-known hashes for built-in value kinds.
///
/// Pre-computed from `TypeHash::from_name()`.
pub mod primitives {
    use super::TypeHash;

    /// Hash for `bool`
    pub const BOOL: TypeHash = TypeHash(0x1e0c8fa4cced99c1);

    /// Hash for `int` (64-bit signed integer)
    pub const INT: TypeHash = TypeHash(0x4f5e5320cd1c92bf);

    /// Hash for `double`
    pub const DOUBLE: TypeHash = TypeHash(0xeb125587f6c2a79b);

    /// Hash for `string`
    pub const STRING: TypeHash = TypeHash(0x7a8d5fb1ba695978);

    /// Hash for `list`
    pub const LIST: TypeHash = TypeHash(0xa01b4d5b9a9cf394);

    /// Hash for `function` (compiled lambdas)
    pub const FUNCTION: TypeHash = TypeHash(0xdf10f2c0c4475842);

    /// Hash for `object`, the dynamic type used when nothing static is known
    pub const OBJECT: TypeHash = TypeHash(0x7453af4894759ab5);

    /// Hash for `type` (resolved static type references)
    pub const TYPE: TypeHash = TypeHash(0x507fcfa206f01436);

    /// Display name of a built-in hash.
    pub fn name_of(hash: TypeHash) -> Option<&'static str> {
        Some(match hash {
            TypeHash::EMPTY => "null",
            BOOL => "bool",
            INT => "int",
            DOUBLE => "double",
            STRING => "string",
            LIST => "list",
            FUNCTION => "function",
            OBJECT => "object",
            TYPE => "type",
            _ => return None,
        })
    }

    /// Whether the hash is one of the numeric kinds.
    #[inline]
    pub fn is_numeric(hash: TypeHash) -> bool {
        hash == INT || hash == DOUBLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_hash_determinism() {
        let hash1 = TypeHash::from_name("Person");
        let hash2 = TypeHash::from_name("Person");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, TypeHash::from_name("Address"));
    }

    #[test]
    fn primitive_constants_match_from_name() {
        assert_eq!(primitives::BOOL, TypeHash::from_name("bool"));
        assert_eq!(primitives::INT, TypeHash::from_name("int"));
        assert_eq!(primitives::DOUBLE, TypeHash::from_name("double"));
        assert_eq!(primitives::STRING, TypeHash::from_name("string"));
        assert_eq!(primitives::LIST, TypeHash::from_name("list"));
        assert_eq!(primitives::FUNCTION, TypeHash::from_name("function"));
        assert_eq!(primitives::OBJECT, TypeHash::from_name("object"));
        assert_eq!(primitives::TYPE, TypeHash::from_name("type"));
    }

    #[test]
    fn sequence_order_matters() {
        let a = [primitives::INT, primitives::STRING];
        let b = [primitives::STRING, primitives::INT];
        assert_ne!(TypeHash::from_sequence(&a), TypeHash::from_sequence(&b));
        assert_eq!(TypeHash::from_sequence(&a), TypeHash::from_sequence(&a));
    }

    #[test]
    fn sequence_supports_many_elements() {
        let many = vec![primitives::INT; 40];
        let fewer = vec![primitives::INT; 39];
        assert_ne!(
            TypeHash::from_sequence(&many),
            TypeHash::from_sequence(&fewer)
        );
    }

    #[test]
    fn rust_type_hash() {
        struct Marker;
        assert_eq!(TypeHash::of::<Marker>(), TypeHash::of::<Marker>());
        assert_ne!(TypeHash::of::<Marker>(), TypeHash::of::<u8>());
    }

    #[test]
    fn empty_hash() {
        assert!(TypeHash::EMPTY.is_empty());
        assert_eq!(TypeHash::default(), TypeHash::EMPTY);
        assert!(!primitives::INT.is_empty());
        assert_eq!(primitives::INT.as_u64(), 0x4f5e5320cd1c92bf);
    }

    #[test]
    fn display_uses_primitive_names() {
        assert_eq!(format!("{}", primitives::STRING), "string");
        assert_eq!(format!("{:?}", primitives::INT), "TypeHash(int)");
        assert_eq!(format!("{}", TypeHash::EMPTY), "null");
        let custom = TypeHash(0x1234);
        assert_eq!(format!("{}", custom), "0x0000000000001234");
    }
}
