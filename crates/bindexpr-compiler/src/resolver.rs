//! External collaborators consulted while resolving macros.
//!
//! - [`TypeResolver`]: `$Name` as a type reference (static members)
//! - [`ResourceResolver`]: `$Name` as a named resource
//!
//! [`TypeTable`] and [`ResourceTable`] are map-backed implementations for
//! hosts that register everything up front.

use std::sync::Arc;

use bindexpr_core::{ScriptObject, TypeHash, Value};
use rustc_hash::FxHashMap;

/// A type resolved from a macro name.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    /// Name the type was registered under.
    pub name: String,
    /// Type identity.
    pub ty: TypeHash,
    /// Object exposing the type's static members.
    pub statics: Value,
}

impl ResolvedType {
    /// Describe a type whose static members are served by `statics`.
    pub fn new(name: impl Into<String>, statics: Arc<dyn ScriptObject>) -> Self {
        let name = name.into();
        Self {
            ty: statics.type_hash(),
            name,
            statics: Value::Object(statics),
        }
    }
}

/// Resolves type names used as macros.
pub trait TypeResolver: Send + Sync {
    /// Look up a type by name.
    fn resolve_type(&self, name: &str) -> Option<ResolvedType>;
}

/// Resolves resource names used as macros.
pub trait ResourceResolver: Send + Sync {
    /// Look up a resource by name.
    fn resolve_resource(&self, name: &str) -> Option<Value>;
}

/// Map-backed [`TypeResolver`].
#[derive(Debug, Default, Clone)]
pub struct TypeTable {
    types: FxHashMap<String, ResolvedType>,
}

impl TypeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its name.
    pub fn register(&mut self, ty: ResolvedType) {
        self.types.insert(ty.name.clone(), ty);
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeResolver for TypeTable {
    fn resolve_type(&self, name: &str) -> Option<ResolvedType> {
        self.types.get(name).cloned()
    }
}

/// Map-backed [`ResourceResolver`].
#[derive(Debug, Default, Clone)]
pub struct ResourceTable {
    resources: FxHashMap<String, Value>,
}

impl ResourceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a resource.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.resources.insert(name.into(), value.into());
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceResolver for ResourceTable {
    fn resolve_resource(&self, name: &str) -> Option<Value> {
        self.resources.get(name).cloned()
    }
}
