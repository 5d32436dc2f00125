//! Binding member placeholder nodes.
//!
//! A [`BindingMemberNode`] stands in for a resolved member path such as
//! `$source.Address.City`. The binding layer observes the path and supplies
//! its current value as argument `index` when the compiled expression runs.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

use bitflags::bitflags;

use super::ExprKind;
use crate::type_hash::TypeHash;
use crate::value::Value;

bitflags! {
    /// Observation flags carried by a binding member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        /// Observe the member for changes.
        const OBSERVABLE = 1 << 0;
        /// Observe the result of method calls on the member.
        const OBSERVABLE_METHODS = 1 << 1;
        /// A missing member yields null instead of an error.
        const OPTIONAL = 1 << 2;
        /// The path never changes shape at runtime.
        const STABLE_PATH = 1 << 3;
        /// The member was resolved relative to the binding target.
        const TARGET = 1 << 4;
    }
}

/// The root object a member path is resolved against.
#[derive(Debug, Clone)]
pub enum MemberRoot {
    /// The binding target (`$target`, `$self`, `$this`, `$context`).
    Target,
    /// The binding source (`$source`, or plain paths in source expressions).
    Source,
    /// Static members of a resolved type.
    Static {
        /// The macro name the type was resolved from.
        name: String,
        /// Identity of the resolved type.
        ty: TypeHash,
        /// Object exposing the type's static members.
        statics: Value,
    },
    /// A named resource.
    Resource {
        /// Resource name.
        name: String,
        /// The resource object.
        value: Value,
    },
}

/// Hashable identity of a [`MemberRoot`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberRootKey {
    /// Binding target.
    Target,
    /// Binding source.
    Source,
    /// A static type.
    Static(TypeHash),
    /// A named resource.
    Resource(String),
}

impl MemberRoot {
    /// The root's identity for deduplication.
    pub fn key(&self) -> MemberRootKey {
        match self {
            MemberRoot::Target => MemberRootKey::Target,
            MemberRoot::Source => MemberRootKey::Source,
            MemberRoot::Static { ty, .. } => MemberRootKey::Static(*ty),
            MemberRoot::Resource { name, .. } => MemberRootKey::Resource(name.clone()),
        }
    }

    /// Macro prefix used when displaying a path on this root.
    pub fn prefix(&self) -> String {
        match self {
            MemberRoot::Target => "$target".to_string(),
            MemberRoot::Source => "$source".to_string(),
            MemberRoot::Static { name, .. } | MemberRoot::Resource { name, .. } => {
                format!("${}", name)
            }
        }
    }
}

/// Deduplication key for binding members within one rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingMemberKey {
    /// Member path.
    pub path: String,
    /// Observed method name, if any.
    pub method_name: Option<String>,
    /// Observation flags.
    pub flags: MemberFlags,
    /// Root identity.
    pub root: MemberRootKey,
    /// Kind of the node the member was created from.
    pub kind: ExprKind,
}

/// Placeholder for a resolved, observable member path.
pub struct BindingMemberNode {
    path: String,
    root: MemberRoot,
    flags: MemberFlags,
    kind: ExprKind,
    method_name: Option<String>,
    index: AtomicI32,
}

impl BindingMemberNode {
    /// Index value of a member that has not been assigned a slot.
    pub const UNASSIGNED: i32 = -1;

    /// Create an unassigned member.
    pub fn new(
        path: impl Into<String>,
        root: MemberRoot,
        flags: MemberFlags,
        kind: ExprKind,
    ) -> Self {
        Self {
            path: path.into(),
            root,
            flags,
            kind,
            method_name: None,
            index: AtomicI32::new(Self::UNASSIGNED),
        }
    }

    /// Record the observed method name.
    pub fn with_method_name(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    /// Assign an index at construction.
    pub fn with_index(self, index: i32) -> Self {
        self.set_index(index);
        self
    }

    /// The member path (empty for the root object itself).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The root the path is resolved against.
    pub fn root(&self) -> &MemberRoot {
        &self.root
    }

    /// Observation flags.
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Kind of the node this member replaced.
    pub fn kind(&self) -> ExprKind {
        self.kind
    }

    /// Observed method name, if any.
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// Argument slot index, or [`UNASSIGNED`](Self::UNASSIGNED).
    pub fn index(&self) -> i32 {
        self.index.load(Ordering::Acquire)
    }

    /// Assign the argument slot index.
    pub fn set_index(&self, index: i32) {
        self.index.store(index, Ordering::Release);
    }

    /// Whether a non-negative index has been assigned.
    pub fn is_assigned(&self) -> bool {
        self.index() >= 0
    }

    /// Deduplication key.
    pub fn key(&self) -> BindingMemberKey {
        BindingMemberKey {
            path: self.path.clone(),
            method_name: self.method_name.clone(),
            flags: self.flags,
            root: self.root.key(),
            kind: self.kind,
        }
    }
}

impl PartialEq for BindingMemberNode {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index() && self.path == other.path
    }
}

impl fmt::Debug for BindingMemberNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingMemberNode")
            .field("index", &self.index())
            .field("path", &self.path)
            .field("root", &self.root.key())
            .field("flags", &self.flags)
            .field("method_name", &self.method_name)
            .finish()
    }
}

impl fmt::Display for BindingMemberNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root.prefix())?;
        if !self.path.is_empty() {
            if !self.path.starts_with('[') {
                f.write_str(".")?;
            }
            f.write_str(&self.path)?;
        }
        Ok(())
    }
}
