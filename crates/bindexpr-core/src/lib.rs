//! Core types for binding expressions.
//!
//! This crate holds everything the compiler and its callers share:
//!
//! - [`expr`]: the immutable expression node model, including binding member placeholders
//! - [`visitor`]: the pre-/post-order rewriting protocol
//! - [`value`]: runtime values and the [`ScriptObject`] host protocol
//! - [`convert`]: value coercion and Rust extraction
//! - [`metadata`]: typed key/value metadata
//! - [`type_hash`]: deterministic type identity
//! - [`error`]: error types for every phase

pub mod convert;
pub mod error;
pub mod expr;
pub mod metadata;
pub mod type_hash;
pub mod value;
pub mod visitor;

pub use convert::FromValue;
pub use error::{BindExprError, CompilationError, ResolveError, RuntimeError};
pub use expr::{
    BinaryOp, BindingMemberKey, BindingMemberNode, ExprKind, ExprNode, ExprRef, MemberFlags,
    MemberRoot, MemberRootKey, UnaryOp,
};
pub use metadata::{MetadataContext, MetadataKey};
pub use type_hash::{TypeHash, primitives};
pub use value::{Function, ParameterValue, ScriptObject, Value};
pub use visitor::{ExpressionVisitor, TraversalOrder};
