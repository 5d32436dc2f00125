//! Binding expression compiler.
//!
//! Turns parsed binding expressions into invokers specialized per argument
//! shape.
//!
//! ## Pipeline
//!
//! 1. **Member resolution**: [`MemberExpressionVisitor`] rewrites member
//!    chains and macros into binding member placeholders.
//! 2. **Indexing**: [`BindingMemberCollector`] gives each distinct placeholder
//!    an argument slot.
//! 3. **Compilation**: [`ExpressionCompiler`] wraps the tree in a
//!    [`CompiledExpression`], which builds and caches one invoker per
//!    [`ShapeKey`] on demand.
//!
//! ## Modules
//!
//! - [`member_visitor`]: member resolution and static folding
//! - [`resolver`]: type and resource lookup for macros
//! - [`collector`]: slot assignment
//! - [`compiler`]: the compiler facade and strategies
//! - [`compiled`]: compiled expressions and the invoker cache
//! - [`builders`]: pluggable node translators
//! - [`context`]: per-build state offered to builders
//! - [`fragment`]: compiled fragments and evaluation frames
//! - [`shape`]: argument shape keys
//! - [`runtime`]: operator, member, and method semantics

pub mod builders;
pub mod collector;
pub mod compiled;
pub mod compiler;
pub mod context;
pub mod fragment;
pub mod member_visitor;
pub mod resolver;
pub mod runtime;
pub mod shape;

pub use builders::{ExpressionBuilder, default_builders};
pub use collector::BindingMemberCollector;
pub use compiled::CompiledExpression;
pub use compiler::{
    CompileStrategy, CompiledExpressionStrategy, ExpressionCompiler, ExpressionInvoker,
};
pub use context::{BuildContext, ExpressionBuildContext};
pub use fragment::{Fragment, Frame, ShapeInvoker};
pub use member_visitor::{MemberExpressionVisitor, MemberVisitorSettings};
pub use resolver::{ResolvedType, ResourceResolver, ResourceTable, TypeResolver, TypeTable};
pub use shape::ShapeKey;
