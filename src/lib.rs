//! Binding expressions for data-binding layers.
//!
//! A binding expression such as `$source.Items[0].Name.ToUpper()` or
//! `Count > 0 ? Title : $context.Fallback` is prepared in three steps:
//!
//! 1. Member chains and `$` macros become binding member placeholders. The
//!    binding layer observes these paths and supplies their values.
//! 2. Each distinct placeholder gets an argument slot.
//! 3. The expression is compiled. Invoking it with the slot values builds,
//!    once per combination of argument types, a specialized evaluator.
//!
//! [`BindingExpressionCompiler`] runs the whole pipeline. The underlying
//! pieces live in [`bindexpr_core`] (node model, values, errors) and
//! [`bindexpr_compiler`] (resolution, builders, the invoker cache).
//!
//! ```
//! use bindexpr::prelude::*;
//!
//! let expr = ExprNode::call(Some(ExprNode::macro_ref("source")), "ToString", vec![]);
//! let prepared = BindingExpressionCompiler::new().prepare(&expr, false, None).unwrap();
//! let text = prepared.invoke(&[ParameterValue::new(7)], None).unwrap();
//! assert_eq!(text, Value::from("7"));
//! ```

mod pipeline;

pub use pipeline::{BindingExpressionCompiler, PreparedExpression};

/// Commonly used types.
pub mod prelude {
    pub use crate::pipeline::{BindingExpressionCompiler, PreparedExpression};
    pub use bindexpr_compiler::{
        BindingMemberCollector, BuildContext, CompileStrategy, CompiledExpression,
        CompiledExpressionStrategy, ExpressionBuilder, ExpressionCompiler, ExpressionInvoker,
        Fragment, MemberExpressionVisitor, MemberVisitorSettings, ResolvedType, ResourceResolver,
        ResourceTable, ShapeKey, TypeResolver, TypeTable,
    };
    pub use bindexpr_core::{
        BinaryOp, BindExprError, BindingMemberNode, CompilationError, ExprNode, ExprRef, FromValue,
        MemberFlags, MemberRoot, MetadataContext, MetadataKey, ParameterValue, ResolveError,
        RuntimeError, ScriptObject, TypeHash, UnaryOp, Value, primitives,
    };
}
