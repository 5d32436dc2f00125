//! End-to-end preparation of binding expressions.

use std::fmt;
use std::sync::Arc;

use bindexpr_compiler::{
    BindingMemberCollector, ExpressionCompiler, ExpressionInvoker, MemberExpressionVisitor,
};
use bindexpr_core::{
    BindExprError, BindingMemberNode, ExprRef, FromValue, MetadataContext, ParameterValue,
    RuntimeError, Value,
};
use tracing::debug;

/// Resolves, indexes, and compiles binding expressions.
///
/// # Example
///
/// ```
/// use bindexpr::prelude::*;
///
/// // Count + 1, resolved against the binding source
/// let expr = ExprNode::binary(BinaryOp::Add, ExprNode::ident("Count"), ExprNode::constant(1));
/// let prepared = BindingExpressionCompiler::new().prepare(&expr, false, None).unwrap();
///
/// assert_eq!(prepared.members().len(), 1);
/// let result = prepared.invoke(&[ParameterValue::new(41)], None).unwrap();
/// assert_eq!(result, Value::Int(42));
/// ```
#[derive(Default)]
pub struct BindingExpressionCompiler {
    visitor: MemberExpressionVisitor,
    compiler: ExpressionCompiler,
}

impl BindingExpressionCompiler {
    /// Pipeline with default member resolution and compilation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a configured member visitor.
    pub fn with_visitor(mut self, visitor: MemberExpressionVisitor) -> Self {
        self.visitor = visitor;
        self
    }

    /// Use a configured compiler.
    pub fn with_compiler(mut self, compiler: ExpressionCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// The member visitor.
    pub fn visitor_mut(&mut self) -> &mut MemberExpressionVisitor {
        &mut self.visitor
    }

    /// The compiler.
    pub fn compiler_mut(&mut self) -> &mut ExpressionCompiler {
        &mut self.compiler
    }

    /// Resolve members, assign slots, and compile `expression`.
    ///
    /// `is_target` selects the default root of plain member paths.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn prepare(
        &mut self,
        expression: &ExprRef,
        is_target: bool,
        metadata: Option<&MetadataContext>,
    ) -> Result<PreparedExpression, BindExprError> {
        let resolved = self.visitor.resolve(expression, is_target, metadata)?;

        let mut collector = BindingMemberCollector::new();
        collector.collect(&resolved, metadata);
        let members = collector.into_members();

        let invoker = self.compiler.compile(&resolved, metadata)?;
        debug!(expression = %resolved, members = members.len(), "binding expression prepared");
        Ok(PreparedExpression {
            expression: resolved,
            members,
            invoker,
        })
    }
}

impl fmt::Debug for BindingExpressionCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingExpressionCompiler")
            .field("settings", self.visitor.settings())
            .field("strategies", &self.compiler.strategies().len())
            .finish()
    }
}

/// A prepared binding expression and the members it reads.
#[derive(Clone)]
pub struct PreparedExpression {
    expression: ExprRef,
    members: Vec<ExprRef>,
    invoker: Arc<dyn ExpressionInvoker>,
}

impl PreparedExpression {
    /// The resolved expression.
    pub fn expression(&self) -> &ExprRef {
        &self.expression
    }

    /// Binding members in slot order.
    pub fn members(&self) -> &[ExprRef] {
        &self.members
    }

    /// The binding member for slot `index`.
    pub fn member(&self, index: usize) -> Option<&BindingMemberNode> {
        self.members.get(index).and_then(|m| m.as_binding_member())
    }

    /// Invoke with one argument per member, in slot order.
    pub fn invoke(
        &self,
        args: &[ParameterValue],
        metadata: Option<&MetadataContext>,
    ) -> Result<Value, BindExprError> {
        self.invoker.invoke(args, metadata)
    }

    /// Invoke and extract the result as a Rust value.
    pub fn invoke_as<T: FromValue>(
        &self,
        args: &[ParameterValue],
        metadata: Option<&MetadataContext>,
    ) -> Result<T, BindExprError> {
        let value = self.invoke(args, metadata)?;
        Ok(T::from_value(&value)?)
    }

    /// Invoke, asking `resolve` for the current value of each member.
    pub fn evaluate<F>(
        &self,
        mut resolve: F,
        metadata: Option<&MetadataContext>,
    ) -> Result<Value, BindExprError>
    where
        F: FnMut(&BindingMemberNode) -> Result<ParameterValue, RuntimeError>,
    {
        let args = self
            .members
            .iter()
            .filter_map(|m| m.as_binding_member())
            .map(&mut resolve)
            .collect::<Result<Vec<_>, _>>()?;
        self.invoke(&args, metadata)
    }
}

impl fmt::Debug for PreparedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedExpression")
            .field("expression", &self.expression.to_string())
            .field("members", &self.members.iter().map(ToString::to_string).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindexpr_core::{BinaryOp, ExprNode, MemberRoot};

    #[test]
    fn prepares_target_expressions() {
        let expr = ExprNode::member(ExprNode::ident("Size"), "Width");
        let prepared = BindingExpressionCompiler::new().prepare(&expr, true, None).unwrap();
        let member = prepared.member(0).unwrap();
        assert_eq!(member.path(), "Size.Width");
        assert!(matches!(member.root(), MemberRoot::Target));
    }

    #[test]
    fn evaluate_supplies_members_in_order() {
        let expr = ExprNode::binary(BinaryOp::Sub, ExprNode::ident("A"), ExprNode::ident("B"));
        let prepared = BindingExpressionCompiler::new().prepare(&expr, false, None).unwrap();
        let result = prepared
            .evaluate(
                |member| {
                    Ok(ParameterValue::new(match member.path() {
                        "A" => 10,
                        _ => 4,
                    }))
                },
                None,
            )
            .unwrap();
        assert_eq!(result, Value::Int(6));
    }

    #[test]
    fn typed_results() {
        let count = ExprNode::ident("Count");
        let expr = ExprNode::binary(BinaryOp::Greater, count, ExprNode::constant(0));
        let prepared = BindingExpressionCompiler::new().prepare(&expr, false, None).unwrap();
        assert!(prepared.invoke_as::<bool>(&[ParameterValue::new(3)], None).unwrap());
        let err = prepared.invoke_as::<String>(&[ParameterValue::new(3)], None).unwrap_err();
        assert!(err.is_runtime());
    }

    #[test]
    fn lambda_parameters_are_not_members() {
        // Items.Select(x => x.Length)
        let select = ExprNode::call(
            Some(ExprNode::ident("Items")),
            "Select",
            vec![ExprNode::lambda(["x"], ExprNode::member(ExprNode::ident("x"), "Length"))],
        );
        let prepared = BindingExpressionCompiler::new().prepare(&select, false, None).unwrap();
        assert_eq!(prepared.members().len(), 1);
        assert_eq!(prepared.member(0).unwrap().path(), "Items");

        let items = Value::list([Value::from("ab"), Value::from("cde")]);
        let result = prepared.invoke(&[ParameterValue::new(items)], None).unwrap();
        assert_eq!(result, Value::list([Value::from(2), Value::from(3)]));
    }

    #[test]
    fn resolver_errors_stop_evaluation() {
        let prepared = BindingExpressionCompiler::new()
            .prepare(&ExprNode::ident("Missing"), false, None)
            .unwrap();
        let err = prepared
            .evaluate(|member| Err(RuntimeError::host(format!("no value for {member}"))), None)
            .unwrap_err();
        assert!(err.is_runtime());
    }
}
