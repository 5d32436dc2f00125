//! The expression compiler facade and its compilation strategies.
//!
//! [`ExpressionCompiler`] offers an expression to each registered
//! [`CompileStrategy`] in descending priority order. The default strategy,
//! [`CompiledExpressionStrategy`], produces a [`CompiledExpression`] backed by
//! the builder chain.

use std::cmp::Reverse;
use std::sync::Arc;

use bindexpr_core::{
    BindExprError, CompilationError, ExprRef, MetadataContext, ParameterValue, Value,
};
use tracing::debug;

use crate::builders::{ExpressionBuilder, default_builders, sort_by_priority};
use crate::compiled::CompiledExpression;

/// Something that can be invoked with binding member values.
pub trait ExpressionInvoker: Send + Sync {
    /// Invoke with one argument per member slot.
    fn invoke(
        &self,
        args: &[ParameterValue],
        metadata: Option<&MetadataContext>,
    ) -> Result<Value, BindExprError>;

    /// Invoke an expression with exactly one member.
    fn invoke_single(
        &self,
        arg: &ParameterValue,
        metadata: Option<&MetadataContext>,
    ) -> Result<Value, BindExprError> {
        self.invoke(std::slice::from_ref(arg), metadata)
    }
}

impl ExpressionInvoker for CompiledExpression {
    fn invoke(
        &self,
        args: &[ParameterValue],
        metadata: Option<&MetadataContext>,
    ) -> Result<Value, BindExprError> {
        CompiledExpression::invoke(self, args, metadata)
    }
}

/// One way of turning a resolved expression into an invoker.
pub trait CompileStrategy: Send + Sync {
    /// Position among strategies; higher runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Compile `expression`, or return `Ok(None)` to defer to the next
    /// strategy.
    fn try_compile(
        &self,
        expression: &ExprRef,
        metadata: Option<&MetadataContext>,
    ) -> Result<Option<Arc<dyn ExpressionInvoker>>, CompilationError>;
}

/// Compiles into [`CompiledExpression`]s using a builder chain.
pub struct CompiledExpressionStrategy {
    builders: Arc<[Arc<dyn ExpressionBuilder>]>,
}

impl Default for CompiledExpressionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl CompiledExpressionStrategy {
    /// Strategy over the default builder chain.
    pub fn new() -> Self {
        Self {
            builders: default_builders().into(),
        }
    }

    /// Strategy over a custom builder chain.
    pub fn with_builders(builders: Vec<Arc<dyn ExpressionBuilder>>) -> Self {
        let mut strategy = Self::new();
        strategy.set_builders(builders);
        strategy
    }

    /// Replace the builder chain. Builders are sorted by priority.
    ///
    /// Expressions already compiled keep the chain they were compiled with.
    pub fn set_builders(&mut self, mut builders: Vec<Arc<dyn ExpressionBuilder>>) {
        sort_by_priority(&mut builders);
        self.builders = builders.into();
    }

    /// Add a builder to the chain.
    pub fn add_builder(&mut self, builder: Arc<dyn ExpressionBuilder>) {
        let mut builders = self.builders.to_vec();
        builders.push(builder);
        self.set_builders(builders);
    }

    /// The current chain, highest priority first.
    pub fn builders(&self) -> &[Arc<dyn ExpressionBuilder>] {
        &self.builders
    }

    /// Compile directly into a [`CompiledExpression`].
    pub fn compile(
        &self,
        expression: &ExprRef,
        metadata: Option<&MetadataContext>,
    ) -> Result<CompiledExpression, CompilationError> {
        CompiledExpression::new(expression.clone(), Arc::clone(&self.builders), metadata)
    }
}

impl CompileStrategy for CompiledExpressionStrategy {
    fn try_compile(
        &self,
        expression: &ExprRef,
        metadata: Option<&MetadataContext>,
    ) -> Result<Option<Arc<dyn ExpressionInvoker>>, CompilationError> {
        Ok(Some(Arc::new(self.compile(expression, metadata)?)))
    }
}

/// Compiles resolved binding expressions.
pub struct ExpressionCompiler {
    strategies: Vec<Arc<dyn CompileStrategy>>,
}

impl Default for ExpressionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionCompiler {
    /// Compiler with the default strategy.
    pub fn new() -> Self {
        Self {
            strategies: vec![Arc::new(CompiledExpressionStrategy::new())],
        }
    }

    /// Compiler with no strategies.
    pub fn empty() -> Self {
        Self { strategies: Vec::new() }
    }

    /// Register a strategy.
    pub fn add_strategy(&mut self, strategy: Arc<dyn CompileStrategy>) {
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| Reverse(s.priority()));
    }

    /// Registered strategies, highest priority first.
    pub fn strategies(&self) -> &[Arc<dyn CompileStrategy>] {
        &self.strategies
    }

    /// Compile an expression whose binding members all have indices.
    pub fn compile(
        &self,
        expression: &ExprRef,
        metadata: Option<&MetadataContext>,
    ) -> Result<Arc<dyn ExpressionInvoker>, CompilationError> {
        for strategy in &self.strategies {
            if let Some(invoker) = strategy.try_compile(expression, metadata)? {
                return Ok(invoker);
            }
        }
        debug!(expression = %expression, "no compile strategy accepted expression");
        Err(CompilationError::NoStrategy {
            expression: expression.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildContext;
    use crate::fragment::Fragment;
    use bindexpr_core::ExprNode;

    struct Declines;

    impl CompileStrategy for Declines {
        fn priority(&self) -> i32 {
            100
        }

        fn try_compile(
            &self,
            _: &ExprRef,
            _: Option<&MetadataContext>,
        ) -> Result<Option<Arc<dyn ExpressionInvoker>>, CompilationError> {
            Ok(None)
        }
    }

    /// Answers every constant with 42.
    struct FortyTwo;

    impl ExpressionBuilder for FortyTwo {
        fn priority(&self) -> i32 {
            2000
        }

        fn try_build(
            &self,
            _: &mut dyn BuildContext,
            node: &ExprRef,
        ) -> Result<Option<Fragment>, CompilationError> {
            Ok(node.as_constant().map(|_| Fragment::constant(Value::Int(42))))
        }
    }

    #[test]
    fn falls_through_declining_strategies() {
        let mut compiler = ExpressionCompiler::new();
        compiler.add_strategy(Arc::new(Declines));
        assert_eq!(compiler.strategies()[0].priority(), 100);

        let invoker = compiler.compile(&ExprNode::constant(7), None).unwrap();
        assert_eq!(invoker.invoke(&[], None).unwrap(), Value::Int(7));
    }

    #[test]
    fn no_strategy_is_an_error() {
        let mut compiler = ExpressionCompiler::empty();
        compiler.add_strategy(Arc::new(Declines));
        let err = compiler.compile(&ExprNode::constant(7), None).err().unwrap();
        assert_eq!(
            err,
            CompilationError::NoStrategy { expression: "7".to_string() }
        );
    }

    #[test]
    fn custom_builders_take_precedence() {
        let mut strategy = CompiledExpressionStrategy::new();
        strategy.add_builder(Arc::new(FortyTwo));
        assert_eq!(strategy.builders()[0].priority(), 2000);

        let compiled = strategy.compile(&ExprNode::constant(7), None).unwrap();
        assert_eq!(compiled.invoke(&[], None).unwrap(), Value::Int(42));
    }

    #[test]
    fn replacing_builders_can_remove_support() {
        let strategy = CompiledExpressionStrategy::with_builders(vec![Arc::new(FortyTwo)]);
        assert_eq!(strategy.builders().len(), 1);
        let lambda = ExprNode::lambda(["x"], ExprNode::parameter("x"));
        let compiled = strategy.compile(&lambda, None).unwrap();
        let err = compiled.invoke(&[], None).unwrap_err();
        assert!(err.is_compilation());
    }
}
