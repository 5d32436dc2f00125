//! Expression builders: pluggable translators from nodes to fragments.
//!
//! A build offers each node to the registered builders in descending
//! priority order. The first builder that returns a fragment wins; builders
//! return `Ok(None)` for nodes they do not handle.
//!
//! | builder | priority | nodes |
//! |---------|----------|-------|
//! | [`ConstantBuilder`] | 1000 | constants |
//! | [`ParameterBuilder`] | 990 | lambda parameters |
//! | [`LambdaBuilder`] | 980 | lambdas |
//! | [`ConditionalBuilder`] | 900 | `c ? a : b` |
//! | [`UnaryBuilder`] | 890 | `-x`, `!x`, `~x` |
//! | [`BinaryBuilder`] | 880 | binary operators |
//! | [`MemberAccessBuilder`] | 870 | member access on runtime values |
//! | [`IndexBuilder`] | 860 | indexers on runtime values |
//! | [`MethodCallBuilder`] | 850 | method calls |
//!
//! Binding member placeholders have no builder: the compiled expression
//! registers a fragment for each of them in the context's fallback table.

mod binary;
mod conditional;
mod constant;
mod index;
mod lambda;
mod member;
mod method;
mod parameter;
mod unary;

pub use binary::BinaryBuilder;
pub use conditional::ConditionalBuilder;
pub use constant::ConstantBuilder;
pub use index::IndexBuilder;
pub use lambda::LambdaBuilder;
pub use member::MemberAccessBuilder;
pub use method::MethodCallBuilder;
pub use parameter::ParameterBuilder;
pub use unary::UnaryBuilder;

use std::cmp::Reverse;
use std::sync::Arc;

use bindexpr_core::{CompilationError, ExprRef, RuntimeError, Value};

use crate::context::BuildContext;
use crate::fragment::{Fragment, Frame};

/// Default builder priorities.
pub mod priority {
    /// [`ConstantBuilder`](super::ConstantBuilder)
    pub const CONSTANT: i32 = 1000;
    /// [`ParameterBuilder`](super::ParameterBuilder)
    pub const PARAMETER: i32 = 990;
    /// [`LambdaBuilder`](super::LambdaBuilder)
    pub const LAMBDA: i32 = 980;
    /// [`ConditionalBuilder`](super::ConditionalBuilder)
    pub const CONDITIONAL: i32 = 900;
    /// [`UnaryBuilder`](super::UnaryBuilder)
    pub const UNARY: i32 = 890;
    /// [`BinaryBuilder`](super::BinaryBuilder)
    pub const BINARY: i32 = 880;
    /// [`MemberAccessBuilder`](super::MemberAccessBuilder)
    pub const MEMBER: i32 = 870;
    /// [`IndexBuilder`](super::IndexBuilder)
    pub const INDEX: i32 = 860;
    /// [`MethodCallBuilder`](super::MethodCallBuilder)
    pub const METHOD_CALL: i32 = 850;
}

/// Translates expression nodes into fragments.
pub trait ExpressionBuilder: Send + Sync {
    /// Position in the builder chain; higher runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Translate `node`, or return `Ok(None)` to let the next builder try.
    ///
    /// Children are translated with [`BuildContext::build`].
    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError>;
}

/// The standard builder chain, sorted by priority.
pub fn default_builders() -> Vec<Arc<dyn ExpressionBuilder>> {
    let mut builders: Vec<Arc<dyn ExpressionBuilder>> = vec![
        Arc::new(ConstantBuilder),
        Arc::new(ParameterBuilder),
        Arc::new(LambdaBuilder),
        Arc::new(ConditionalBuilder),
        Arc::new(UnaryBuilder),
        Arc::new(BinaryBuilder),
        Arc::new(MemberAccessBuilder),
        Arc::new(IndexBuilder),
        Arc::new(MethodCallBuilder),
    ];
    sort_by_priority(&mut builders);
    builders
}

/// Sort builders by descending priority, keeping registration order on ties.
pub fn sort_by_priority(builders: &mut [Arc<dyn ExpressionBuilder>]) {
    builders.sort_by_key(|builder| Reverse(builder.priority()));
}

/// Build every node in `nodes`.
pub(crate) fn build_all(
    ctx: &mut dyn BuildContext,
    nodes: &[ExprRef],
) -> Result<Vec<Fragment>, CompilationError> {
    nodes.iter().map(|node| ctx.build(node)).collect()
}

/// Evaluate every fragment against one frame.
pub(crate) fn eval_all(
    fragments: &[Fragment],
    frame: &Frame<'_>,
) -> Result<Vec<Value>, RuntimeError> {
    fragments.iter().map(|fragment| fragment.eval(frame)).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Helpers for builder tests.

    use bindexpr_core::{CompilationError, ExprRef, MetadataContext, RuntimeError, Value};

    use super::default_builders;
    use crate::context::{BuildContext, ExpressionBuildContext};
    use crate::fragment::{Fragment, Frame};

    /// Build `node` with the default chain and evaluate it with no arguments.
    pub fn eval(node: &ExprRef) -> Result<Value, RuntimeError> {
        let builders = default_builders();
        let mut ctx = ExpressionBuildContext::new(&builders, None);
        let fragment = ctx.build(node).expect("node should compile");
        fragment.eval(&Frame::new(&[], None))
    }

    /// Build `node` with the default chain.
    pub fn compile(node: &ExprRef) -> Result<Fragment, CompilationError> {
        let builders = default_builders();
        let mut ctx = ExpressionBuildContext::new(&builders, Some(&MetadataContext::new()));
        ctx.build(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chain_is_sorted() {
        let priorities: Vec<i32> = default_builders().iter().map(|b| b.priority()).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by_key(|p| Reverse(*p));
        assert_eq!(priorities, sorted);
        assert_eq!(priorities.first(), Some(&priority::CONSTANT));
        assert_eq!(priorities.last(), Some(&priority::METHOD_CALL));
    }
}
