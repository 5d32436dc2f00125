use bindexpr_core::{CompilationError, ExprNode, ExprRef, primitives};

use super::{ExpressionBuilder, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;

/// Builds references to lambda parameters.
///
/// Parameters outside any enclosing lambda are left to the rest of the
/// chain, which reports them as untranslatable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterBuilder;

impl ExpressionBuilder for ParameterBuilder {
    fn priority(&self) -> i32 {
        priority::PARAMETER
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::Parameter(parameter) = &**node else {
            return Ok(None);
        };
        Ok(ctx
            .parameter_index(&parameter.name)
            .map(|local| Fragment::new(primitives::OBJECT, move |frame| Ok(frame.local(local)))))
    }
}
