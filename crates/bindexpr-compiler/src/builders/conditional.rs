use bindexpr_core::{CompilationError, ExprNode, ExprRef, primitives};

use super::{ExpressionBuilder, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;
use crate::runtime;

/// Builds `condition ? if_true : if_false`.
///
/// A constant condition selects its branch at build time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConditionalBuilder;

impl ExpressionBuilder for ConditionalBuilder {
    fn priority(&self) -> i32 {
        priority::CONDITIONAL
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::Condition(cond) = &**node else {
            return Ok(None);
        };

        let condition = ctx.build(&cond.condition)?;
        if !condition.has_type(primitives::BOOL) && !condition.has_type(primitives::OBJECT) {
            return Err(CompilationError::TypeMismatch {
                expression: cond.condition.to_string(),
                message: format!("condition must be bool, found {}", condition.ty()),
            });
        }
        let if_true = ctx.build(&cond.if_true)?;
        let if_false = ctx.build(&cond.if_false)?;

        if let Some(value) = condition.as_constant().and_then(|c| c.as_bool()) {
            return Ok(Some(if value { if_true } else { if_false }));
        }

        let ty = if if_true.ty() == if_false.ty() {
            if_true.ty()
        } else {
            primitives::OBJECT
        };
        Ok(Some(Fragment::new(ty, move |frame| {
            if runtime::expect_bool(&condition.eval(frame)?)? {
                if_true.eval(frame)
            } else {
                if_false.eval(frame)
            }
        })))
    }
}
