use bindexpr_core::{CompilationError, ExprNode, ExprRef, TypeHash, UnaryOp, primitives};

use super::{ExpressionBuilder, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;
use crate::runtime;

/// Builds `-x`, `!x` and `~x`.
///
/// Macro operators (`$`, `$$`) are resolved before compilation and are not
/// accepted here.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnaryBuilder;

fn result_type(op: UnaryOp, operand: TypeHash) -> Option<TypeHash> {
    use primitives::*;
    match op {
        _ if operand == OBJECT => Some(if op == UnaryOp::Not { BOOL } else { OBJECT }),
        UnaryOp::Minus if operand == INT || operand == DOUBLE => Some(operand),
        UnaryOp::Not if operand == BOOL => Some(BOOL),
        UnaryOp::BitwiseNot if operand == INT => Some(INT),
        _ => None,
    }
}

impl ExpressionBuilder for UnaryBuilder {
    fn priority(&self) -> i32 {
        priority::UNARY
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::Unary(unary) = &**node else {
            return Ok(None);
        };
        if unary.op.is_macro() {
            return Ok(None);
        }

        let op = unary.op;
        let operand = ctx.build(&unary.operand)?;
        let Some(ty) = result_type(op, operand.ty()) else {
            return Err(CompilationError::TypeMismatch {
                expression: node.to_string(),
                message: format!("operator '{}' is not defined for {}", op, operand.ty()),
            });
        };

        if let Some(value) = operand.as_constant()
            && let Ok(folded) = runtime::unary(op, value)
        {
            return Ok(Some(Fragment::constant(folded)));
        }
        Ok(Some(Fragment::new(ty, move |frame| runtime::unary(op, &operand.eval(frame)?))))
    }
}
