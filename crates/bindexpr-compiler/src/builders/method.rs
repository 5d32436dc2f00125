use bindexpr_core::{CompilationError, ExprNode, ExprRef, TypeHash, primitives};

use super::{ExpressionBuilder, build_all, eval_all, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;
use crate::runtime;

/// Builds method calls.
///
/// Host objects dispatch through their own `call_method`; strings, lists,
/// and functions get the built-ins in [`runtime::call_method`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MethodCallBuilder;

impl ExpressionBuilder for MethodCallBuilder {
    fn priority(&self) -> i32 {
        priority::METHOD_CALL
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::MethodCall(call) = &**node else {
            return Ok(None);
        };
        let Some(target) = &call.target else {
            return Ok(None);
        };

        let target = ctx.build(target)?;
        let args = build_all(ctx, &call.args)?;
        let method = call.method.clone();
        let ty = if is_host_type(target.ty()) {
            primitives::OBJECT
        } else {
            match method.as_str() {
                "ToString" | "ToUpper" | "ToLower" | "Trim" | "Substring" => primitives::STRING,
                "Equals" | "Contains" | "StartsWith" | "EndsWith" | "Any" => primitives::BOOL,
                _ => primitives::OBJECT,
            }
        };

        Ok(Some(Fragment::new(ty, move |frame| {
            let target = target.eval(frame)?;
            runtime::call_method(&target, &method, &eval_all(&args, frame)?)
        })))
    }
}

/// Receivers whose methods are dispatched by the host.
fn is_host_type(ty: TypeHash) -> bool {
    ty == primitives::OBJECT || primitives::name_of(ty).is_none()
}
