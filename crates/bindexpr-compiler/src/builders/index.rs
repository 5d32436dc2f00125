use bindexpr_core::{CompilationError, ExprNode, ExprRef, primitives};

use super::{ExpressionBuilder, build_all, eval_all, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;
use crate::runtime;

/// Builds indexers on values only known at runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexBuilder;

impl ExpressionBuilder for IndexBuilder {
    fn priority(&self) -> i32 {
        priority::INDEX
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::Index(index) = &**node else {
            return Ok(None);
        };
        let Some(target) = &index.target else {
            return Ok(None);
        };

        let target = ctx.build(target)?;
        let args = build_all(ctx, &index.args)?;
        let ty = if target.has_type(primitives::STRING) {
            primitives::STRING
        } else {
            primitives::OBJECT
        };
        Ok(Some(Fragment::new(ty, move |frame| {
            let target = target.eval(frame)?;
            runtime::get_index(&target, &eval_all(&args, frame)?)
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::eval;
    use bindexpr_core::{RuntimeError, Value};

    #[test]
    fn indexes_lists_and_strings() {
        let list = ExprNode::constant(Value::list([Value::from(10), Value::from(20)]));
        let expr = ExprNode::index(Some(list.clone()), vec![ExprNode::constant(1)]);
        assert_eq!(eval(&expr).unwrap(), Value::Int(20));

        let out_of_range = ExprNode::index(Some(list), vec![ExprNode::constant(5)]);
        assert!(matches!(eval(&out_of_range), Err(RuntimeError::IndexOutOfRange { .. })));

        let chars = ExprNode::index(Some(ExprNode::constant("hey")), vec![ExprNode::constant(2)]);
        assert_eq!(eval(&chars).unwrap(), Value::from("y"));
    }
}
