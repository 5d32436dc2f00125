use bindexpr_core::{CompilationError, ExprNode, ExprRef};

use super::{ExpressionBuilder, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;

/// Builds constant nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantBuilder;

impl ExpressionBuilder for ConstantBuilder {
    fn priority(&self) -> i32 {
        priority::CONSTANT
    }

    fn try_build(
        &self,
        _: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        Ok(match &**node {
            ExprNode::Constant(c) => Some(Fragment::constant(c.value.clone())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::eval;
    use bindexpr_core::Value;

    #[test]
    fn constants_evaluate_to_themselves() {
        assert_eq!(eval(&ExprNode::constant("hi")).unwrap(), Value::from("hi"));
        assert_eq!(eval(&ExprNode::constant(Value::Null)).unwrap(), Value::Null);
    }
}
