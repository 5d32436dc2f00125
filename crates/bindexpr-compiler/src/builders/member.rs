use bindexpr_core::{CompilationError, ExprNode, ExprRef, primitives};

use super::{ExpressionBuilder, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;
use crate::runtime;

/// Builds member access on values only known at runtime, such as
/// `Items.First().Name` or `x => x.Name`.
///
/// A bare identifier compiles only when it names a lambda parameter in
/// scope. Anything else should have become a binding member.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemberAccessBuilder;

impl ExpressionBuilder for MemberAccessBuilder {
    fn priority(&self) -> i32 {
        priority::MEMBER
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::Member(member) = &**node else {
            return Ok(None);
        };

        let Some(target) = &member.target else {
            return Ok(ctx.parameter_index(&member.name).map(|local| {
                Fragment::new(primitives::OBJECT, move |frame| Ok(frame.local(local)))
            }));
        };

        let target = ctx.build(target)?;
        let name = member.name.clone();
        let ty = if (target.has_type(primitives::STRING) || target.has_type(primitives::LIST))
            && matches!(name.as_str(), "Length" | "Count")
        {
            primitives::INT
        } else {
            primitives::OBJECT
        };
        Ok(Some(Fragment::new(ty, move |frame| {
            runtime::get_member(&target.eval(frame)?, &name)
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{compile, eval};
    use bindexpr_core::{RuntimeError, Value};

    #[test]
    fn reads_builtin_members() {
        let expr = ExprNode::member(ExprNode::constant("abc"), "Length");
        assert_eq!(eval(&expr).unwrap(), Value::Int(3));
        assert_eq!(compile(&expr).unwrap().ty(), primitives::INT);
    }

    #[test]
    fn null_targets_fail_at_runtime() {
        let expr = ExprNode::member(ExprNode::constant(Value::Null), "Name");
        assert!(matches!(eval(&expr), Err(RuntimeError::NullReference { .. })));
    }

    #[test]
    fn bare_identifiers_need_a_parameter() {
        assert!(matches!(
            compile(&ExprNode::ident("Name")),
            Err(CompilationError::CannotCompile { .. })
        ));
        let lambda = ExprNode::lambda(["x"], ExprNode::ident("x"));
        let Value::Function(f) = eval(&lambda).unwrap() else {
            panic!("expected function");
        };
        assert_eq!(f.call(&[Value::Int(9)]).unwrap(), Value::Int(9));
    }
}
