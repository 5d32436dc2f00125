use std::sync::Arc;

use bindexpr_core::{CompilationError, ExprNode, ExprRef, Function, Value, primitives};

use super::{ExpressionBuilder, priority};
use crate::context::BuildContext;
use crate::fragment::{Fragment, Frame};

/// Builds lambdas into [`Function`] values.
///
/// The function captures the invocation's argument slots, metadata, and the
/// locals of enclosing lambdas when it is created. Its own arguments are
/// appended to those locals on each call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LambdaBuilder;

impl ExpressionBuilder for LambdaBuilder {
    fn priority(&self) -> i32 {
        priority::LAMBDA
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::Lambda(lambda) = &**node else {
            return Ok(None);
        };

        ctx.push_parameters(&lambda.parameters);
        let body = ctx.build(&lambda.body);
        ctx.pop_parameters(lambda.parameters.len());
        let body = body?;

        let arity = lambda.parameters.len();
        Ok(Some(Fragment::new(primitives::FUNCTION, move |frame| {
            let slots: Arc<[Value]> = frame.slots().into();
            let metadata = frame.metadata().cloned();
            let captured = frame.locals().to_vec();
            let body = body.clone();
            Ok(Value::Function(Function::new(arity, move |args| {
                let mut locals = Vec::with_capacity(captured.len() + args.len());
                locals.extend_from_slice(&captured);
                locals.extend_from_slice(args);
                let frame = Frame::new(&slots, metadata.as_ref()).with_locals(&locals);
                body.eval(&frame)
            })))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{compile, eval};
    use bindexpr_core::{BinaryOp, RuntimeError};

    #[test]
    fn lambdas_produce_callable_functions() {
        let add = ExprNode::lambda(
            ["a", "b"],
            ExprNode::binary(BinaryOp::Add, ExprNode::parameter("a"), ExprNode::parameter("b")),
        );
        let Value::Function(f) = eval(&add).unwrap() else {
            panic!("expected function");
        };
        assert_eq!(f.arity(), 2);
        assert_eq!(
            f.call(&[Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Int(5)
        );
        assert!(matches!(f.call(&[Value::Int(1)]), Err(RuntimeError::ArgumentCount { .. })));
    }

    #[test]
    fn nested_lambdas_see_outer_parameters() {
        // x => (y => x * y)
        let inner = ExprNode::lambda(
            ["y"],
            ExprNode::binary(BinaryOp::Mul, ExprNode::parameter("x"), ExprNode::parameter("y")),
        );
        let outer = ExprNode::lambda(["x"], inner);
        let Value::Function(f) = eval(&outer).unwrap() else {
            panic!("expected function");
        };
        let Value::Function(g) = f.call(&[Value::Int(3)]).unwrap() else {
            panic!("expected function")
        };
        assert_eq!(g.call(&[Value::Int(4)]).unwrap(), Value::Int(12));
    }

    #[test]
    fn parameters_outside_a_lambda_do_not_compile() {
        let err = compile(&ExprNode::parameter("x")).unwrap_err();
        assert!(matches!(err, CompilationError::CannotCompile { .. }));
    }
}
