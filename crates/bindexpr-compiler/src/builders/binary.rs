use bindexpr_core::{BinaryOp, CompilationError, ExprNode, ExprRef, TypeHash, Value, primitives};

use super::{ExpressionBuilder, priority};
use crate::context::BuildContext;
use crate::fragment::Fragment;
use crate::runtime;

/// Builds binary operators.
///
/// When both operand types are known from the argument shape, the fragment
/// is specialized: integer and floating point arithmetic and string
/// concatenation skip dynamic dispatch. Operands typed `object` fall back to
/// [`runtime::binary`]. `&&`, `||` and `??` evaluate their right operand
/// only when needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryBuilder;

impl ExpressionBuilder for BinaryBuilder {
    fn priority(&self) -> i32 {
        priority::BINARY
    }

    fn try_build(
        &self,
        ctx: &mut dyn BuildContext,
        node: &ExprRef,
    ) -> Result<Option<Fragment>, CompilationError> {
        let ExprNode::Binary(binary) = &**node else {
            return Ok(None);
        };

        let op = binary.op;
        let left = ctx.build(&binary.left)?;
        let right = ctx.build(&binary.right)?;

        if let (Some(l), Some(r)) = (left.as_constant(), right.as_constant())
            && let Ok(folded) = runtime::binary(op, l, r)
        {
            return Ok(Some(Fragment::constant(folded)));
        }

        let fragment = match op {
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                for operand in [&left, &right] {
                    expect_type(node, operand, primitives::BOOL)?;
                }
                let stop_on = op == BinaryOp::LogicalOr;
                Fragment::new(primitives::BOOL, move |frame| {
                    let l = runtime::expect_bool(&left.eval(frame)?)?;
                    if l == stop_on {
                        return Ok(Value::Bool(l));
                    }
                    runtime::expect_bool(&right.eval(frame)?).map(Value::Bool)
                })
            }
            BinaryOp::NullCoalescing => {
                let ty = if left.ty() == right.ty() {
                    left.ty()
                } else {
                    primitives::OBJECT
                };
                Fragment::new(ty, move |frame| {
                    let l = left.eval(frame)?;
                    if l.is_null() { right.eval(frame) } else { Ok(l) }
                })
            }
            _ if op.is_comparison() => Fragment::new(primitives::BOOL, move |frame| {
                runtime::compare(op, &left.eval(frame)?, &right.eval(frame)?).map(Value::Bool)
            }),
            _ => specialize(node, op, left, right)?,
        };
        Ok(Some(fragment))
    }
}

fn expect_type(node: &ExprRef, operand: &Fragment, ty: TypeHash) -> Result<(), CompilationError> {
    if operand.has_type(ty) || operand.has_type(primitives::OBJECT) {
        Ok(())
    } else {
        Err(CompilationError::TypeMismatch {
            expression: node.to_string(),
            message: format!("expected {} operand, found {}", ty, operand.ty()),
        })
    }
}

fn specialize(
    node: &ExprRef,
    op: BinaryOp,
    left: Fragment,
    right: Fragment,
) -> Result<Fragment, CompilationError> {
    let (lt, rt) = (left.ty(), right.ty());

    if op.is_arithmetic() && (lt == primitives::BOOL || rt == primitives::BOOL) {
        return Err(CompilationError::TypeMismatch {
            expression: node.to_string(),
            message: format!("operator '{}' is not defined for {} and {}", op, lt, rt),
        });
    }

    if lt == primitives::INT && rt == primitives::INT {
        return Ok(Fragment::new(primitives::INT, move |frame| {
            match (left.eval(frame)?, right.eval(frame)?) {
                (Value::Int(a), Value::Int(b)) => runtime::int_binary(op, a, b),
                (a, b) => runtime::binary(op, &a, &b),
            }
        }));
    }

    if op.is_arithmetic() && primitives::is_numeric(lt) && primitives::is_numeric(rt) {
        return Ok(Fragment::new(primitives::DOUBLE, move |frame| {
            let (a, b) = (left.eval(frame)?, right.eval(frame)?);
            match (a.as_double(), b.as_double()) {
                (Some(x), Some(y)) => runtime::double_binary(op, x, y),
                _ => runtime::binary(op, &a, &b),
            }
        }));
    }

    if op == BinaryOp::Add && (lt == primitives::STRING || rt == primitives::STRING) {
        return Ok(Fragment::new(primitives::STRING, move |frame| {
            Ok(runtime::concat(&left.eval(frame)?, &right.eval(frame)?))
        }));
    }

    Ok(Fragment::new(primitives::OBJECT, move |frame| {
        runtime::binary(op, &left.eval(frame)?, &right.eval(frame)?)
    }))
}
