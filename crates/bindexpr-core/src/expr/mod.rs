//! Expression node model for binding expressions.
//!
//! Nodes are immutable and shared through [`ExprRef`]. Rewrites build new
//! nodes and reuse unchanged subtrees, so pointer equality of a child after
//! a rewrite means "untouched".
//!
//! # Node kinds
//!
//! - Constants, lambda parameters, and lambdas
//! - Member access, indexers, and method calls (optionally without a target,
//!   meaning "on the binding's default root")
//! - Unary, binary, and conditional operators
//! - [`BindingMemberNode`] placeholders produced by member resolution
//!
//! # Example
//!
//! ```
//! use bindexpr_core::expr::{BinaryOp, ExprNode};
//!
//! // Name + "!"
//! let expr = ExprNode::binary(BinaryOp::Add, ExprNode::ident("Name"), ExprNode::constant("!"));
//! assert_eq!(expr.to_string(), "(Name + \"!\")");
//! ```

mod member;
mod ops;

pub use member::{BindingMemberKey, BindingMemberNode, MemberFlags, MemberRoot, MemberRootKey};
pub use ops::{BinaryOp, UnaryOp};

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Shared reference to an expression node.
pub type ExprRef = Arc<ExprNode>;

/// Discriminant of an [`ExprNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// [`ExprNode::Constant`]
    Constant,
    /// [`ExprNode::Member`]
    Member,
    /// [`ExprNode::Index`]
    Index,
    /// [`ExprNode::MethodCall`]
    MethodCall,
    /// [`ExprNode::Unary`]
    Unary,
    /// [`ExprNode::Binary`]
    Binary,
    /// [`ExprNode::Condition`]
    Condition,
    /// [`ExprNode::Lambda`]
    Lambda,
    /// [`ExprNode::Parameter`]
    Parameter,
    /// [`ExprNode::BindingMember`]
    BindingMember,
}

/// An expression node.
#[derive(Debug)]
pub enum ExprNode {
    /// Literal value
    Constant(ConstantExpr),
    /// Member access (`target.name` or bare `name`)
    Member(MemberExpr),
    /// Indexer (`target[args]`)
    Index(IndexExpr),
    /// Method call (`target.method(args)` or bare `method(args)`)
    MethodCall(MethodCallExpr),
    /// Unary prefix operation
    Unary(UnaryExpr),
    /// Binary operation
    Binary(BinaryExpr),
    /// Conditional (`condition ? if_true : if_false`)
    Condition(ConditionExpr),
    /// Lambda (`(x, y) => body`)
    Lambda(LambdaExpr),
    /// Reference to a lambda parameter
    Parameter(ParameterExpr),
    /// Resolved binding member placeholder
    BindingMember(BindingMemberNode),
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    /// The value
    pub value: Value,
}

/// Member access.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    /// Object being accessed; `None` for a bare identifier
    pub target: Option<ExprRef>,
    /// Member name
    pub name: String,
}

/// Indexer access.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    /// Object being indexed; `None` indexes the default root
    pub target: Option<ExprRef>,
    /// Index arguments
    pub args: Vec<ExprRef>,
}

/// Method call.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallExpr {
    /// Receiver; `None` calls on the default root
    pub target: Option<ExprRef>,
    /// Method name
    pub method: String,
    /// Arguments
    pub args: Vec<ExprRef>,
}

/// Unary prefix operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    /// Operator
    pub op: UnaryOp,
    /// Operand
    pub operand: ExprRef,
}

/// Binary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    /// Operator
    pub op: BinaryOp,
    /// Left operand
    pub left: ExprRef,
    /// Right operand
    pub right: ExprRef,
}

/// Conditional expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpr {
    /// Condition
    pub condition: ExprRef,
    /// Value when the condition holds
    pub if_true: ExprRef,
    /// Value otherwise
    pub if_false: ExprRef,
}

/// Lambda expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    /// Declared parameters
    pub parameters: Vec<ParameterExpr>,
    /// Body
    pub body: ExprRef,
}

/// A lambda parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterExpr {
    /// Parameter name
    pub name: String,
}

impl ExprNode {
    /// Constant node.
    pub fn constant(value: impl Into<Value>) -> ExprRef {
        Arc::new(ExprNode::Constant(ConstantExpr {
            value: value.into(),
        }))
    }

    /// Bare identifier (member access without a target).
    pub fn ident(name: impl Into<String>) -> ExprRef {
        Arc::new(ExprNode::Member(MemberExpr {
            target: None,
            name: name.into(),
        }))
    }

    /// Member access on a target.
    pub fn member(target: ExprRef, name: impl Into<String>) -> ExprRef {
        Arc::new(ExprNode::Member(MemberExpr {
            target: Some(target),
            name: name.into(),
        }))
    }

    /// Indexer access.
    pub fn index(target: Option<ExprRef>, args: Vec<ExprRef>) -> ExprRef {
        Arc::new(ExprNode::Index(IndexExpr { target, args }))
    }

    /// Method call.
    pub fn call(target: Option<ExprRef>, method: impl Into<String>, args: Vec<ExprRef>) -> ExprRef {
        Arc::new(ExprNode::MethodCall(MethodCallExpr {
            target,
            method: method.into(),
            args,
        }))
    }

    /// Unary operation.
    pub fn unary(op: UnaryOp, operand: ExprRef) -> ExprRef {
        Arc::new(ExprNode::Unary(UnaryExpr { op, operand }))
    }

    /// Binary operation.
    pub fn binary(op: BinaryOp, left: ExprRef, right: ExprRef) -> ExprRef {
        Arc::new(ExprNode::Binary(BinaryExpr { op, left, right }))
    }

    /// Conditional expression.
    pub fn condition(condition: ExprRef, if_true: ExprRef, if_false: ExprRef) -> ExprRef {
        Arc::new(ExprNode::Condition(ConditionExpr {
            condition,
            if_true,
            if_false,
        }))
    }

    /// Lambda expression.
    pub fn lambda<S: Into<String>>(
        parameters: impl IntoIterator<Item = S>,
        body: ExprRef,
    ) -> ExprRef {
        Arc::new(ExprNode::Lambda(LambdaExpr {
            parameters: parameters
                .into_iter()
                .map(|name| ParameterExpr { name: name.into() })
                .collect(),
            body,
        }))
    }

    /// Lambda parameter reference.
    pub fn parameter(name: impl Into<String>) -> ExprRef {
        Arc::new(ExprNode::Parameter(ParameterExpr { name: name.into() }))
    }

    /// Dynamic macro reference (`$name`).
    pub fn macro_ref(name: impl Into<String>) -> ExprRef {
        Self::unary(UnaryOp::DynamicExpression, Self::ident(name))
    }

    /// Static macro reference (`$$name`).
    pub fn static_ref(name: impl Into<String>) -> ExprRef {
        Self::unary(UnaryOp::StaticExpression, Self::ident(name))
    }

    /// Wrap a binding member placeholder.
    pub fn binding_member(member: BindingMemberNode) -> ExprRef {
        Arc::new(ExprNode::BindingMember(member))
    }

    /// The node's kind.
    pub fn kind(&self) -> ExprKind {
        match self {
            ExprNode::Constant(_) => ExprKind::Constant,
            ExprNode::Member(_) => ExprKind::Member,
            ExprNode::Index(_) => ExprKind::Index,
            ExprNode::MethodCall(_) => ExprKind::MethodCall,
            ExprNode::Unary(_) => ExprKind::Unary,
            ExprNode::Binary(_) => ExprKind::Binary,
            ExprNode::Condition(_) => ExprKind::Condition,
            ExprNode::Lambda(_) => ExprKind::Lambda,
            ExprNode::Parameter(_) => ExprKind::Parameter,
            ExprNode::BindingMember(_) => ExprKind::BindingMember,
        }
    }

    /// The binding member payload, if this is a placeholder.
    pub fn as_binding_member(&self) -> Option<&BindingMemberNode> {
        match self {
            ExprNode::BindingMember(m) => Some(m),
            _ => None,
        }
    }

    /// The constant payload, if this is a constant.
    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            ExprNode::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&ExprRef> {
        match self {
            ExprNode::Constant(_) | ExprNode::Parameter(_) | ExprNode::BindingMember(_) => {
                Vec::new()
            }
            ExprNode::Member(m) => m.target.iter().collect(),
            ExprNode::Index(i) => i.target.iter().chain(i.args.iter()).collect(),
            ExprNode::MethodCall(c) => c.target.iter().chain(c.args.iter()).collect(),
            ExprNode::Unary(u) => vec![&u.operand],
            ExprNode::Binary(b) => vec![&b.left, &b.right],
            ExprNode::Condition(c) => vec![&c.condition, &c.if_true, &c.if_false],
            ExprNode::Lambda(l) => vec![&l.body],
        }
    }

    /// Rebuild this node with replacement children.
    ///
    /// `children` follows the order of [`children`](Self::children); a
    /// missing replacement keeps the original child. Leaf nodes return `None`.
    pub fn with_children(&self, children: Vec<ExprRef>) -> Option<ExprNode> {
        let mut it = children.into_iter();
        let mut next = |original: &ExprRef| it.next().unwrap_or_else(|| Arc::clone(original));
        let node = match self {
            ExprNode::Member(m) => ExprNode::Member(MemberExpr {
                target: m.target.as_ref().map(&mut next),
                name: m.name.clone(),
            }),
            ExprNode::Index(i) => {
                let target = i.target.as_ref().map(&mut next);
                let args = i.args.iter().map(&mut next).collect();
                ExprNode::Index(IndexExpr { target, args })
            }
            ExprNode::MethodCall(c) => {
                let target = c.target.as_ref().map(&mut next);
                let args = c.args.iter().map(&mut next).collect();
                ExprNode::MethodCall(MethodCallExpr {
                    target,
                    method: c.method.clone(),
                    args,
                })
            }
            ExprNode::Unary(u) => ExprNode::Unary(UnaryExpr {
                op: u.op,
                operand: next(&u.operand),
            }),
            ExprNode::Binary(b) => ExprNode::Binary(BinaryExpr {
                op: b.op,
                left: next(&b.left),
                right: next(&b.right),
            }),
            ExprNode::Condition(c) => ExprNode::Condition(ConditionExpr {
                condition: next(&c.condition),
                if_true: next(&c.if_true),
                if_false: next(&c.if_false),
            }),
            ExprNode::Lambda(l) => ExprNode::Lambda(LambdaExpr {
                parameters: l.parameters.clone(),
                body: next(&l.body),
            }),
            ExprNode::Constant(_) | ExprNode::Parameter(_) | ExprNode::BindingMember(_) => {
                return None;
            }
        };
        Some(node)
    }
}

impl PartialEq for ExprNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExprNode::Constant(a), ExprNode::Constant(b)) => a == b,
            (ExprNode::Member(a), ExprNode::Member(b)) => a == b,
            (ExprNode::Index(a), ExprNode::Index(b)) => a == b,
            (ExprNode::MethodCall(a), ExprNode::MethodCall(b)) => a == b,
            (ExprNode::Unary(a), ExprNode::Unary(b)) => a == b,
            (ExprNode::Binary(a), ExprNode::Binary(b)) => a == b,
            (ExprNode::Condition(a), ExprNode::Condition(b)) => a == b,
            (ExprNode::Lambda(a), ExprNode::Lambda(b)) => a == b,
            (ExprNode::Parameter(a), ExprNode::Parameter(b)) => a == b,
            (ExprNode::BindingMember(a), ExprNode::BindingMember(b)) => a == b,
            _ => false,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[ExprRef]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprNode::Constant(c) => match &c.value {
                Value::Null => f.write_str("null"),
                Value::String(s) => write!(f, "{:?}", s),
                other => write!(f, "{}", other),
            },
            ExprNode::Member(m) => match &m.target {
                Some(target) => write!(f, "{}.{}", target, m.name),
                None => f.write_str(&m.name),
            },
            ExprNode::Index(i) => {
                if let Some(target) = &i.target {
                    write!(f, "{}", target)?;
                }
                f.write_str("[")?;
                write_args(f, &i.args)?;
                f.write_str("]")
            }
            ExprNode::MethodCall(c) => {
                if let Some(target) = &c.target {
                    write!(f, "{}.", target)?;
                }
                write!(f, "{}(", c.method)?;
                write_args(f, &c.args)?;
                f.write_str(")")
            }
            ExprNode::Unary(u) => write!(f, "{}{}", u.op, u.operand),
            ExprNode::Binary(b) => write!(f, "({} {} {})", b.left, b.op, b.right),
            ExprNode::Condition(c) => {
                write!(f, "({} ? {} : {})", c.condition, c.if_true, c.if_false)
            }
            ExprNode::Lambda(l) => {
                f.write_str("(")?;
                for (i, p) in l.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&p.name)?;
                }
                write!(f, ") => {}", l.body)
            }
            ExprNode::Parameter(p) => f.write_str(&p.name),
            ExprNode::BindingMember(m) => write!(f, "{}", m),
        }
    }
}
