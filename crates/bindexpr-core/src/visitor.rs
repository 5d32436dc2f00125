//! Visitor protocol for rewriting expression trees.
//!
//! An [`ExpressionVisitor`] is offered every node of a tree through
//! [`accept`]. It returns either the same node (keep it) or a replacement.
//!
//! - **Pre-order** visitors see a node before its children. Returning a
//!   replacement stops descent into that subtree.
//! - **Post-order** visitors see a node after its children were visited, so
//!   they receive the already rebuilt node.
//!
//! Subtrees that nothing replaced are shared with the input, and a tree that
//! nothing replaced comes back pointer-equal to the input.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//! use bindexpr_core::{ExprNode, ExprRef, MetadataContext};
//! use bindexpr_core::visitor::{ExpressionVisitor, accept};
//!
//! struct CountMembers(usize);
//!
//! impl ExpressionVisitor for CountMembers {
//!     type Error = Infallible;
//!
//!     fn visit(
//!         &mut self,
//!         node: &ExprRef,
//!         _: Option<&MetadataContext>,
//!     ) -> Result<ExprRef, Infallible> {
//!         if matches!(**node, ExprNode::Member(_)) {
//!             self.0 += 1;
//!         }
//!         Ok(node.clone())
//!     }
//! }
//!
//! let expr = ExprNode::member(ExprNode::ident("a"), "b");
//! let mut counter = CountMembers(0);
//! let same = accept(&expr, &mut counter, None).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&same, &expr));
//! assert_eq!(counter.0, 2);
//! ```

use std::sync::Arc;

use crate::expr::ExprRef;
use crate::metadata::MetadataContext;

/// When a visitor sees a node relative to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalOrder {
    /// Node first, then (unless replaced) its children.
    #[default]
    PreOrder,
    /// Children first, then the rebuilt node.
    PostOrder,
}

/// A node visitor that may replace nodes.
pub trait ExpressionVisitor {
    /// Error raised by the visitor.
    type Error;

    /// Traversal order of this visitor.
    fn order(&self) -> TraversalOrder {
        TraversalOrder::PreOrder
    }

    /// Visit one node, returning it unchanged or a replacement.
    fn visit(
        &mut self,
        node: &ExprRef,
        metadata: Option<&MetadataContext>,
    ) -> Result<ExprRef, Self::Error>;
}

/// Run a visitor over a tree.
pub fn accept<V: ExpressionVisitor + ?Sized>(
    node: &ExprRef,
    visitor: &mut V,
    metadata: Option<&MetadataContext>,
) -> Result<ExprRef, V::Error> {
    match visitor.order() {
        TraversalOrder::PreOrder => {
            let visited = visitor.visit(node, metadata)?;
            if !Arc::ptr_eq(&visited, node) {
                return Ok(visited);
            }
            accept_children(node, visitor, metadata)
        }
        TraversalOrder::PostOrder => {
            let rebuilt = accept_children(node, visitor, metadata)?;
            visitor.visit(&rebuilt, metadata)
        }
    }
}

/// Visit the children of `node`, rebuilding it only if a child changed.
pub fn accept_children<V: ExpressionVisitor + ?Sized>(
    node: &ExprRef,
    visitor: &mut V,
    metadata: Option<&MetadataContext>,
) -> Result<ExprRef, V::Error> {
    let children = node.children();
    if children.is_empty() {
        return Ok(Arc::clone(node));
    }

    let mut changed = false;
    let mut visited = Vec::with_capacity(children.len());
    for child in children {
        let result = accept(child, visitor, metadata)?;
        changed |= !Arc::ptr_eq(&result, child);
        visited.push(result);
    }

    if !changed {
        return Ok(Arc::clone(node));
    }
    Ok(node.with_children(visited).map_or_else(|| Arc::clone(node), Arc::new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, ExprNode};
    use std::convert::Infallible;

    /// Replaces identifiers named `x` with the constant 1 and records visit order.
    struct ReplaceX {
        order: TraversalOrder,
        seen: Vec<String>,
    }

    impl ExpressionVisitor for ReplaceX {
        type Error = Infallible;

        fn order(&self) -> TraversalOrder {
            self.order
        }

        fn visit(
            &mut self,
            node: &ExprRef,
            _: Option<&MetadataContext>,
        ) -> Result<ExprRef, Infallible> {
            self.seen.push(node.to_string());
            match &**node {
                ExprNode::Member(m) if m.target.is_none() && m.name == "x" => {
                    Ok(ExprNode::constant(1))
                }
                _ => Ok(node.clone()),
            }
        }
    }

    #[test]
    fn pre_order_visits_parent_first() {
        let tree = ExprNode::binary(BinaryOp::Add, ExprNode::ident("x"), ExprNode::ident("y"));
        let mut v = ReplaceX {
            order: TraversalOrder::PreOrder,
            seen: Vec::new(),
        };
        let out = accept(&tree, &mut v, None).unwrap();
        assert_eq!(out.to_string(), "(1 + y)");
        assert_eq!(v.seen, vec!["(x + y)", "x", "y"]);
    }

    #[test]
    fn post_order_visits_rebuilt_parent_last() {
        let tree = ExprNode::binary(BinaryOp::Add, ExprNode::ident("x"), ExprNode::ident("y"));
        let mut v = ReplaceX {
            order: TraversalOrder::PostOrder,
            seen: Vec::new(),
        };
        accept(&tree, &mut v, None).unwrap();
        assert_eq!(v.seen, vec!["x", "y", "(1 + y)"]);
    }

    #[test]
    fn unchanged_subtrees_are_shared() {
        let right = ExprNode::member(ExprNode::ident("a"), "b");
        let tree = ExprNode::binary(BinaryOp::Mul, ExprNode::ident("x"), right.clone());
        let mut v = ReplaceX {
            order: TraversalOrder::PreOrder,
            seen: Vec::new(),
        };
        let out = accept(&tree, &mut v, None).unwrap();
        assert!(!Arc::ptr_eq(&out, &tree));
        match &*out {
            ExprNode::Binary(b) => assert!(Arc::ptr_eq(&b.right, &right)),
            other => panic!("unexpected node {other:?}"),
        }
    }
}
