//! Index assignment for binding member placeholders.

use std::convert::Infallible;

use bindexpr_core::visitor::{ExpressionVisitor, accept};
use bindexpr_core::{BindingMemberKey, ExprRef, MetadataContext};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Assigns argument slot indices to the binding members of one or more
/// resolved expressions.
///
/// Members are numbered in first-seen order. Every placeholder that is the
/// same node, or has an equal [`BindingMemberKey`], shares one index, so the
/// binding layer supplies one value per distinct member.
#[derive(Debug, Default)]
pub struct BindingMemberCollector {
    members: Vec<ExprRef>,
    indices: FxHashMap<BindingMemberKey, i32>,
}

impl BindingMemberCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign indices to every member in `expression`.
    pub fn collect(&mut self, expression: &ExprRef, metadata: Option<&MetadataContext>) {
        match accept(expression, self, metadata) {
            Ok(_) => {}
            Err(never) => match never {},
        }
    }

    /// Distinct members in index order.
    pub fn members(&self) -> &[ExprRef] {
        &self.members
    }

    /// Consume the collector, returning the members in index order.
    pub fn into_members(self) -> Vec<ExprRef> {
        self.members
    }

    /// Number of distinct members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no members were collected.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl ExpressionVisitor for BindingMemberCollector {
    type Error = Infallible;

    fn visit(
        &mut self,
        node: &ExprRef,
        _: Option<&MetadataContext>,
    ) -> Result<ExprRef, Infallible> {
        let Some(member) = node.as_binding_member() else {
            return Ok(node.clone());
        };
        let key = member.key();
        let index = match self.indices.get(&key) {
            Some(&index) => index,
            None => {
                // Past the slot range the member stays unassigned and fails
                // compilation as unresolved.
                let Ok(index) = i32::try_from(self.members.len()) else {
                    return Ok(node.clone());
                };
                self.indices.insert(key, index);
                self.members.push(node.clone());
                trace!(member = %node, index, "binding member indexed");
                index
            }
        };
        member.set_index(index);
        Ok(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindexpr_core::{BinaryOp, BindingMemberNode, ExprKind, ExprNode, MemberFlags, MemberRoot};

    fn placeholder(path: &str) -> ExprRef {
        ExprNode::binding_member(BindingMemberNode::new(
            path,
            MemberRoot::Source,
            MemberFlags::OBSERVABLE,
            ExprKind::Member,
        ))
    }

    #[test]
    fn assigns_indices_in_first_seen_order() {
        let a = placeholder("A");
        let b = placeholder("B");
        let expr = ExprNode::binary(
            BinaryOp::Add,
            a.clone(),
            ExprNode::binary(BinaryOp::Mul, b.clone(), a.clone()),
        );
        let mut collector = BindingMemberCollector::new();
        collector.collect(&expr, None);

        assert_eq!(collector.len(), 2);
        assert_eq!(a.as_binding_member().unwrap().index(), 0);
        assert_eq!(b.as_binding_member().unwrap().index(), 1);
    }

    #[test]
    fn collecting_twice_keeps_indices() {
        let a = placeholder("A");
        let b = placeholder("B");
        let expr = ExprNode::binary(BinaryOp::Add, a.clone(), b.clone());
        let mut collector = BindingMemberCollector::new();
        collector.collect(&expr, None);
        collector.collect(&ExprNode::binary(BinaryOp::Sub, b.clone(), a.clone()), None);

        assert_eq!(collector.len(), 2);
        assert_eq!(a.as_binding_member().unwrap().index(), 0);
        assert_eq!(b.as_binding_member().unwrap().index(), 1);
    }

    #[test]
    fn equal_keys_share_an_index() {
        let first = placeholder("Name");
        let second = placeholder("Name");
        let expr = ExprNode::binary(BinaryOp::Add, first.clone(), second.clone());
        let mut collector = BindingMemberCollector::new();
        collector.collect(&expr, None);

        assert_eq!(collector.members().len(), 1);
        assert_eq!(second.as_binding_member().unwrap().index(), 0);
    }

    #[test]
    fn index_space_spans_multiple_expressions() {
        let mut collector = BindingMemberCollector::new();
        collector.collect(&placeholder("A"), None);
        let b = placeholder("B");
        collector.collect(&b, None);
        assert_eq!(b.as_binding_member().unwrap().index(), 1);
        assert_eq!(collector.into_members().len(), 2);
    }
}
