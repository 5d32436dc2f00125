//! Build context: the state a builder sees while translating one tree.

use std::sync::Arc;

use bindexpr_core::expr::ParameterExpr;
use bindexpr_core::{CompilationError, ExprNode, ExprRef, MetadataContext};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::builders::ExpressionBuilder;
use crate::fragment::Fragment;

/// Services offered to [`ExpressionBuilder`]s during one build.
pub trait BuildContext {
    /// Build-scoped metadata.
    ///
    /// Starts as a copy of the caller's metadata and is discarded when the
    /// build ends, so writes never reach the caller or a later build.
    fn metadata(&self) -> &MetadataContext;

    /// Mutable build-scoped metadata.
    fn metadata_mut(&mut self) -> &mut MetadataContext;

    /// Translate a child node through the builder chain, then the fallback
    /// table.
    fn build(&mut self, node: &ExprRef) -> Result<Fragment, CompilationError>;

    /// Fallback fragment registered for a node.
    fn fragment(&self, node: &ExprNode) -> Option<Fragment>;

    /// Register a fallback fragment for a node.
    fn set_fragment(&mut self, node: &ExprNode, fragment: Fragment);

    /// Enter a lambda scope.
    fn push_parameters(&mut self, parameters: &[ParameterExpr]);

    /// Leave the innermost `count` lambda parameters.
    fn pop_parameters(&mut self, count: usize);

    /// Local slot of a lambda parameter, innermost declaration first.
    fn parameter_index(&self, name: &str) -> Option<usize>;
}

/// Identity of a node in the fallback table.
///
/// Binding members compare by slot index and path; every other node by
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Member { index: i32, path: String },
    Node(usize),
}

impl NodeKey {
    fn of(node: &ExprNode) -> Self {
        match node.as_binding_member() {
            Some(member) => NodeKey::Member {
                index: member.index(),
                path: member.path().to_string(),
            },
            None => NodeKey::Node(node as *const ExprNode as usize),
        }
    }
}

/// [`BuildContext`] used by compiled expressions.
pub struct ExpressionBuildContext<'a> {
    builders: &'a [Arc<dyn ExpressionBuilder>],
    metadata: MetadataContext,
    fragments: FxHashMap<NodeKey, Fragment>,
    parameters: Vec<String>,
}

impl<'a> ExpressionBuildContext<'a> {
    /// Start a build over `builders`, which must be sorted by descending
    /// priority.
    pub fn new(
        builders: &'a [Arc<dyn ExpressionBuilder>],
        metadata: Option<&MetadataContext>,
    ) -> Self {
        let mut scoped = MetadataContext::new();
        if let Some(base) = metadata {
            scoped.merge(base);
        }
        Self {
            builders,
            metadata: scoped,
            fragments: FxHashMap::default(),
            parameters: Vec::new(),
        }
    }

    /// Number of lambda parameters currently in scope.
    pub fn scope_depth(&self) -> usize {
        self.parameters.len()
    }
}

impl BuildContext for ExpressionBuildContext<'_> {
    fn metadata(&self) -> &MetadataContext {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut MetadataContext {
        &mut self.metadata
    }

    fn build(&mut self, node: &ExprRef) -> Result<Fragment, CompilationError> {
        let builders = self.builders;
        for builder in builders {
            if let Some(fragment) = builder.try_build(self, node)? {
                return Ok(fragment);
            }
        }
        if let Some(fragment) = self.fragment(node) {
            return Ok(fragment);
        }
        trace!(node = %node, "no builder accepted node");
        Err(CompilationError::CannotCompile {
            expression: node.to_string(),
        })
    }

    fn fragment(&self, node: &ExprNode) -> Option<Fragment> {
        self.fragments.get(&NodeKey::of(node)).cloned()
    }

    fn set_fragment(&mut self, node: &ExprNode, fragment: Fragment) {
        self.fragments.insert(NodeKey::of(node), fragment);
    }

    fn push_parameters(&mut self, parameters: &[ParameterExpr]) {
        self.parameters.extend(parameters.iter().map(|p| p.name.clone()));
    }

    fn pop_parameters(&mut self, count: usize) {
        let keep = self.parameters.len().saturating_sub(count);
        self.parameters.truncate(keep);
    }

    fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().rposition(|p| p == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindexpr_core::{BindingMemberNode, ExprKind, MemberFlags, MemberRoot, MetadataKey, Value};

    const FLAG: MetadataKey<bool> = MetadataKey::new("flag");

    #[test]
    fn metadata_is_a_scoped_copy() {
        let base = MetadataContext::new().with(FLAG, true);
        let mut ctx = ExpressionBuildContext::new(&[], Some(&base));
        assert_eq!(ctx.metadata().get(FLAG), Some(&true));
        ctx.metadata_mut().set(FLAG, false);
        assert_eq!(base.get(FLAG), Some(&true));
    }

    #[test]
    fn members_are_found_by_index_and_path() {
        let node = |root, flags, kind| BindingMemberNode::new("A", root, flags, kind).with_index(0);
        let registered = node(MemberRoot::Source, MemberFlags::empty(), ExprKind::Member);
        let lookup = node(MemberRoot::Target, MemberFlags::OBSERVABLE, ExprKind::Index);
        let mut ctx = ExpressionBuildContext::new(&[], None);
        ctx.set_fragment(&ExprNode::BindingMember(registered), Fragment::constant(Value::Int(1)));
        assert!(ctx.fragment(&ExprNode::BindingMember(lookup)).is_some());
    }

    #[test]
    fn unknown_nodes_cannot_compile() {
        let mut ctx = ExpressionBuildContext::new(&[], None);
        let err = ctx.build(&ExprNode::ident("x")).unwrap_err();
        assert_eq!(
            err,
            CompilationError::CannotCompile { expression: "x".to_string() }
        );
    }

    #[test]
    fn parameters_shadow_outer_scopes() {
        let mut ctx = ExpressionBuildContext::new(&[], None);
        let outer = [ParameterExpr { name: "x".into() }, ParameterExpr { name: "y".into() }];
        ctx.push_parameters(&outer);
        ctx.push_parameters(&[ParameterExpr { name: "x".into() }]);
        assert_eq!(ctx.parameter_index("x"), Some(2));
        assert_eq!(ctx.parameter_index("y"), Some(1));
        ctx.pop_parameters(1);
        assert_eq!(ctx.parameter_index("x"), Some(0));
        assert_eq!(ctx.scope_depth(), 2);
        assert_eq!(ctx.parameter_index("z"), None);
    }
}
