//! Compiled binding expressions with a per-shape invoker cache.
//!
//! A [`CompiledExpression`] owns a resolved expression tree whose binding
//! members all carry slot indices. Invoking it with a list of
//! [`ParameterValue`]s looks up the invoker built for those argument types,
//! building one on first use, and evaluates it against a fresh frame.
//!
//! # Lifecycle
//!
//! 1. Construction walks the tree once, checks that every member has an
//!    index, and records the members by index.
//! 2. Each invocation computes a [`ShapeKey`] from the argument types.
//! 3. On a cache miss, a build registers a slot fragment for every member,
//!    translates the root through the builder chain, and caches the result.
//!    Build-scoped metadata is dropped when the build ends.
//! 4. The invoker runs against a frame owned by that invocation, which is
//!    released on every exit path.

use std::sync::{Arc, PoisonError, RwLock};

use bindexpr_core::visitor::{ExpressionVisitor, accept};
use bindexpr_core::{
    BindExprError, CompilationError, ExprRef, MetadataContext, ParameterValue, RuntimeError, Value,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::builders::ExpressionBuilder;
use crate::context::{BuildContext, ExpressionBuildContext};
use crate::fragment::{Frame, ShapeInvoker, slot_fragment};
use crate::shape::ShapeKey;

/// A binding expression compiled for repeated invocation.
pub struct CompiledExpression {
    root: ExprRef,
    members: Vec<Option<ExprRef>>,
    builders: Arc<[Arc<dyn ExpressionBuilder>]>,
    metadata: Option<MetadataContext>,
    cache: RwLock<FxHashMap<ShapeKey, Arc<ShapeInvoker>>>,
}

/// Records binding members by slot index.
struct MemberTable {
    members: Vec<Option<ExprRef>>,
}

impl ExpressionVisitor for MemberTable {
    type Error = CompilationError;

    fn visit(
        &mut self,
        node: &ExprRef,
        _: Option<&MetadataContext>,
    ) -> Result<ExprRef, CompilationError> {
        let Some(member) = node.as_binding_member() else {
            return Ok(node.clone());
        };

        let index = member.index();
        let Ok(slot) = usize::try_from(index) else {
            return Err(CompilationError::UnresolvedMember {
                path: member.to_string(),
                index,
            });
        };
        if self.members.len() <= slot {
            self.members.resize(slot + 1, None);
        }
        match &self.members[slot] {
            None => self.members[slot] = Some(node.clone()),
            Some(existing) => {
                let known = existing.as_binding_member().map(|m| m.path());
                if known != Some(member.path()) {
                    return Err(CompilationError::Internal {
                        message: format!(
                            "binding members {} and {} share index {}",
                            existing, node, index
                        ),
                    });
                }
            }
        }
        Ok(node.clone())
    }
}

impl CompiledExpression {
    /// Prepare `expression` for invocation.
    ///
    /// `builders` must be sorted by descending priority. `metadata` is
    /// copied and becomes the base of every build's metadata.
    ///
    /// Fails with [`CompilationError::UnresolvedMember`] if any binding
    /// member has no index.
    pub fn new(
        expression: ExprRef,
        builders: Arc<[Arc<dyn ExpressionBuilder>]>,
        metadata: Option<&MetadataContext>,
    ) -> Result<Self, CompilationError> {
        let mut table = MemberTable { members: Vec::new() };
        accept(&expression, &mut table, metadata)?;
        debug!(expression = %expression, members = table.members.len(), "expression compiled");

        Ok(Self {
            root: expression,
            members: table.members,
            builders,
            metadata: metadata.cloned(),
            cache: RwLock::new(FxHashMap::default()),
        })
    }

    /// The resolved expression tree.
    pub fn expression(&self) -> &ExprRef {
        &self.root
    }

    /// Number of argument slots an invocation must supply.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Size of the evaluation frame: the member slots plus the metadata slot.
    pub fn frame_size(&self) -> usize {
        self.members.len() + 1
    }

    /// Binding member at `index`, if the tree uses that slot.
    pub fn member(&self, index: usize) -> Option<&ExprRef> {
        self.members.get(index).and_then(Option::as_ref)
    }

    /// Shapes that have a cached invoker.
    pub fn cached_shapes(&self) -> Vec<ShapeKey> {
        self.read_cache().keys().cloned().collect()
    }

    /// Invoke with one argument per member slot.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(
        &self,
        args: &[ParameterValue],
        metadata: Option<&MetadataContext>,
    ) -> Result<Value, BindExprError> {
        if args.len() != self.members.len() {
            return Err(RuntimeError::ArgumentCount {
                expected: self.members.len(),
                got: args.len(),
            }
            .into());
        }

        let shape = ShapeKey::of(args);
        let invoker = self.invoker(&shape)?;

        let slots: Vec<Value> = args.iter().map(|arg| arg.value.clone()).collect();
        let frame = Frame::new(&slots, metadata);
        Ok(invoker.invoke(&frame)?)
    }

    /// Invoke an expression with exactly one member.
    pub fn invoke_single(
        &self,
        arg: &ParameterValue,
        metadata: Option<&MetadataContext>,
    ) -> Result<Value, BindExprError> {
        self.invoke(std::slice::from_ref(arg), metadata)
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, FxHashMap<ShapeKey, Arc<ShapeInvoker>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached invoker for `shape`, building it on a miss.
    ///
    /// Concurrent misses may both build; the first insertion is kept.
    fn invoker(&self, shape: &ShapeKey) -> Result<Arc<ShapeInvoker>, CompilationError> {
        if let Some(invoker) = self.read_cache().get(shape) {
            trace!(?shape, "invoker cache hit");
            return Ok(Arc::clone(invoker));
        }

        trace!(?shape, "invoker cache miss");
        let built = Arc::new(self.build(shape)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(shape.clone()).or_insert(built)))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn build(&self, shape: &ShapeKey) -> Result<ShapeInvoker, CompilationError> {
        let mut ctx = ExpressionBuildContext::new(&self.builders, self.metadata.as_ref());
        for (index, (member, ty)) in self.members.iter().zip(shape.types()).enumerate() {
            if let Some(member) = member {
                ctx.set_fragment(member, slot_fragment(index, *ty));
            }
        }

        let root = ctx.build(&self.root)?;
        debug!(
            expression = %self.root,
            ?shape,
            result = %root.ty(),
            "invoker built"
        );
        Ok(ShapeInvoker::new(shape.clone(), root))
    }
}

impl std::fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("expression", &self.root.to_string())
            .field("members", &self.members.len())
            .field("cached_shapes", &self.read_cache().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::default_builders;
    use bindexpr_core::{
        BinaryOp, BindingMemberNode, ExprKind, ExprNode, MemberFlags, MemberRoot, primitives,
    };

    fn slot(path: &str, index: i32) -> ExprRef {
        ExprNode::binding_member(
            BindingMemberNode::new(
                path,
                MemberRoot::Source,
                MemberFlags::OBSERVABLE,
                ExprKind::Member,
            )
            .with_index(index),
        )
    }

    fn compile(expr: ExprRef) -> Result<CompiledExpression, CompilationError> {
        CompiledExpression::new(expr, default_builders().into(), None)
    }

    #[test]
    fn rejects_unassigned_members() {
        let expr = ExprNode::binary(BinaryOp::Add, slot("A", 0), slot("B", -1));
        let err = compile(expr).unwrap_err();
        assert_eq!(
            err,
            CompilationError::UnresolvedMember {
                path: "$source.B".to_string(),
                index: -1
            }
        );
    }

    #[test]
    fn records_members_by_index() {
        let expr = ExprNode::binary(BinaryOp::Add, slot("B", 1), slot("A", 0));
        let compiled = compile(expr).unwrap();
        assert_eq!(compiled.member_count(), 2);
        assert_eq!(compiled.frame_size(), 3);
        assert_eq!(compiled.member(0).unwrap().to_string(), "$source.A");
    }

    #[test]
    fn conflicting_members_on_one_index_are_rejected() {
        let expr = ExprNode::binary(BinaryOp::Add, slot("A", 0), slot("B", 0));
        assert!(matches!(compile(expr), Err(CompilationError::Internal { .. })));
    }

    #[test]
    fn invokes_and_caches_per_shape() {
        let expr = ExprNode::binary(BinaryOp::Add, slot("A", 0), slot("B", 1));
        let compiled = compile(expr).unwrap();

        let ints = [ParameterValue::new(2), ParameterValue::new(3)];
        assert_eq!(compiled.invoke(&ints, None).unwrap(), Value::Int(5));
        let more_ints = [ParameterValue::new(10), ParameterValue::new(20)];
        assert_eq!(compiled.invoke(&more_ints, None).unwrap(), Value::Int(30));
        assert_eq!(compiled.cached_shapes().len(), 1);

        let strings = [ParameterValue::new("a"), ParameterValue::new("b")];
        assert_eq!(compiled.invoke(&strings, None).unwrap(), Value::from("ab"));
        assert_eq!(compiled.cached_shapes().len(), 2);
    }

    #[test]
    fn argument_count_must_match() {
        let compiled = compile(slot("A", 0)).unwrap();
        let err = compiled.invoke(&[], None).unwrap_err();
        let expected = RuntimeError::ArgumentCount {
            expected: 1,
            got: 0,
        };
        assert_eq!(err, BindExprError::Runtime(expected));
        assert!(compiled.cached_shapes().is_empty());
    }

    #[test]
    fn typed_slots_coerce_values() {
        let compiled = compile(slot("A", 0)).unwrap();
        let arg = ParameterValue::typed(primitives::DOUBLE, 4);
        assert_eq!(
            compiled.invoke_single(&arg, None).unwrap(),
            Value::Double(4.0)
        );
    }

    #[test]
    fn expressions_without_members_take_no_arguments() {
        let compiled = compile(ExprNode::constant(1)).unwrap();
        assert_eq!(compiled.invoke(&[], None).unwrap(), Value::Int(1));
        assert_eq!(compiled.cached_shapes(), vec![ShapeKey::from_types(&[])]);
    }
}
