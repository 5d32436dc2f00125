//! Member resolution: rewrites member chains into binding member placeholders.
//!
//! The visitor runs pre-order over a parsed binding expression and replaces
//! every chain it can flatten into a dotted path (`Address.City`,
//! `$source.Items[0]`, `$context.Title`) with a [`BindingMemberNode`] on the
//! right root. Chains that hang off something only known at runtime (a call
//! result, a lambda parameter, arithmetic) keep their member access nodes and
//! only their flattenable parts are rewritten.
//!
//! Bare identifiers naming a parameter of an enclosing lambda become
//! [`ExprNode::Parameter`] references instead of binding members.
//!
//! # Macros
//!
//! | macro | root |
//! |-------|------|
//! | `$target`, `$self`, `$this` | binding target |
//! | `$source` | binding source |
//! | `$context` | binding target, path prefixed with `DataContext` |
//! | `$Name` | static members of type `Name`, else resource `Name` |
//!
//! A `$$` prefix marks the chain as static: it is evaluated once while
//! resolving and replaced by a constant.
//!
//! # Example
//!
//! ```
//! use bindexpr_compiler::MemberExpressionVisitor;
//! use bindexpr_core::{ExprNode, MemberRoot};
//!
//! let expr = ExprNode::member(ExprNode::macro_ref("self"), "Title");
//! let mut visitor = MemberExpressionVisitor::new();
//! let resolved = visitor.resolve(&expr, false, None).unwrap();
//!
//! let member = resolved.as_binding_member().unwrap();
//! assert_eq!(member.path(), "Title");
//! assert!(matches!(member.root(), MemberRoot::Target));
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use bindexpr_core::expr::{IndexExpr, LambdaExpr, MemberExpr, MethodCallExpr};
use bindexpr_core::visitor::{ExpressionVisitor, accept};
use bindexpr_core::{
    BindingMemberKey, BindingMemberNode, ExprKind, ExprNode, ExprRef, MemberFlags, MemberRoot,
    MetadataContext, ResolveError, RuntimeError, UnaryOp, Value,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::resolver::{ResourceResolver, TypeResolver};
use crate::runtime;

/// Member prepended to paths resolved through `$context`.
pub const DATA_CONTEXT_MEMBER: &str = "DataContext";

/// Tunables for [`MemberExpressionVisitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberVisitorSettings {
    /// Flags given to every created member.
    pub flags: MemberFlags,
    /// Record method names on call receivers so the binding layer can
    /// observe them.
    pub observe_methods: bool,
    /// Fold indexers with constant arguments into the member path.
    pub flatten_constant_indexers: bool,
}

impl Default for MemberVisitorSettings {
    fn default() -> Self {
        Self {
            flags: MemberFlags::OBSERVABLE,
            observe_methods: false,
            flatten_constant_indexers: true,
        }
    }
}

#[derive(Debug, Clone)]
enum PathSegment {
    Member(String),
    Index(Vec<Value>),
}

/// Path being flattened: display text and the segments it was built from.
#[derive(Debug, Clone, Default)]
struct MemberPath {
    text: String,
    segments: Vec<PathSegment>,
}

impl MemberPath {
    fn clear(&mut self) {
        self.text.clear();
        self.segments.clear();
    }

    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn push_member(&mut self, name: &str) {
        if !self.text.is_empty() {
            self.text.push('.');
        }
        self.text.push_str(name);
        self.segments.push(PathSegment::Member(name.to_string()));
    }

    fn push_index(&mut self, args: Vec<Value>) {
        self.text.push('[');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.text.push_str(", ");
            }
            // Writing to a String cannot fail.
            let _ = match arg {
                Value::String(s) => write!(self.text, "{:?}", s),
                Value::Null => write!(self.text, "null"),
                other => write!(self.text, "{}", other),
            };
        }
        self.text.push(']');
        self.segments.push(PathSegment::Index(args));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StaticKind {
    Type,
    Resource,
}

/// Root of a flattened chain.
struct FlatRoot {
    root: MemberRoot,
    is_static: bool,
}

/// Rewrites member chains into [`BindingMemberNode`] placeholders.
///
/// Within one [`resolve`](Self::resolve) call, equal placeholder requests
/// return the same node instance, and each static chain is evaluated once.
pub struct MemberExpressionVisitor {
    settings: MemberVisitorSettings,
    type_resolver: Option<Arc<dyn TypeResolver>>,
    resource_resolver: Option<Arc<dyn ResourceResolver>>,
    is_target: bool,
    members: FxHashMap<BindingMemberKey, ExprRef>,
    statics: FxHashMap<(StaticKind, String), ExprRef>,
    path: MemberPath,
    /// Parameter names of the enclosing lambdas, innermost last.
    parameters: Vec<String>,
}

impl Default for MemberExpressionVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberExpressionVisitor {
    /// Create a visitor with default settings and no resolvers.
    pub fn new() -> Self {
        Self::with_settings(MemberVisitorSettings::default())
    }

    /// Create a visitor with explicit settings.
    pub fn with_settings(settings: MemberVisitorSettings) -> Self {
        Self {
            settings,
            type_resolver: None,
            resource_resolver: None,
            is_target: false,
            members: FxHashMap::default(),
            statics: FxHashMap::default(),
            path: MemberPath::default(),
            parameters: Vec::new(),
        }
    }

    /// Use `resolver` for `$Type` macros.
    pub fn with_type_resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.type_resolver = Some(resolver);
        self
    }

    /// Use `resolver` for `$resource` macros.
    pub fn with_resource_resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resource_resolver = Some(resolver);
        self
    }

    /// Current settings.
    pub fn settings(&self) -> &MemberVisitorSettings {
        &self.settings
    }

    /// Mutable settings.
    pub fn settings_mut(&mut self) -> &mut MemberVisitorSettings {
        &mut self.settings
    }

    /// Resolve the members of one expression.
    ///
    /// `is_target` selects the default root for plain paths: the binding
    /// target for target expressions, the source otherwise. Transient caches
    /// are empty before and after the call, whatever its outcome.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(
        &mut self,
        expression: &ExprRef,
        is_target: bool,
        metadata: Option<&MetadataContext>,
    ) -> Result<ExprRef, ResolveError> {
        self.reset();
        self.is_target = is_target;

        let result = accept(expression, self, metadata);
        match &result {
            Ok(resolved) => debug!(
                expression = %expression,
                members = self.members.len(),
                statics = self.statics.len(),
                changed = !Arc::ptr_eq(resolved, expression),
                "members resolved"
            ),
            Err(err) => debug!(expression = %expression, error = %err, "member resolution failed"),
        }

        self.reset();
        result
    }

    fn reset(&mut self) {
        self.members.clear();
        self.statics.clear();
        self.path.clear();
        self.parameters.clear();
    }

    fn is_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }

    fn default_root(&self) -> MemberRoot {
        if self.is_target {
            MemberRoot::Target
        } else {
            MemberRoot::Source
        }
    }

    /// Flatten `node` using the shared path buffer.
    fn flatten_root(
        &mut self,
        node: &ExprRef,
    ) -> Result<Option<(FlatRoot, MemberPath)>, ResolveError> {
        let mut path = std::mem::take(&mut self.path);
        path.clear();
        let result = self.flatten(node, &mut path);
        let flattened = match result {
            Ok(Some(root)) => Ok(Some((root, path.clone()))),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        self.path = path;
        flattened
    }

    /// Walk a member chain down to its root, appending segments to `path`.
    ///
    /// Returns `None` when the chain does not start at a binding root, such
    /// as a lambda parameter.
    fn flatten(
        &mut self,
        node: &ExprRef,
        path: &mut MemberPath,
    ) -> Result<Option<FlatRoot>, ResolveError> {
        match &**node {
            ExprNode::Member(MemberExpr { target: None, name }) if self.is_parameter(name) => {
                Ok(None)
            }
            ExprNode::Member(member) => {
                let Some(root) = self.flatten_target(member.target.as_ref(), path)? else {
                    return Ok(None);
                };
                path.push_member(&member.name);
                Ok(Some(root))
            }
            ExprNode::Index(index) if self.settings.flatten_constant_indexers => {
                let Some(args) = index
                    .args
                    .iter()
                    .map(|arg| arg.as_constant().cloned())
                    .collect::<Option<Vec<_>>>()
                else {
                    return Ok(None);
                };
                let Some(root) = self.flatten_target(index.target.as_ref(), path)? else {
                    return Ok(None);
                };
                path.push_index(args);
                Ok(Some(root))
            }
            ExprNode::Unary(unary) if unary.op.is_macro() => match &*unary.operand {
                ExprNode::Member(MemberExpr { target: None, name }) => self
                    .resolve_macro(name, unary.op == UnaryOp::StaticExpression, path)
                    .map(Some),
                _ => Err(ResolveError::CannotFlatten {
                    expression: node.to_string(),
                }),
            },
            _ => Ok(None),
        }
    }

    fn flatten_target(
        &mut self,
        target: Option<&ExprRef>,
        path: &mut MemberPath,
    ) -> Result<Option<FlatRoot>, ResolveError> {
        match target {
            None => Ok(Some(FlatRoot {
                root: self.default_root(),
                is_static: false,
            })),
            Some(target) => self.flatten(target, path),
        }
    }

    fn resolve_macro(
        &self,
        name: &str,
        is_static: bool,
        path: &mut MemberPath,
    ) -> Result<FlatRoot, ResolveError> {
        let root = match name {
            "target" | "self" | "this" => MemberRoot::Target,
            "source" => MemberRoot::Source,
            "context" => {
                path.push_member(DATA_CONTEXT_MEMBER);
                MemberRoot::Target
            }
            _ => {
                if let Some(ty) = self.type_resolver.as_ref().and_then(|r| r.resolve_type(name)) {
                    MemberRoot::Static {
                        name: ty.name,
                        ty: ty.ty,
                        statics: ty.statics,
                    }
                } else if let Some(value) = self
                    .resource_resolver
                    .as_ref()
                    .and_then(|r| r.resolve_resource(name))
                {
                    MemberRoot::Resource {
                        name: name.to_string(),
                        value,
                    }
                } else {
                    return Err(ResolveError::UnknownMacro { name: name.to_string() });
                }
            }
        };
        Ok(FlatRoot { root, is_static })
    }

    /// Turn a flattened chain into the node that replaces it.
    fn materialize(
        &mut self,
        flat: FlatRoot,
        path: MemberPath,
        kind: ExprKind,
        method_name: Option<&str>,
    ) -> Result<ExprRef, ResolveError> {
        if flat.is_static {
            return self.fold_static(flat.root, &path);
        }
        if let MemberRoot::Static { statics, .. } = &flat.root
            && path.is_empty()
        {
            return Ok(ExprNode::constant(statics.clone()));
        }
        Ok(self.get_or_add_member(path.text, flat.root, kind, method_name))
    }

    fn get_or_add_member(
        &mut self,
        path: String,
        root: MemberRoot,
        kind: ExprKind,
        method_name: Option<&str>,
    ) -> ExprRef {
        let mut flags = self.settings.flags;
        if matches!(root, MemberRoot::Target) {
            flags |= MemberFlags::TARGET;
        }
        if method_name.is_some() {
            flags |= MemberFlags::OBSERVABLE_METHODS;
        }

        let key = BindingMemberKey {
            path,
            method_name: method_name.map(str::to_string),
            flags,
            root: root.key(),
            kind,
        };
        if let Some(existing) = self.members.get(&key) {
            return existing.clone();
        }

        let mut member = BindingMemberNode::new(key.path.clone(), root, flags, kind);
        if let Some(method) = method_name {
            member = member.with_method_name(method);
        }
        let node = ExprNode::binding_member(member);
        trace!(member = %node, ?kind, "binding member created");
        self.members.insert(key, node.clone());
        node
    }

    /// Evaluate a `$$` chain once and cache the resulting constant.
    fn fold_static(
        &mut self,
        root: MemberRoot,
        path: &MemberPath,
    ) -> Result<ExprRef, ResolveError> {
        let expression = || {
            let mut text = format!("${}", root.prefix());
            if !path.text.is_empty() && !path.text.starts_with('[') {
                text.push('.');
            }
            text.push_str(&path.text);
            text
        };

        let (kind, name, start) = match &root {
            MemberRoot::Static { name, statics, .. } => (StaticKind::Type, name, statics),
            MemberRoot::Resource { name, value } => (StaticKind::Resource, name, value),
            MemberRoot::Target | MemberRoot::Source => {
                return Err(ResolveError::StaticEvaluation {
                    expression: expression(),
                    message: "binding target and source are only known at runtime".to_string(),
                });
            }
        };

        let key = (kind, format!("{}:{}", name, path.text));
        if let Some(folded) = self.statics.get(&key) {
            return Ok(folded.clone());
        }

        let value = evaluate_path(start.clone(), &path.segments).map_err(|err| {
            ResolveError::StaticEvaluation {
                expression: expression(),
                message: err.to_string(),
            }
        })?;
        let node = ExprNode::constant(value);
        trace!(expression = %expression(), value = %node, "static expression folded");
        self.statics.insert(key, node.clone());
        Ok(node)
    }

    /// Replace a flattenable chain, or leave it for child traversal.
    fn rewrite_chain(&mut self, node: &ExprRef) -> Result<Option<ExprRef>, ResolveError> {
        let Some((flat, path)) = self.flatten_root(node)? else {
            return Ok(None);
        };
        self.materialize(flat, path, node.kind(), None).map(Some)
    }

    /// Resolve the receiver of an indexer or call.
    fn rewrite_receiver(
        &mut self,
        target: Option<&ExprRef>,
        kind: ExprKind,
        method_name: Option<&str>,
        metadata: Option<&MetadataContext>,
    ) -> Result<ExprRef, ResolveError> {
        let Some(target) = target else {
            let root = self.default_root();
            return Ok(self.get_or_add_member(String::new(), root, kind, method_name));
        };
        match self.flatten_root(target)? {
            Some((flat, path)) => self.materialize(flat, path, kind, method_name),
            None => accept(target, self, metadata),
        }
    }

    /// Resolve a lambda body with its parameters in scope.
    fn rewrite_lambda(
        &mut self,
        node: &ExprRef,
        lambda: &LambdaExpr,
        metadata: Option<&MetadataContext>,
    ) -> Result<ExprRef, ResolveError> {
        let depth = self.parameters.len();
        self.parameters.extend(lambda.parameters.iter().map(|p| p.name.clone()));
        let body = accept(&lambda.body, self, metadata);
        self.parameters.truncate(depth);
        let body = body?;

        // An unchanged body holds no identifiers or chains, so the child
        // walk that follows leaves it as is.
        if Arc::ptr_eq(&body, &lambda.body) {
            return Ok(node.clone());
        }
        Ok(Arc::new(ExprNode::Lambda(LambdaExpr {
            parameters: lambda.parameters.clone(),
            body,
        })))
    }

    fn visit_args(
        &mut self,
        args: &[ExprRef],
        metadata: Option<&MetadataContext>,
    ) -> Result<Vec<ExprRef>, ResolveError> {
        args.iter().map(|arg| accept(arg, self, metadata)).collect()
    }

    fn rewrite_index(
        &mut self,
        index: &IndexExpr,
        metadata: Option<&MetadataContext>,
    ) -> Result<ExprRef, ResolveError> {
        let target = self.rewrite_receiver(index.target.as_ref(), ExprKind::Index, None, metadata)?;
        let args = self.visit_args(&index.args, metadata)?;
        Ok(ExprNode::index(Some(target), args))
    }

    fn rewrite_call(
        &mut self,
        call: &MethodCallExpr,
        metadata: Option<&MetadataContext>,
    ) -> Result<ExprRef, ResolveError> {
        let observed = self.settings.observe_methods.then_some(call.method.as_str());
        let target =
            self.rewrite_receiver(call.target.as_ref(), ExprKind::MethodCall, observed, metadata)?;
        let args = self.visit_args(&call.args, metadata)?;
        Ok(ExprNode::call(Some(target), call.method.clone(), args))
    }
}

impl ExpressionVisitor for MemberExpressionVisitor {
    type Error = ResolveError;

    fn visit(
        &mut self,
        node: &ExprRef,
        metadata: Option<&MetadataContext>,
    ) -> Result<ExprRef, ResolveError> {
        let rewritten = match &**node {
            ExprNode::Member(MemberExpr { target: None, name }) if self.is_parameter(name) => {
                Some(ExprNode::parameter(name.clone()))
            }
            ExprNode::Member(_) => self.rewrite_chain(node)?,
            ExprNode::Index(index) => match self.rewrite_chain(node)? {
                Some(flattened) => Some(flattened),
                None => Some(self.rewrite_index(index, metadata)?),
            },
            ExprNode::MethodCall(call) => Some(self.rewrite_call(call, metadata)?),
            ExprNode::Lambda(lambda) => Some(self.rewrite_lambda(node, lambda, metadata)?),
            ExprNode::Unary(unary) if unary.op.is_macro() => self.rewrite_chain(node)?,
            _ => None,
        };
        Ok(rewritten.unwrap_or_else(|| node.clone()))
    }
}

fn evaluate_path(mut value: Value, segments: &[PathSegment]) -> Result<Value, RuntimeError> {
    for segment in segments {
        value = match segment {
            PathSegment::Member(name) => runtime::get_member(&value, name)?,
            PathSegment::Index(args) => runtime::get_index(&value, args)?,
        };
    }
    Ok(value)
}
