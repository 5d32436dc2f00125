//! Compiled fragments and the frame they evaluate against.
//!
//! A [`Fragment`] is the compiled form of one expression node: a closure over
//! already-compiled children plus the static type it produces. Fragments are
//! built once per argument shape and evaluated many times, each time against a
//! fresh [`Frame`] holding that invocation's arguments.

use std::fmt;
use std::sync::Arc;

use bindexpr_core::{MetadataContext, RuntimeError, TypeHash, Value, primitives};

use crate::shape::ShapeKey;

/// Per-invocation evaluation state.
///
/// `slots` holds the member arguments by index, and `metadata` is the
/// trailing metadata slot. `locals` holds the arguments of every enclosing
/// lambda, outermost first.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    slots: &'a [Value],
    metadata: Option<&'a MetadataContext>,
    locals: &'a [Value],
}

impl<'a> Frame<'a> {
    /// Frame over argument slots.
    pub fn new(slots: &'a [Value], metadata: Option<&'a MetadataContext>) -> Self {
        Self {
            slots,
            metadata,
            locals: &[],
        }
    }

    /// Same frame with lambda locals.
    pub fn with_locals(self, locals: &'a [Value]) -> Self {
        Self { locals, ..self }
    }

    /// All argument slots.
    pub fn slots(&self) -> &'a [Value] {
        self.slots
    }

    /// One argument slot; missing slots read as null.
    pub fn slot(&self, index: usize) -> Value {
        self.slots.get(index).cloned().unwrap_or_default()
    }

    /// Invocation metadata.
    pub fn metadata(&self) -> Option<&'a MetadataContext> {
        self.metadata
    }

    /// Lambda locals.
    pub fn locals(&self) -> &'a [Value] {
        self.locals
    }

    /// One lambda local; missing locals read as null.
    pub fn local(&self, index: usize) -> Value {
        self.locals.get(index).cloned().unwrap_or_default()
    }
}

type Eval = dyn Fn(&Frame<'_>) -> Result<Value, RuntimeError> + Send + Sync;

/// Compiled form of one expression node.
#[derive(Clone)]
pub struct Fragment {
    ty: TypeHash,
    constant: Option<Value>,
    eval: Arc<Eval>,
}

impl Fragment {
    /// Fragment producing a value of static type `ty`.
    ///
    /// Use [`primitives::OBJECT`] when the type is only known at runtime.
    pub fn new<F>(ty: TypeHash, eval: F) -> Self
    where
        F: Fn(&Frame<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            ty,
            constant: None,
            eval: Arc::new(eval),
        }
    }

    /// Fragment that always produces `value`.
    pub fn constant(value: Value) -> Self {
        let result = value.clone();
        Self {
            ty: value.type_hash(),
            constant: Some(value),
            eval: Arc::new(move |_| Ok(result.clone())),
        }
    }

    /// Static result type.
    pub fn ty(&self) -> TypeHash {
        self.ty
    }

    /// Whether the static result type is `ty`.
    pub fn has_type(&self, ty: TypeHash) -> bool {
        self.ty == ty
    }

    /// The value, if this fragment is a constant.
    pub fn as_constant(&self) -> Option<&Value> {
        self.constant.as_ref()
    }

    /// Evaluate against a frame.
    pub fn eval(&self, frame: &Frame<'_>) -> Result<Value, RuntimeError> {
        (self.eval)(frame)
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("ty", &self.ty)
            .field("constant", &self.constant)
            .finish_non_exhaustive()
    }
}

/// Fragment reading member slot `index`, coerced to the slot's declared type.
pub fn slot_fragment(index: usize, ty: TypeHash) -> Fragment {
    let static_ty = if ty.is_empty() { primitives::OBJECT } else { ty };
    Fragment::new(static_ty, move |frame| frame.slot(index).convert_to(ty))
}

/// Root fragment specialized for one argument shape.
#[derive(Debug, Clone)]
pub struct ShapeInvoker {
    shape: ShapeKey,
    root: Fragment,
}

impl ShapeInvoker {
    /// Wrap a compiled root.
    pub fn new(shape: ShapeKey, root: Fragment) -> Self {
        Self { shape, root }
    }

    /// The argument shape this invoker was built for.
    pub fn shape(&self) -> &ShapeKey {
        &self.shape
    }

    /// Static result type.
    pub fn result_type(&self) -> TypeHash {
        self.root.ty()
    }

    /// Evaluate against a frame.
    pub fn invoke(&self, frame: &Frame<'_>) -> Result<Value, RuntimeError> {
        self.root.eval(frame)
    }
}
