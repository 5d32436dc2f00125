//! Unified error types for binding expressions.
//!
//! One error type per phase of the pipeline, plus a top-level wrapper:
//!
//! ```text
//! BindExprError (top-level wrapper)
//! ├── ResolveError     - member expression rewriting (macros, types, resources)
//! ├── CompilationError - symbol table construction and fragment building
//! └── RuntimeError     - invocation of a compiled expression
//! ```
//!
//! Every failure is fatal to the current call. Nothing here retries or
//! recovers; callers decide whether to log, ignore, or fail the binding.

use thiserror::Error;

// ============================================================================
// Resolve Errors
// ============================================================================

/// Errors raised while rewriting member expressions into binding members.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// A macro names neither a known type nor a known resource.
    #[error("cannot resolve member: unknown macro '${name}'")]
    UnknownMacro {
        /// The macro name without the `$` prefix.
        name: String,
    },

    /// A macro chain cannot be flattened into a member path.
    #[error("cannot resolve member expression `{expression}`")]
    CannotFlatten {
        /// Display form of the offending expression.
        expression: String,
    },

    /// Folding a static (`$$`) expression failed.
    #[error("cannot evaluate static expression `{expression}`: {message}")]
    StaticEvaluation {
        /// Display form of the static expression.
        expression: String,
        /// Why evaluation failed.
        message: String,
    },
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors raised while constructing or building a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// A binding member reached the compiler without a valid index.
    #[error("cannot compile expression: binding member '{path}' has invalid index {index}")]
    UnresolvedMember {
        /// Path of the offending member.
        path: String,
        /// The index it carried.
        index: i32,
    },

    /// No builder (and no fallback entry) could translate a node.
    #[error("cannot compile expression `{expression}`")]
    CannotCompile {
        /// Display form of the node.
        expression: String,
    },

    /// Every registered compile strategy declined the expression.
    #[error("cannot compile expression `{expression}`: no compile strategy accepted it")]
    NoStrategy {
        /// Display form of the root node.
        expression: String,
    },

    /// Operand types are statically known to be incompatible.
    #[error("cannot compile expression `{expression}`: {message}")]
    TypeMismatch {
        /// Display form of the node.
        expression: String,
        /// Description of the mismatch.
        message: String,
    },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while invoking a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// The caller supplied the wrong number of arguments.
    #[error("expected {expected} argument(s), got {got}")]
    ArgumentCount {
        /// Number of binding members.
        expected: usize,
        /// Number of supplied arguments.
        got: usize,
    },

    /// A value had an unexpected type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: String,
        /// The actual type.
        actual: String,
    },

    /// A member, method, or indexer was used on null.
    #[error("null reference: cannot access '{member}' on null")]
    NullReference {
        /// The member being accessed.
        member: String,
    },

    /// An object has no such member.
    #[error("unknown member '{member}' on type '{type_name}'")]
    UnknownMember {
        /// Member name.
        member: String,
        /// Type that was searched.
        type_name: String,
    },

    /// An object has no such method.
    #[error("unknown method '{method}' on type '{type_name}'")]
    UnknownMethod {
        /// Method name.
        method: String,
        /// Type that was searched.
        type_name: String,
    },

    /// An index was outside the bounds of a list or string.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: i64,
        /// Length of the indexed value.
        len: usize,
    },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An operator is not defined for the operand values.
    #[error("operator '{op}' is not defined for {left} and {right}")]
    NoOperator {
        /// The operator symbol.
        op: String,
        /// Left operand type.
        left: String,
        /// Right operand type.
        right: String,
    },

    /// Error reported by a host object.
    #[error("{message}")]
    Host {
        /// The host's message.
        message: String,
    },
}

impl RuntimeError {
    /// Create a host error from any displayable message.
    pub fn host(message: impl Into<String>) -> Self {
        RuntimeError::Host {
            message: message.into(),
        }
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for binding expression operations.
///
/// Each variant uses `#[from]` so phase errors convert with `?`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindExprError {
    /// A member resolution error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A compilation error.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl BindExprError {
    /// Check if this is a member resolution error.
    pub fn is_resolve(&self) -> bool {
        matches!(self, BindExprError::Resolve(_))
    }

    /// Check if this is a compilation error.
    pub fn is_compilation(&self) -> bool {
        matches!(self, BindExprError::Compilation(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, BindExprError::Runtime(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::UnknownMacro {
            name: "Missing".into(),
        };
        assert_eq!(
            format!("{err}"),
            "cannot resolve member: unknown macro '$Missing'"
        );
    }

    #[test]
    fn compilation_error_display() {
        let err = CompilationError::CannotCompile {
            expression: "$target".into(),
        };
        assert_eq!(format!("{err}"), "cannot compile expression `$target`");

        let err = CompilationError::UnresolvedMember {
            path: "Name".into(),
            index: -1,
        };
        assert!(format!("{err}").contains("invalid index -1"));
    }

    #[test]
    fn runtime_error_display() {
        let err = RuntimeError::ArgumentCount {
            expected: 2,
            got: 1,
        };
        assert_eq!(format!("{err}"), "expected 2 argument(s), got 1");
        assert_eq!(format!("{}", RuntimeError::host("boom")), "boom");
    }

    #[test]
    fn unified_error_is_transparent() {
        let err: BindExprError = RuntimeError::DivisionByZero.into();
        assert!(err.is_runtime());
        assert!(!err.is_compilation());
        assert_eq!(format!("{err}"), "division by zero");

        let err: BindExprError = ResolveError::CannotFlatten {
            expression: "$(1)".into(),
        }
        .into();
        assert!(err.is_resolve());
    }
}
