//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Gate name not present in the registry.
    #[error("unknown gate: '{0}'")]
    UnknownGate(String),

    /// Parenthesized argument count outside the gate's declared range.
    #[error("gate '{name}' takes {min}..={max} parens arguments, got {got}")]
    ArgCountMismatch {
        /// Name of the gate.
        name: String,
        /// Minimum allowed argument count.
        min: usize,
        /// Maximum allowed argument count.
        max: usize,
        /// Actual argument count provided.
        got: usize,
    },

    /// Malformed circuit text.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based source line of the failure.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
