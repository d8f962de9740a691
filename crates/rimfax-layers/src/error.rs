//! Error types for the layers crate.

use rimfax_ir::IrError;
use thiserror::Error;

/// Errors that can occur while building or rewriting layered circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LayerError {
    /// A qubit received coordinates more than once.
    #[error("qubit coords specified twice for qubit(s) {0:?}")]
    DuplicateQubitCoords(Vec<u32>),

    /// Qubit coordinate annotations cannot move across a loop boundary.
    #[error("cannot move qubit coordinate annotations across a loop")]
    CoordsAcrossLoop,

    /// An instruction the layered representation cannot express.
    #[error("unsupported instruction in layered circuit: '{0}'")]
    UnsupportedInstruction(String),

    /// An underlying IR failure.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;
