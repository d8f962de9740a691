//! Error types for noise instrumentation.

use rimfax_ir::IrError;
use thiserror::Error;

/// Errors that can occur while building or applying a noise model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoiseError {
    /// A probability argument was outside `[0, 1]`.
    #[error("not a probability: {value}")]
    InvalidProbability {
        /// The offending value.
        value: f64,
    },

    /// A tuple argument was not a list of disjoint probabilities.
    #[error("not a tuple of disjoint probabilities: {args:?}")]
    InvalidProbabilityTuple {
        /// The offending values.
        args: Vec<f64>,
    },

    /// A noise channel was given the wrong number of arguments.
    #[error("wrong number of arguments {got} for noise channel '{name}'")]
    WrongArgCount {
        /// Name of the channel.
        name: String,
        /// Actual argument count provided.
        got: usize,
    },

    /// A rule referenced a gate that is not a pure noise channel.
    #[error("not a pure noise channel: '{name}'")]
    NotANoiseChannel {
        /// The offending gate name.
        name: String,
    },

    /// Tick-boundary noise tried to flip measurement results.
    #[error("tick noise must not flip measurement results")]
    TickNoiseFlipsResults,

    /// `flip_result` was applied to an operation that produces no results.
    #[error("flip_result applied to an operation without measurement results: '{op}'")]
    FlipResultOnNonMeasurement {
        /// The offending operation.
        op: String,
    },

    /// `flip_result` was applied to a measurement that already carried an
    /// explicit probability argument.
    #[error("measurement already has arguments, cannot flip its result: '{op}'")]
    UnexpectedMeasurementArgs {
        /// The offending operation.
        op: String,
    },

    /// A qubit was operated on more than once inside one moment.
    #[error(
        "qubits were operated on multiple times without a TICK in between:\n\
         multiple uses: {qubits:?}\n\
         moment:\n{moment}"
    )]
    QubitCollision {
        /// The qubits used more than once, in ascending order.
        qubits: Vec<u32>,
        /// A dump of the offending moment.
        moment: String,
    },

    /// The model has neither a rule nor an explicit lack-of-noise for an op.
    #[error("no noise (or lack of noise) specified for '{op}'")]
    NoNoiseSpecified {
        /// The offending operation.
        op: String,
    },

    /// An operation the splitter or engine cannot classify.
    #[error("unsupported operation: '{op}'")]
    Unsupported {
        /// The offending operation.
        op: String,
    },

    /// The MPP-boundary carve-out left nothing to instrument.
    #[error("no instrumentable body between the MPP boundaries")]
    EmptyBody,

    /// An underlying IR failure.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for noise operations.
pub type NoiseResult<T> = Result<T, NoiseError>;
