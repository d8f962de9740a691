//! Rimfax Layered Circuit Optimization
//!
//! Re-represents a flat circuit as a sequence of typed [`Layer`]s (reset,
//! rotation, interact, measure, ...) and applies algebraic rewrites that
//! preserve circuit semantics while reducing depth and gate count.
//!
//! # Overview
//!
//! - [`LayerCircuit::from_circuit`] groups a flat instruction stream into
//!   layers: TICKs open empty layers, repeat blocks recurse, measure-reset
//!   composites decompose, and classically-controlled Paulis normalize into
//!   feedback layers.
//! - Rewrite passes (`with_*` methods on [`LayerCircuit`]) each return a new
//!   layer circuit: local fusion of adjacent layers, deleting rotations that
//!   feed into resets, sliding rotation/measurement layers earlier, rolling
//!   rotations around loop boundaries, and peeling loop iterations.
//! - [`LayerCircuit::to_circuit`] serializes back, re-deriving TICKs from
//!   the layers' tick protocol.
//!
//! The per-qubit rotation algebra lives in [`rot::NamedRotation`]: the 24
//! single-qubit Clifford rotations with exact composition and inversion.
//!
//! # Example
//!
//! ```rust
//! use rimfax_ir::Circuit;
//! use rimfax_layers::LayerCircuit;
//!
//! let circuit: Circuit = "R 0\nTICK\nH 0\nTICK\nH 0\nTICK\nM 0".parse().unwrap();
//! let layered = LayerCircuit::from_circuit(&circuit).unwrap();
//! let optimized = layered
//!     .with_locally_optimized_layers()
//!     .with_irrelevant_tail_layers_removed();
//!
//! // The two Hadamards cancel and the TICKs re-derive from the layers.
//! assert_eq!(optimized.to_circuit().to_string(), "R 0\nTICK\nM 0");
//! ```

pub mod circuit;
pub mod error;
pub mod layers;
mod passes;
pub mod rot;

pub use circuit::LayerCircuit;
pub use error::{LayerError, LayerResult};
pub use layers::{
    DetObsAnnotationLayer, FeedbackLayer, ISwapLayer, InteractLayer, InteractSwapLayer, Layer,
    LayerKind, LoopLayer, MeasureLayer, MppLayer, NoiseLayer, QubitCoordAnnotationLayer,
    ResetLayer, RotationLayer, ShiftCoordAnnotationLayer, SqrtPPLayer, SwapLayer,
};
pub use rot::{NamedRotation, SignedPauli};
