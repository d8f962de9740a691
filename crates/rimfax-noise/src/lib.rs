//! Rimfax Noise Instrumentation
//!
//! Rewrites a noiseless circuit into an equivalent circuit with calibrated
//! physical-noise channels inserted around each operation, according to a
//! configurable [`NoiseModel`].
//!
//! # Overview
//!
//! The transformation works moment by moment (a moment is the interval
//! between two TICKs):
//!
//! 1. The [moment splitter](split::split_op_moments) partitions the circuit
//!    and breaks composite operations into independently noisable pieces
//!    (one piece per Pauli product of a joint measurement, classical-control
//!    pairs away from quantum pairs, per-target pieces around immune qubits).
//! 2. For every split operation the model selects a [`NoiseRule`] (by gate
//!    name, Clifford arity, or measured basis) describing the channels to
//!    apply before and after the moment and whether the measurement result
//!    flips.
//! 3. Idle qubits pick up depolarization, moments containing collapsing
//!    operations add extra waiting noise, and tick boundaries carry the
//!    model's tick noise.
//!
//! Immune qubits never receive noise. Qubit collisions inside one moment are
//! rejected unless explicitly allowed.
//!
//! # Example
//!
//! ```rust
//! use rimfax_ir::Circuit;
//! use rimfax_noise::NoiseModel;
//!
//! let circuit: Circuit = "H 0\nTICK\nM 0".parse().unwrap();
//! let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
//! let noisy = model.noisy_circuit(&circuit, None, None).unwrap();
//!
//! assert_eq!(
//!     noisy.to_string(),
//!     "H 0\nDEPOLARIZE1(0.001) 0\nTICK\nM(0.001) 0\nDEPOLARIZE1(0.001) 0"
//! );
//! ```

pub mod engine;
pub mod error;
pub mod model;
pub mod rule;
pub mod split;

pub use error::{NoiseError, NoiseResult};
pub use model::NoiseModel;
pub use rule::{NoiseArg, NoiseRule, NoiseRuleBuilder};
pub use split::{MomentItem, occurs_in_classical_control_system, split_op_moments};
