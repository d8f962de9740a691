//! Rimfax Circuit Intermediate Representation
//!
//! This crate provides the data structures for representing quantum
//! error-correction circuits in stim's circuit language. It is the
//! foundation the Rimfax noise engine and layer rewriter build on.
//!
//! # Core Components
//!
//! - **Targets**: [`GateTarget`] for qubit, Pauli, measurement-record,
//!   sweep-bit and combiner operands; [`Pauli`] bases
//! - **Instructions**: [`Instruction`] combining a gate name with targets
//!   and parenthesized arguments
//! - **Circuits**: [`Circuit`] as an ordered sequence of instructions and
//!   nested [`RepeatBlock`]s, with deterministic text output and a parser
//!   for the same format
//! - **Gate registry**: [`gate_data`] answers classification queries
//!   (unitarity, arity, measurement/reset/noise status, argument ranges)
//!   for every supported gate name
//!
//! # Example
//!
//! ```rust
//! use rimfax_ir::{Circuit, GateTarget};
//!
//! let mut circuit: Circuit = "H 0\nTICK\nCX 0 1".parse().unwrap();
//! circuit.append("M", [GateTarget::Qubit(0), GateTarget::Qubit(1)], []).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.to_string(), "H 0\nTICK\nCX 0 1\nM 0 1");
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
mod parse;
pub mod target;

pub use circuit::{Circuit, CircuitItem, RepeatBlock};
pub use error::{IrError, IrResult};
pub use gate::{ANNOTATION_OPS, ArgRange, GateData, gate_data, is_annotation};
pub use instruction::Instruction;
pub use target::{GateTarget, Pauli};
