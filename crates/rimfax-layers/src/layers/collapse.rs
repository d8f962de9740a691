//! Collapsing layers: resets and measurements.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use rimfax_ir::{CircuitItem, GateTarget, Instruction, Pauli};

use crate::rot::NamedRotation;
use crate::layers::unitary::RotationLayer;

/// Projective reinitialization of qubits, each in its own basis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetLayer {
    /// Reset basis per qubit.
    pub targets: BTreeMap<u32, Pauli>,
}

impl ResetLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.targets.keys().copied().collect()
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        let mut by_gate: BTreeMap<&'static str, Vec<GateTarget>> = BTreeMap::new();
        for (&qubit, &basis) in &self.targets {
            let name = match basis {
                Pauli::X => "RX",
                Pauli::Y => "RY",
                Pauli::Z => "R",
            };
            by_gate.entry(name).or_default().push(GateTarget::Qubit(qubit));
        }
        for (name, targets) in by_gate {
            out.push(CircuitItem::Instruction(Instruction::new(name, targets, [])));
        }
    }

    /// The Z-basis expansion: reset everything in Z, then rotate the qubits
    /// that wanted another basis.
    pub(crate) fn to_z_basis_parts(&self) -> Option<(ResetLayer, RotationLayer)> {
        if self.targets.values().all(|&b| b == Pauli::Z) {
            return None;
        }
        let mut rotations = RotationLayer::default();
        for (&qubit, &basis) in &self.targets {
            let rotation = NamedRotation::basis_change_to_z(basis);
            if !rotation.is_identity() {
                rotations.append_named_rotation(rotation, qubit);
            }
        }
        let reset = ResetLayer {
            targets: self.targets.keys().map(|&q| (q, Pauli::Z)).collect(),
        };
        Some((reset, rotations))
    }
}

/// Single-qubit measurements, in measurement-record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureLayer {
    /// Measured qubits, in record order.
    pub targets: Vec<u32>,
    /// Basis per measured qubit, parallel to `targets`.
    pub bases: Vec<Pauli>,
}

impl MeasureLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.targets.iter().copied().collect()
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        // Consecutive same-basis runs fuse into one instruction; grouping
        // more aggressively would reorder the measurement record.
        let mut run_start = 0;
        while run_start < self.targets.len() {
            let basis = self.bases[run_start];
            let mut run_end = run_start + 1;
            while run_end < self.targets.len() && self.bases[run_end] == basis {
                run_end += 1;
            }
            let name = match basis {
                Pauli::X => "MX",
                Pauli::Y => "MY",
                Pauli::Z => "M",
            };
            out.push(CircuitItem::Instruction(Instruction::new(
                name,
                self.targets[run_start..run_end]
                    .iter()
                    .map(|&q| GateTarget::Qubit(q)),
                [],
            )));
            run_start = run_end;
        }
    }

    /// The Z-basis expansion: surround the all-Z measurement with the
    /// appropriate basis-change rotations.
    pub(crate) fn to_z_basis_parts(&self) -> Option<(RotationLayer, MeasureLayer)> {
        if self.bases.iter().all(|&b| b == Pauli::Z) {
            return None;
        }
        let mut rotations = RotationLayer::default();
        for (&qubit, &basis) in self.targets.iter().zip(&self.bases) {
            let rotation = NamedRotation::basis_change_to_z(basis);
            if !rotation.is_identity() {
                rotations.append_named_rotation(rotation, qubit);
            }
        }
        let measure = MeasureLayer {
            targets: self.targets.clone(),
            bases: vec![Pauli::Z; self.bases.len()],
        };
        Some((rotations, measure))
    }
}

/// Joint Pauli-product measurements, in measurement-record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MppLayer {
    /// One entry per measured product; each product is a sequence of
    /// `(qubit, basis)` factors.
    pub products: Vec<Vec<(u32, Pauli)>>,
}

impl MppLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.products
            .iter()
            .flat_map(|product| product.iter().map(|&(q, _)| q))
            .collect()
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        if self.products.is_empty() {
            return;
        }
        let mut targets = Vec::new();
        for product in &self.products {
            for (k, &(qubit, basis)) in product.iter().enumerate() {
                if k > 0 {
                    targets.push(GateTarget::Combiner);
                }
                targets.push(GateTarget::pauli(basis, qubit));
            }
        }
        out.push(CircuitItem::Instruction(Instruction::new("MPP", targets, [])));
    }
}
