//! Unitary layers: rotations, two-qubit interactions, swaps and feedback.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use rimfax_ir::{CircuitItem, GateTarget, Instruction, Pauli};

use crate::rot::NamedRotation;

/// Named single-qubit rotations, one per qubit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotationLayer {
    /// The rotation applied to each qubit. Entries may be identity.
    pub named_rotations: BTreeMap<u32, NamedRotation>,
}

impl RotationLayer {
    /// Compose a rotation onto a qubit, applied after what is already there.
    pub fn append_named_rotation(&mut self, rotation: NamedRotation, qubit: u32) {
        let entry = self
            .named_rotations
            .entry(qubit)
            .or_insert(NamedRotation::I);
        *entry = entry.then(rotation);
    }

    /// Compose a rotation onto a qubit, applied before what is already there.
    pub fn prepend_named_rotation(&mut self, rotation: NamedRotation, qubit: u32) {
        let entry = self
            .named_rotations
            .entry(qubit)
            .or_insert(NamedRotation::I);
        *entry = rotation.then(*entry);
    }

    /// Per-qubit inverse of every rotation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            named_rotations: self
                .named_rotations
                .iter()
                .map(|(&q, r)| (q, r.inverse()))
                .collect(),
        }
    }

    /// Qubits with a non-identity rotation.
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.named_rotations
            .iter()
            .filter(|(_, r)| !r.is_identity())
            .map(|(&q, _)| q)
            .collect()
    }

    pub(crate) fn is_vacuous(&self) -> bool {
        self.named_rotations.values().all(|r| r.is_identity())
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        let mut by_gate: BTreeMap<&'static str, Vec<GateTarget>> = BTreeMap::new();
        for (&qubit, rotation) in &self.named_rotations {
            if !rotation.is_identity() {
                by_gate
                    .entry(rotation.name())
                    .or_default()
                    .push(GateTarget::Qubit(qubit));
            }
        }
        for (name, targets) in by_gate {
            out.push(CircuitItem::Instruction(Instruction::new(name, targets, [])));
        }
    }
}

pub(crate) fn interact_gate_name(basis1: Pauli, basis2: Pauli) -> &'static str {
    match (basis1, basis2) {
        (Pauli::X, Pauli::X) => "XCX",
        (Pauli::X, Pauli::Y) => "XCY",
        (Pauli::X, Pauli::Z) => "XCZ",
        (Pauli::Y, Pauli::X) => "YCX",
        (Pauli::Y, Pauli::Y) => "YCY",
        (Pauli::Y, Pauli::Z) => "YCZ",
        (Pauli::Z, Pauli::X) => "CX",
        (Pauli::Z, Pauli::Y) => "CY",
        (Pauli::Z, Pauli::Z) => "CZ",
    }
}

/// Two-qubit Clifford interactions, parameterized by the Pauli basis each
/// side interacts through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractLayer {
    /// First qubit of each pair.
    pub targets1: Vec<u32>,
    /// Second qubit of each pair.
    pub targets2: Vec<u32>,
    /// Basis on the first side of each pair.
    pub bases1: Vec<Pauli>,
    /// Basis on the second side of each pair.
    pub bases2: Vec<Pauli>,
}

impl InteractLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.targets1.iter().chain(&self.targets2).copied().collect()
    }

    pub(crate) fn is_vacuous(&self) -> bool {
        self.targets1.is_empty()
    }

    pub(crate) fn concat(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.targets1.extend_from_slice(&other.targets1);
        merged.targets2.extend_from_slice(&other.targets2);
        merged.bases1.extend_from_slice(&other.bases1);
        merged.bases2.extend_from_slice(&other.bases2);
        merged
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        let mut by_gate: BTreeMap<&'static str, Vec<GateTarget>> = BTreeMap::new();
        for k in 0..self.targets1.len() {
            let name = interact_gate_name(self.bases1[k], self.bases2[k]);
            let pair = by_gate.entry(name).or_default();
            pair.push(GateTarget::Qubit(self.targets1[k]));
            pair.push(GateTarget::Qubit(self.targets2[k]));
        }
        for (name, targets) in by_gate {
            out.push(CircuitItem::Instruction(Instruction::new(name, targets, [])));
        }
    }
}

/// Classically-controlled Paulis: the control side is a measurement record
/// or sweep bit, the target side is a qubit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackLayer {
    /// Classical control of each pair (`rec[-k]` or `sweep[k]`).
    pub controls: Vec<GateTarget>,
    /// Controlled qubit of each pair.
    pub targets: Vec<u32>,
    /// The Pauli applied to each controlled qubit.
    pub bases: Vec<Pauli>,
}

impl FeedbackLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.targets.iter().copied().collect()
    }

    pub(crate) fn concat(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.controls.extend_from_slice(&other.controls);
        merged.targets.extend_from_slice(&other.targets);
        merged.bases.extend_from_slice(&other.bases);
        merged
    }

    /// Shift every measurement-record control by `delta`.
    #[must_use]
    pub fn with_rec_targets_shifted_by(&self, delta: i32) -> Self {
        Self {
            controls: self
                .controls
                .iter()
                .map(|control| match control {
                    GateTarget::Rec(k) => GateTarget::Rec(k + delta),
                    other => *other,
                })
                .collect(),
            targets: self.targets.clone(),
            bases: self.bases.clone(),
        }
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        let mut by_gate: BTreeMap<&'static str, Vec<GateTarget>> = BTreeMap::new();
        for k in 0..self.targets.len() {
            let name = match self.bases[k] {
                Pauli::X => "CX",
                Pauli::Y => "CY",
                Pauli::Z => "CZ",
            };
            let pair = by_gate.entry(name).or_default();
            pair.push(self.controls[k]);
            pair.push(GateTarget::Qubit(self.targets[k]));
        }
        for (name, targets) in by_gate {
            out.push(CircuitItem::Instruction(Instruction::new(name, targets, [])));
        }
    }
}

/// SWAP gates on qubit pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwapLayer {
    /// First qubit of each pair.
    pub targets1: Vec<u32>,
    /// Second qubit of each pair.
    pub targets2: Vec<u32>,
}

impl SwapLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.targets1.iter().chain(&self.targets2).copied().collect()
    }

    pub(crate) fn concat(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.targets1.extend_from_slice(&other.targets1);
        merged.targets2.extend_from_slice(&other.targets2);
        merged
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        if self.targets1.is_empty() {
            return;
        }
        let mut targets = Vec::new();
        for (&a, &b) in self.targets1.iter().zip(&self.targets2) {
            targets.push(GateTarget::Qubit(a));
            targets.push(GateTarget::Qubit(b));
        }
        out.push(CircuitItem::Instruction(Instruction::new("SWAP", targets, [])));
    }
}

/// iSWAP / iSWAP† gates on qubit pairs (the sign is absorbed).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ISwapLayer {
    /// First qubit of each pair.
    pub targets1: Vec<u32>,
    /// Second qubit of each pair.
    pub targets2: Vec<u32>,
}

impl ISwapLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.targets1.iter().chain(&self.targets2).copied().collect()
    }

    pub(crate) fn concat(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.targets1.extend_from_slice(&other.targets1);
        merged.targets2.extend_from_slice(&other.targets2);
        merged
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        if self.targets1.is_empty() {
            return;
        }
        let mut targets = Vec::new();
        for (&a, &b) in self.targets1.iter().zip(&self.targets2) {
            targets.push(GateTarget::Qubit(a));
            targets.push(GateTarget::Qubit(b));
        }
        out.push(CircuitItem::Instruction(Instruction::new("ISWAP", targets, [])));
    }
}

/// Fused interact-then-swap pairs (CXSWAP / SWAPCX).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractSwapLayer {
    /// The interaction half.
    pub i_layer: InteractLayer,
    /// The swap half.
    pub swap_layer: SwapLayer,
}

impl InteractSwapLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        let mut touched = self.i_layer.touched();
        touched.extend(self.swap_layer.touched());
        touched
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        let mut by_gate: BTreeMap<&'static str, Vec<GateTarget>> = BTreeMap::new();
        for k in 0..self.i_layer.targets1.len() {
            let name = match (self.i_layer.bases1[k], self.i_layer.bases2[k]) {
                (Pauli::Z, Pauli::X) => "CXSWAP",
                (Pauli::X, Pauli::Z) => "SWAPCX",
                other => unreachable!("interact-swap pairs carry (Z,X) or (X,Z) bases, not {other:?}"),
            };
            let pair = by_gate.entry(name).or_default();
            pair.push(GateTarget::Qubit(self.i_layer.targets1[k]));
            pair.push(GateTarget::Qubit(self.i_layer.targets2[k]));
        }
        for (name, targets) in by_gate {
            out.push(CircuitItem::Instruction(Instruction::new(name, targets, [])));
        }
    }
}

/// Square roots of two-qubit Pauli products (√XX, √YY, √ZZ; signs absorbed).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqrtPPLayer {
    /// First qubit of each pair.
    pub targets1: Vec<u32>,
    /// Second qubit of each pair.
    pub targets2: Vec<u32>,
    /// The Pauli product basis of each pair.
    pub bases: Vec<Pauli>,
}

impl SqrtPPLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.targets1.iter().chain(&self.targets2).copied().collect()
    }

    pub(crate) fn concat(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.targets1.extend_from_slice(&other.targets1);
        merged.targets2.extend_from_slice(&other.targets2);
        merged.bases.extend_from_slice(&other.bases);
        merged
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        let mut by_gate: BTreeMap<&'static str, Vec<GateTarget>> = BTreeMap::new();
        for k in 0..self.targets1.len() {
            let name = match self.bases[k] {
                Pauli::X => "SQRT_XX",
                Pauli::Y => "SQRT_YY",
                Pauli::Z => "SQRT_ZZ",
            };
            let pair = by_gate.entry(name).or_default();
            pair.push(GateTarget::Qubit(self.targets1[k]));
            pair.push(GateTarget::Qubit(self.targets2[k]));
        }
        for (name, targets) in by_gate {
            out.push(CircuitItem::Instruction(Instruction::new(name, targets, [])));
        }
    }
}
