//! Annotation and noise layers: metadata attached to a moment.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use rimfax_ir::{CircuitItem, GateTarget, Instruction};

/// Physical-layout annotations: per-qubit coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QubitCoordAnnotationLayer {
    /// Coordinate vector per qubit.
    pub coords: BTreeMap<u32, Vec<f64>>,
}

impl QubitCoordAnnotationLayer {
    /// Shift every recorded coordinate by an offset vector.
    pub fn offset_by(&mut self, offset: &[f64]) {
        for coord in self.coords.values_mut() {
            for (value, delta) in coord.iter_mut().zip(offset) {
                *value += delta;
            }
        }
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        for (&qubit, coord) in &self.coords {
            out.push(CircuitItem::Instruction(Instruction::new(
                "QUBIT_COORDS",
                [GateTarget::Qubit(qubit)],
                coord.iter().copied(),
            )));
        }
    }
}

/// Accumulated coordinate-offset annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftCoordAnnotationLayer {
    /// The offset vector.
    pub shift: Vec<f64>,
}

impl ShiftCoordAnnotationLayer {
    /// Accumulate another offset vector, growing the stored one as needed.
    pub fn offset_by(&mut self, offset: &[f64]) {
        while self.shift.len() < offset.len() {
            self.shift.push(0.0);
        }
        for (value, delta) in self.shift.iter_mut().zip(offset) {
            *value += delta;
        }
    }

    pub(crate) fn is_vacuous(&self) -> bool {
        self.shift.iter().all(|&x| x == 0.0)
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        out.push(CircuitItem::Instruction(Instruction::new(
            "SHIFT_COORDS",
            [],
            self.shift.iter().copied(),
        )));
    }
}

/// Detector/observable metadata, embedded as raw annotation instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetObsAnnotationLayer {
    /// The embedded annotation instructions, in order.
    pub instructions: Vec<Instruction>,
}

impl DetObsAnnotationLayer {
    /// Shift every measurement-record back-reference by `delta`.
    #[must_use]
    pub fn with_rec_targets_shifted_by(&self, delta: i32) -> Self {
        Self {
            instructions: self
                .instructions
                .iter()
                .map(|inst| shift_rec_targets(inst, delta))
                .collect(),
        }
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        for inst in &self.instructions {
            out.push(CircuitItem::Instruction(inst.clone()));
        }
    }
}

/// Inserted noise channels, embedded as raw instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoiseLayer {
    /// The embedded noise instructions, in order.
    pub instructions: Vec<Instruction>,
}

impl NoiseLayer {
    pub(crate) fn touched(&self) -> FxHashSet<u32> {
        self.instructions
            .iter()
            .flat_map(Instruction::qubit_values)
            .collect()
    }

    pub(crate) fn append_into(&self, out: &mut Vec<CircuitItem>) {
        for inst in &self.instructions {
            out.push(CircuitItem::Instruction(inst.clone()));
        }
    }
}

pub(crate) fn shift_rec_targets(inst: &Instruction, delta: i32) -> Instruction {
    Instruction::new(
        inst.name.clone(),
        inst.targets.iter().map(|t| match t {
            GateTarget::Rec(k) => GateTarget::Rec(k + delta),
            other => *other,
        }),
        inst.args.iter().copied(),
    )
}
