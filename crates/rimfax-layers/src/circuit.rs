//! Layered circuits: conversion between the flat IR and layer sequences.

use rustc_hash::FxHashSet;

use rimfax_ir::{Circuit, CircuitItem, GateTarget, Instruction, Pauli, gate_data};

use crate::error::{LayerError, LayerResult};
use crate::layers::{
    DetObsAnnotationLayer, FeedbackLayer, ISwapLayer, InteractLayer, InteractSwapLayer, Layer,
    LayerKind, LoopLayer, MeasureLayer, MppLayer, NoiseLayer, QubitCoordAnnotationLayer,
    ResetLayer, RotationLayer, ShiftCoordAnnotationLayer, SqrtPPLayer, SwapLayer,
};
use crate::rot::NamedRotation;

/// A circuit re-represented as a sequence of typed layers.
///
/// Layers group a moment's operations by kind; the rewrite passes in this
/// crate each return a new `LayerCircuit` rather than mutating in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerCircuit {
    /// The layer sequence.
    pub layers: Vec<Layer>,
}

macro_rules! feed_fn {
    ($name:ident, $kind:ident, $layer:ident) => {
        fn $name(&mut self) -> &mut $layer {
            self.feed(LayerKind::$kind, || Layer::$kind($layer::default()));
            match self.layers.last_mut() {
                Some(Layer::$kind(layer)) => layer,
                _ => unreachable!(),
            }
        }
    };
}

impl LayerCircuit {
    /// Create an empty layered circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layered circuit from a layer sequence.
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// All qubits touched by any layer.
    pub fn touched(&self) -> FxHashSet<u32> {
        let mut result = FxHashSet::default();
        for layer in &self.layers {
            result.extend(layer.touched());
        }
        result
    }

    /// Rewrite every collapsing layer into its Z-basis expansion.
    #[must_use]
    pub fn to_z_basis(&self) -> Self {
        Self {
            layers: self
                .layers
                .iter()
                .flat_map(Layer::to_z_basis)
                .collect(),
        }
    }

    // =========================================================================
    // Flat circuit -> layers
    // =========================================================================

    /// Build a layered circuit from a flat one.
    pub fn from_circuit(circuit: &Circuit) -> LayerResult<Self> {
        let mut result = Self::new();
        for item in circuit {
            match item {
                CircuitItem::Repeat(block) => {
                    result.layers.push(Layer::Loop(LoopLayer {
                        body: Self::from_circuit(&block.body)?,
                        repetitions: block.repetitions,
                    }));
                }
                CircuitItem::Instruction(op) => result.feed_instruction(op)?,
            }
        }
        Ok(result)
    }

    fn feed_instruction(&mut self, op: &Instruction) -> LayerResult<()> {
        match op.name.as_str() {
            "R" | "RZ" => self.feed_reset(Pauli::Z, op),
            "RX" => self.feed_reset(Pauli::X, op),
            "RY" => self.feed_reset(Pauli::Y, op),

            "M" | "MZ" => self.feed_m(Pauli::Z, op),
            "MX" => self.feed_m(Pauli::X, op),
            "MY" => self.feed_m(Pauli::Y, op),

            "MR" | "MRZ" => {
                self.feed_m(Pauli::Z, op)?;
                self.feed_reset(Pauli::Z, op)
            }
            "MRX" => {
                self.feed_m(Pauli::X, op)?;
                self.feed_reset(Pauli::X, op)
            }
            "MRY" => {
                self.feed_m(Pauli::Y, op)?;
                self.feed_reset(Pauli::Y, op)
            }

            "XCX" => self.feed_c(Pauli::X, Pauli::X, op),
            "XCY" => self.feed_c(Pauli::X, Pauli::Y, op),
            "XCZ" => self.feed_c(Pauli::X, Pauli::Z, op),
            "YCX" => self.feed_c(Pauli::Y, Pauli::X, op),
            "YCY" => self.feed_c(Pauli::Y, Pauli::Y, op),
            "YCZ" => self.feed_c(Pauli::Y, Pauli::Z, op),
            "CX" => self.feed_c(Pauli::Z, Pauli::X, op),
            "CY" => self.feed_c(Pauli::Z, Pauli::Y, op),
            "CZ" => self.feed_c(Pauli::Z, Pauli::Z, op),

            "QUBIT_COORDS" => self.feed_qubit_coords(op),
            "SHIFT_COORDS" => {
                self.feed_shift_coords_layer().offset_by(&op.args);
                Ok(())
            }
            "DETECTOR" | "OBSERVABLE_INCLUDE" | "MPAD" => {
                self.feed_det_obs_layer().instructions.push(op.clone());
                Ok(())
            }

            "ISWAP" | "ISWAP_DAG" => self.feed_iswap(op),
            "MPP" => self.feed_mpp(op),
            "SWAP" => self.feed_swap(op),
            "CXSWAP" => self.feed_interact_swap(Pauli::Z, Pauli::X, op),
            "SWAPCX" => self.feed_interact_swap(Pauli::X, Pauli::Z, op),

            "TICK" => {
                self.layers.push(Layer::Empty);
                Ok(())
            }

            "SQRT_XX" | "SQRT_XX_DAG" => self.feed_sqrt_pp(Pauli::X, op),
            "SQRT_YY" | "SQRT_YY_DAG" => self.feed_sqrt_pp(Pauli::Y, op),
            "SQRT_ZZ" | "SQRT_ZZ_DAG" => self.feed_sqrt_pp(Pauli::Z, op),

            _ => {
                let data = gate_data(&op.name)?;
                if data.is_unitary && data.is_single_qubit_gate {
                    self.feed_named_rotation(op)
                } else if data.is_noisy_gate && !data.produces_measurements {
                    self.feed_noise_layer().instructions.push(op.clone());
                    Ok(())
                } else {
                    Err(LayerError::UnsupportedInstruction(op.to_string()))
                }
            }
        }
    }

    /// Extend the last layer when it has the right kind, replace a trailing
    /// Empty layer, or open a new layer.
    fn feed(&mut self, kind: LayerKind, make: impl FnOnce() -> Layer) {
        match self.layers.last() {
            Some(Layer::Empty) => {
                self.layers.pop();
                self.layers.push(make());
            }
            Some(last) if last.kind() == kind => {}
            _ => self.layers.push(make()),
        }
    }

    feed_fn!(feed_reset_layer, Reset, ResetLayer);
    feed_fn!(feed_measure_layer, Measure, MeasureLayer);
    feed_fn!(feed_mpp_layer, Mpp, MppLayer);
    feed_fn!(feed_rotation_layer, Rotation, RotationLayer);
    feed_fn!(feed_interact_layer, Interact, InteractLayer);
    feed_fn!(feed_feedback_layer, Feedback, FeedbackLayer);
    feed_fn!(feed_swap_layer, Swap, SwapLayer);
    feed_fn!(feed_iswap_layer, ISwap, ISwapLayer);
    feed_fn!(feed_interact_swap_layer, InteractSwap, InteractSwapLayer);
    feed_fn!(feed_sqrt_pp_layer, SqrtPP, SqrtPPLayer);
    feed_fn!(feed_noise_layer, Noise, NoiseLayer);
    feed_fn!(feed_det_obs_layer, DetObs, DetObsAnnotationLayer);
    feed_fn!(feed_shift_coords_layer, ShiftCoords, ShiftCoordAnnotationLayer);
    feed_fn!(feed_qubit_coords_layer, QubitCoords, QubitCoordAnnotationLayer);

    fn qubit_targets_of(op: &Instruction) -> LayerResult<Vec<u32>> {
        op.targets
            .iter()
            .map(|t| {
                t.qubit_value()
                    .ok_or_else(|| LayerError::UnsupportedInstruction(op.to_string()))
            })
            .collect()
    }

    fn feed_reset(&mut self, basis: Pauli, op: &Instruction) -> LayerResult<()> {
        let qubits = Self::qubit_targets_of(op)?;
        let layer = self.feed_reset_layer();
        for q in qubits {
            layer.targets.insert(q, basis);
        }
        Ok(())
    }

    fn feed_m(&mut self, basis: Pauli, op: &Instruction) -> LayerResult<()> {
        let qubits = Self::qubit_targets_of(op)?;
        let layer = self.feed_measure_layer();
        for q in qubits {
            layer.bases.push(basis);
            layer.targets.push(q);
        }
        Ok(())
    }

    fn feed_mpp(&mut self, op: &Instruction) -> LayerResult<()> {
        let targets = &op.targets;
        let mut products = Vec::new();
        let mut start = 0;
        let mut end = 1;
        while start < targets.len() {
            while end < targets.len() && targets[end].is_combiner() {
                end += 2;
            }
            let mut product = Vec::new();
            let mut k = start;
            while k < end.min(targets.len()) {
                match (targets[k].qubit_value(), targets[k].pauli_basis()) {
                    (Some(qubit), Some(basis)) => product.push((qubit, basis)),
                    _ => return Err(LayerError::UnsupportedInstruction(op.to_string())),
                }
                k += 2;
            }
            products.push(product);
            start = end;
            end += 1;
        }
        self.feed_mpp_layer().products.extend(products);
        Ok(())
    }

    fn feed_qubit_coords(&mut self, op: &Instruction) -> LayerResult<()> {
        let qubits = Self::qubit_targets_of(op)?;
        let args = op.args.clone();
        let layer = self.feed_qubit_coords_layer();
        for q in qubits {
            if layer.coords.contains_key(&q) {
                return Err(LayerError::DuplicateQubitCoords(vec![q]));
            }
            layer.coords.insert(q, args.clone());
        }
        Ok(())
    }

    fn feed_named_rotation(&mut self, op: &Instruction) -> LayerResult<()> {
        let Some(rotation) = NamedRotation::from_name(&op.name) else {
            return Err(LayerError::UnsupportedInstruction(op.to_string()));
        };
        let qubits = Self::qubit_targets_of(op)?;
        let layer = self.feed_rotation_layer();
        for q in qubits {
            layer.append_named_rotation(rotation, q);
        }
        Ok(())
    }

    fn feed_swap(&mut self, op: &Instruction) -> LayerResult<()> {
        let qubits = Self::qubit_targets_of(op)?;
        if qubits.len() % 2 != 0 {
            return Err(LayerError::UnsupportedInstruction(op.to_string()));
        }
        let layer = self.feed_swap_layer();
        for pair in qubits.chunks_exact(2) {
            layer.targets1.push(pair[0]);
            layer.targets2.push(pair[1]);
        }
        Ok(())
    }

    fn feed_iswap(&mut self, op: &Instruction) -> LayerResult<()> {
        let qubits = Self::qubit_targets_of(op)?;
        if qubits.len() % 2 != 0 {
            return Err(LayerError::UnsupportedInstruction(op.to_string()));
        }
        let layer = self.feed_iswap_layer();
        for pair in qubits.chunks_exact(2) {
            layer.targets1.push(pair[0]);
            layer.targets2.push(pair[1]);
        }
        Ok(())
    }

    fn feed_interact_swap(
        &mut self,
        basis1: Pauli,
        basis2: Pauli,
        op: &Instruction,
    ) -> LayerResult<()> {
        let qubits = Self::qubit_targets_of(op)?;
        if qubits.len() % 2 != 0 {
            return Err(LayerError::UnsupportedInstruction(op.to_string()));
        }
        let layer = self.feed_interact_swap_layer();
        for pair in qubits.chunks_exact(2) {
            layer.i_layer.targets1.push(pair[0]);
            layer.i_layer.targets2.push(pair[1]);
            layer.i_layer.bases1.push(basis1);
            layer.i_layer.bases2.push(basis2);
            layer.swap_layer.targets1.push(pair[0]);
            layer.swap_layer.targets2.push(pair[1]);
        }
        Ok(())
    }

    fn feed_sqrt_pp(&mut self, basis: Pauli, op: &Instruction) -> LayerResult<()> {
        let qubits = Self::qubit_targets_of(op)?;
        if qubits.len() % 2 != 0 {
            return Err(LayerError::UnsupportedInstruction(op.to_string()));
        }
        let layer = self.feed_sqrt_pp_layer();
        for pair in qubits.chunks_exact(2) {
            layer.targets1.push(pair[0]);
            layer.targets2.push(pair[1]);
            layer.bases.push(basis);
        }
        Ok(())
    }

    fn feed_c(&mut self, basis1: Pauli, basis2: Pauli, op: &Instruction) -> LayerResult<()> {
        let targets = &op.targets;
        if targets.len() % 2 != 0 {
            return Err(LayerError::UnsupportedInstruction(op.to_string()));
        }
        let is_feedback = targets.iter().any(GateTarget::is_classical);
        if is_feedback {
            let mut entries = Vec::new();
            for pair in targets.chunks_exact(2) {
                let (mut control, mut target) = (pair[0], pair[1]);
                let basis = if target.is_classical() {
                    std::mem::swap(&mut control, &mut target);
                    basis1
                } else {
                    basis2
                };
                let qubit = target
                    .qubit_value()
                    .ok_or_else(|| LayerError::UnsupportedInstruction(op.to_string()))?;
                entries.push((control, qubit, basis));
            }
            let layer = self.feed_feedback_layer();
            for (control, qubit, basis) in entries {
                layer.controls.push(control);
                layer.targets.push(qubit);
                layer.bases.push(basis);
            }
        } else {
            let qubits = Self::qubit_targets_of(op)?;
            let layer = self.feed_interact_layer();
            for pair in qubits.chunks_exact(2) {
                layer.bases1.push(basis1);
                layer.bases2.push(basis2);
                layer.targets1.push(pair[0]);
                layer.targets2.push(pair[1]);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Layers -> flat circuit
    // =========================================================================

    /// Serialize back into a flat circuit, placing a TICK wherever a
    /// previous layer implied one and the next layer requires one.
    pub fn to_circuit(&self) -> Circuit {
        let mut items = Vec::new();
        let mut tick_coming = false;
        for layer in &self.layers {
            if tick_coming && layer.requires_tick_before() {
                items.push(CircuitItem::Instruction(Instruction::new("TICK", [], [])));
                tick_coming = false;
            }
            layer.append_into(&mut items);
            tick_coming |= layer.implies_eventual_tick_after();
        }
        Circuit::from_items(items)
    }
}
