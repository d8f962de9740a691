//! The closed set of layer variants and their shared contract.
//!
//! A layer is a grouped-by-kind contiguous slice of a moment; the unit the
//! rewriter passes operate on. Every variant answers the same questions:
//! which qubits it touches, whether it is vacuous, how it fuses with a
//! neighbor, how it expands to Z basis, and how it serializes back into a
//! flat circuit.

pub mod annotation;
pub mod collapse;
pub mod unitary;

use rustc_hash::FxHashSet;

use rimfax_ir::{Circuit, CircuitItem, Instruction, RepeatBlock};

use crate::circuit::LayerCircuit;
pub use annotation::{
    DetObsAnnotationLayer, NoiseLayer, QubitCoordAnnotationLayer, ShiftCoordAnnotationLayer,
};
pub use collapse::{MeasureLayer, MppLayer, ResetLayer};
pub use unitary::{
    FeedbackLayer, ISwapLayer, InteractLayer, InteractSwapLayer, RotationLayer, SqrtPPLayer,
    SwapLayer,
};

/// A repeat block over a layered body.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopLayer {
    /// The repeated layer sequence.
    pub body: LayerCircuit,
    /// How many times the body runs.
    pub repetitions: u64,
}

/// The kind of a layer, used by kind-parameterized passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Empty,
    QubitCoords,
    ShiftCoords,
    DetObs,
    Reset,
    Measure,
    Mpp,
    Rotation,
    Interact,
    Feedback,
    Swap,
    ISwap,
    InteractSwap,
    SqrtPP,
    Noise,
    Loop,
}

/// One layer of a layered circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// Placeholder between TICKs.
    Empty,
    /// Physical-layout annotations.
    QubitCoords(QubitCoordAnnotationLayer),
    /// Accumulated coordinate offsets.
    ShiftCoords(ShiftCoordAnnotationLayer),
    /// Detector/observable metadata.
    DetObs(DetObsAnnotationLayer),
    /// Projective reinitialization.
    Reset(ResetLayer),
    /// Single-qubit measurements.
    Measure(MeasureLayer),
    /// Joint Pauli-product measurements.
    Mpp(MppLayer),
    /// Named single-qubit rotations.
    Rotation(RotationLayer),
    /// Two-qubit Clifford interactions.
    Interact(InteractLayer),
    /// Classically-controlled Paulis.
    Feedback(FeedbackLayer),
    /// SWAP gates.
    Swap(SwapLayer),
    /// iSWAP gates.
    ISwap(ISwapLayer),
    /// Fused CXSWAP/SWAPCX pairs.
    InteractSwap(InteractSwapLayer),
    /// Square roots of two-qubit Pauli products.
    SqrtPP(SqrtPPLayer),
    /// Inserted noise channels.
    Noise(NoiseLayer),
    /// A repeat block.
    Loop(LoopLayer),
}

impl Layer {
    /// The layer's kind.
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Empty => LayerKind::Empty,
            Layer::QubitCoords(_) => LayerKind::QubitCoords,
            Layer::ShiftCoords(_) => LayerKind::ShiftCoords,
            Layer::DetObs(_) => LayerKind::DetObs,
            Layer::Reset(_) => LayerKind::Reset,
            Layer::Measure(_) => LayerKind::Measure,
            Layer::Mpp(_) => LayerKind::Mpp,
            Layer::Rotation(_) => LayerKind::Rotation,
            Layer::Interact(_) => LayerKind::Interact,
            Layer::Feedback(_) => LayerKind::Feedback,
            Layer::Swap(_) => LayerKind::Swap,
            Layer::ISwap(_) => LayerKind::ISwap,
            Layer::InteractSwap(_) => LayerKind::InteractSwap,
            Layer::SqrtPP(_) => LayerKind::SqrtPP,
            Layer::Noise(_) => LayerKind::Noise,
            Layer::Loop(_) => LayerKind::Loop,
        }
    }

    /// The qubits this layer acts on.
    pub fn touched(&self) -> FxHashSet<u32> {
        match self {
            Layer::Empty | Layer::QubitCoords(_) | Layer::ShiftCoords(_) | Layer::DetObs(_) => {
                FxHashSet::default()
            }
            Layer::Reset(l) => l.touched(),
            Layer::Measure(l) => l.touched(),
            Layer::Mpp(l) => l.touched(),
            Layer::Rotation(l) => l.touched(),
            Layer::Interact(l) => l.touched(),
            Layer::Feedback(l) => l.touched(),
            Layer::Swap(l) => l.touched(),
            Layer::ISwap(l) => l.touched(),
            Layer::InteractSwap(l) => l.touched(),
            Layer::SqrtPP(l) => l.touched(),
            Layer::Noise(l) => l.touched(),
            Layer::Loop(l) => l.body.touched(),
        }
    }

    /// Check if the layer has no effect and can be dropped.
    pub fn is_vacuous(&self) -> bool {
        match self {
            Layer::Empty => true,
            Layer::QubitCoords(l) => l.coords.is_empty(),
            Layer::ShiftCoords(l) => l.is_vacuous(),
            Layer::DetObs(l) => l.instructions.is_empty(),
            Layer::Reset(l) => l.targets.is_empty(),
            Layer::Measure(l) => l.targets.is_empty(),
            Layer::Mpp(l) => l.products.is_empty(),
            Layer::Rotation(l) => l.is_vacuous(),
            Layer::Interact(l) => l.is_vacuous(),
            Layer::Feedback(l) => l.targets.is_empty(),
            Layer::Swap(l) => l.targets1.is_empty(),
            Layer::ISwap(l) => l.targets1.is_empty(),
            Layer::InteractSwap(l) => {
                l.i_layer.targets1.is_empty() && l.swap_layer.targets1.is_empty()
            }
            Layer::SqrtPP(l) => l.targets1.is_empty(),
            Layer::Noise(l) => l.instructions.is_empty(),
            Layer::Loop(l) => l.repetitions == 0 || l.body.layers.is_empty(),
        }
    }

    /// Whether serialization must place a TICK before this layer when a
    /// previous layer implied one.
    pub fn requires_tick_before(&self) -> bool {
        !matches!(
            self,
            Layer::Empty
                | Layer::QubitCoords(_)
                | Layer::ShiftCoords(_)
                | Layer::DetObs(_)
                | Layer::Noise(_)
        )
    }

    /// Whether this layer eventually forces a TICK before the next physical
    /// layer. Loops carry their separating TICK inside the serialized body.
    pub fn implies_eventual_tick_after(&self) -> bool {
        !matches!(
            self,
            Layer::Empty
                | Layer::QubitCoords(_)
                | Layer::ShiftCoords(_)
                | Layer::DetObs(_)
                | Layer::Noise(_)
                | Layer::Loop(_)
        )
    }

    /// The optimal fusion of `self` with the following layer (`None` when
    /// `self` is last). Returns zero, one, or two layers.
    pub fn locally_optimized(&self, next: Option<&Layer>) -> Vec<Layer> {
        match (self, next) {
            (Layer::Empty, Some(next)) => vec![next.clone()],
            (Layer::Empty, None) => vec![],

            (Layer::Rotation(first), Some(Layer::Rotation(second))) => {
                let mut merged = first.clone();
                for (&qubit, &rotation) in &second.named_rotations {
                    merged.append_named_rotation(rotation, qubit);
                }
                vec![Layer::Rotation(merged)]
            }
            (Layer::Rotation(first), None) => {
                if first.is_vacuous() {
                    vec![]
                } else {
                    vec![self.clone()]
                }
            }

            (Layer::Reset(first), Some(Layer::Reset(second))) => {
                let mut merged = first.clone();
                merged.targets.extend(second.targets.iter().map(|(&q, &b)| (q, b)));
                vec![Layer::Reset(merged)]
            }

            (Layer::Measure(first), Some(Layer::Measure(second))) => {
                let first_set: FxHashSet<u32> = first.targets.iter().copied().collect();
                if second.targets.iter().any(|q| first_set.contains(q)) {
                    self.default_fusion(next)
                } else {
                    let mut merged = first.clone();
                    merged.targets.extend_from_slice(&second.targets);
                    merged.bases.extend_from_slice(&second.bases);
                    vec![Layer::Measure(merged)]
                }
            }

            (Layer::Mpp(first), Some(Layer::Mpp(second))) => {
                if first.touched().is_disjoint(&second.touched()) {
                    let mut merged = first.clone();
                    merged.products.extend_from_slice(&second.products);
                    vec![Layer::Mpp(merged)]
                } else {
                    self.default_fusion(next)
                }
            }

            (Layer::Interact(first), Some(Layer::Interact(second))) => {
                if first.touched().is_disjoint(&second.touched()) {
                    vec![Layer::Interact(first.concat(second))]
                } else {
                    self.default_fusion(next)
                }
            }

            (Layer::Swap(first), Some(Layer::Swap(second))) => {
                if first.touched().is_disjoint(&second.touched()) {
                    vec![Layer::Swap(first.concat(second))]
                } else {
                    self.default_fusion(next)
                }
            }

            (Layer::ISwap(first), Some(Layer::ISwap(second))) => {
                if first.touched().is_disjoint(&second.touched()) {
                    vec![Layer::ISwap(first.concat(second))]
                } else {
                    self.default_fusion(next)
                }
            }

            (Layer::SqrtPP(first), Some(Layer::SqrtPP(second))) => {
                if first.touched().is_disjoint(&second.touched()) {
                    vec![Layer::SqrtPP(first.concat(second))]
                } else {
                    self.default_fusion(next)
                }
            }

            (Layer::Feedback(first), Some(Layer::Feedback(second))) => {
                vec![Layer::Feedback(first.concat(second))]
            }

            (Layer::Noise(first), Some(Layer::Noise(second))) => {
                let mut merged = first.clone();
                merged.instructions.extend_from_slice(&second.instructions);
                vec![Layer::Noise(merged)]
            }

            (Layer::DetObs(first), Some(Layer::DetObs(second))) => {
                let mut merged = first.clone();
                merged.instructions.extend_from_slice(&second.instructions);
                vec![Layer::DetObs(merged)]
            }

            (Layer::ShiftCoords(first), Some(Layer::ShiftCoords(second))) => {
                let mut merged = first.clone();
                merged.offset_by(&second.shift);
                vec![Layer::ShiftCoords(merged)]
            }

            (Layer::Loop(l), _) => {
                let optimized = Layer::Loop(LoopLayer {
                    body: l.body.with_locally_optimized_layers(),
                    repetitions: l.repetitions,
                });
                optimized.default_fusion(next)
            }

            _ => self.default_fusion(next),
        }
    }

    fn default_fusion(&self, next: Option<&Layer>) -> Vec<Layer> {
        let mut result = vec![self.clone()];
        if let Some(next) = next {
            result.push(next.clone());
        }
        result
    }

    /// Rewrite the layer so collapsing operations happen in the Z basis,
    /// surrounded by the appropriate basis changes.
    pub fn to_z_basis(&self) -> Vec<Layer> {
        match self {
            Layer::Reset(l) => match l.to_z_basis_parts() {
                Some((reset, rotations)) => {
                    vec![Layer::Reset(reset), Layer::Rotation(rotations)]
                }
                None => vec![self.clone()],
            },
            Layer::Measure(l) => match l.to_z_basis_parts() {
                Some((rotations, measure)) => vec![
                    Layer::Rotation(rotations.clone()),
                    Layer::Measure(measure),
                    Layer::Rotation(rotations),
                ],
                None => vec![self.clone()],
            },
            Layer::Loop(l) => vec![Layer::Loop(LoopLayer {
                body: l.body.to_z_basis(),
                repetitions: l.repetitions,
            })],
            _ => vec![self.clone()],
        }
    }

    /// Shift measurement-record back-references by `delta`, for layers that
    /// hold any. Other layers are returned unchanged.
    #[must_use]
    pub fn with_rec_targets_shifted_by(&self, delta: i32) -> Layer {
        match self {
            Layer::Feedback(l) => Layer::Feedback(l.with_rec_targets_shifted_by(delta)),
            Layer::DetObs(l) => Layer::DetObs(l.with_rec_targets_shifted_by(delta)),
            other => other.clone(),
        }
    }

    /// Serialize the layer into a flat item list.
    pub fn append_into(&self, out: &mut Vec<CircuitItem>) {
        match self {
            Layer::Empty => {}
            Layer::QubitCoords(l) => l.append_into(out),
            Layer::ShiftCoords(l) => l.append_into(out),
            Layer::DetObs(l) => l.append_into(out),
            Layer::Reset(l) => l.append_into(out),
            Layer::Measure(l) => l.append_into(out),
            Layer::Mpp(l) => l.append_into(out),
            Layer::Rotation(l) => l.append_into(out),
            Layer::Interact(l) => l.append_into(out),
            Layer::Feedback(l) => l.append_into(out),
            Layer::Swap(l) => l.append_into(out),
            Layer::ISwap(l) => l.append_into(out),
            Layer::InteractSwap(l) => l.append_into(out),
            Layer::SqrtPP(l) => l.append_into(out),
            Layer::Noise(l) => l.append_into(out),
            Layer::Loop(l) => {
                let mut body_items = l.body.to_circuit().items().to_vec();
                body_items.push(CircuitItem::Instruction(Instruction::new("TICK", [], [])));
                out.push(CircuitItem::Repeat(RepeatBlock {
                    body: Circuit::from_items(body_items),
                    repetitions: l.repetitions,
                }));
            }
        }
    }
}
