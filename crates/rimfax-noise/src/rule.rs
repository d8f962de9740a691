//! Noise rules: how to wrap one operation with noise channels.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rimfax_ir::{Circuit, GateTarget, Instruction, gate_data};

use crate::engine::NoiseGroups;
use crate::error::{NoiseError, NoiseResult};

/// Argument of a noise channel: a single probability, or a tuple of disjoint
/// probabilities for multi-parameter channels like `PAULI_CHANNEL_1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoiseArg {
    /// A single probability in `[0, 1]`.
    Probability(f64),
    /// Disjoint probabilities summing to at most 1.
    Probabilities(Vec<f64>),
}

impl NoiseArg {
    /// The argument values, in instruction order.
    pub fn values(&self) -> &[f64] {
        match self {
            NoiseArg::Probability(p) => std::slice::from_ref(p),
            NoiseArg::Probabilities(ps) => ps,
        }
    }
}

impl From<f64> for NoiseArg {
    fn from(p: f64) -> Self {
        NoiseArg::Probability(p)
    }
}

impl From<Vec<f64>> for NoiseArg {
    fn from(ps: Vec<f64>) -> Self {
        NoiseArg::Probabilities(ps)
    }
}

/// Describes how to add noise to an operation.
///
/// `before` and `after` map pure-noise-channel names to their arguments; the
/// channels are applied to the operation's qubit targets before respectively
/// after everything else in the moment. `flip_result` is the probability that
/// a measurement result is reported incorrectly, and is only valid on
/// operations that produce measurement results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseRule {
    before: BTreeMap<String, NoiseArg>,
    after: BTreeMap<String, NoiseArg>,
    flip_result: f64,
}

impl NoiseRule {
    /// Start building a rule.
    pub fn builder() -> NoiseRuleBuilder {
        NoiseRuleBuilder::default()
    }

    /// A rule that adds no noise at all. Useful to declare that an operation
    /// is deliberately noiseless.
    pub fn none() -> Self {
        Self::default()
    }

    /// Single-qubit depolarization after the operation. This is the scalar
    /// shorthand for 1-qubit Clifford fallback rules.
    pub fn depolarizing1(p: f64) -> NoiseResult<Self> {
        Self::builder().after("DEPOLARIZE1", p).build()
    }

    /// Two-qubit depolarization after the operation. This is the scalar
    /// shorthand for 2-qubit Clifford fallback rules.
    pub fn depolarizing2(p: f64) -> NoiseResult<Self> {
        Self::builder().after("DEPOLARIZE2", p).build()
    }

    /// Channels applied before the moment.
    pub fn before(&self) -> &BTreeMap<String, NoiseArg> {
        &self.before
    }

    /// Channels applied after the moment.
    pub fn after(&self) -> &BTreeMap<String, NoiseArg> {
        &self.after
    }

    /// Probability that a measurement result is reported incorrectly.
    pub fn flip_result(&self) -> f64 {
        self.flip_result
    }

    /// Emit the noisy version of one split operation.
    ///
    /// The operation itself goes into `out_during_moment` (with its
    /// measurement argument rewritten when `flip_result` is set); its noise
    /// channels are accumulated into the keyed before/after groups. An
    /// operation touching any immune qubit passes through untouched.
    pub(crate) fn append_noisy_version_of(
        &self,
        split_op: &Instruction,
        out_during_moment: &mut Circuit,
        before_moments: &mut NoiseGroups,
        after_moments: &mut NoiseGroups,
        immune_qubits: &FxHashSet<u32>,
    ) -> NoiseResult<()> {
        if !immune_qubits.is_empty()
            && split_op
                .qubit_values()
                .any(|q| immune_qubits.contains(&q))
        {
            out_during_moment.append_instruction(split_op.clone())?;
            return Ok(());
        }

        let mut args = split_op.args.clone();
        if self.flip_result > 0.0 {
            let data = gate_data(&split_op.name)?;
            if !data.produces_measurements || !data.is_noisy_gate {
                return Err(NoiseError::FlipResultOnNonMeasurement {
                    op: split_op.to_string(),
                });
            }
            if !args.is_empty() {
                return Err(NoiseError::UnexpectedMeasurementArgs {
                    op: split_op.to_string(),
                });
            }
            args = vec![self.flip_result];
        }

        out_during_moment.append(split_op.name.clone(), split_op.targets.clone(), args)?;
        let raw_targets: Vec<GateTarget> = split_op
            .qubit_values()
            .map(GateTarget::Qubit)
            .collect();
        for (op_name, arg) in &self.before {
            before_moments.extend(op_name, arg.values(), &raw_targets);
        }
        for (op_name, arg) in &self.after {
            after_moments.extend(op_name, arg.values(), &raw_targets);
        }
        Ok(())
    }
}

/// Builder for [`NoiseRule`] with validation at [`build`](Self::build) time.
#[derive(Debug, Clone, Default)]
pub struct NoiseRuleBuilder {
    before: BTreeMap<String, NoiseArg>,
    after: BTreeMap<String, NoiseArg>,
    flip_result: f64,
}

impl NoiseRuleBuilder {
    /// Add a channel applied before the moment.
    #[must_use]
    pub fn before(mut self, name: impl Into<String>, arg: impl Into<NoiseArg>) -> Self {
        self.before.insert(name.into(), arg.into());
        self
    }

    /// Add a channel applied after the moment.
    #[must_use]
    pub fn after(mut self, name: impl Into<String>, arg: impl Into<NoiseArg>) -> Self {
        self.after.insert(name.into(), arg.into());
        self
    }

    /// Set the measurement-flip probability.
    #[must_use]
    pub fn flip_result(mut self, p: f64) -> Self {
        self.flip_result = p;
        self
    }

    /// Validate and build the rule.
    pub fn build(self) -> NoiseResult<NoiseRule> {
        if !(0.0..=1.0).contains(&self.flip_result) {
            return Err(NoiseError::InvalidProbability {
                value: self.flip_result,
            });
        }
        for (name, arg) in self.before.iter().chain(self.after.iter()) {
            let data = gate_data(name)?;
            if data.produces_measurements || !data.is_noisy_gate {
                return Err(NoiseError::NotANoiseChannel { name: name.clone() });
            }
            if data.parens_args.min == 1 && data.parens_args.max == 1 {
                match arg {
                    NoiseArg::Probability(p) if (0.0..=1.0).contains(p) => {}
                    NoiseArg::Probability(p) => {
                        return Err(NoiseError::InvalidProbability { value: *p });
                    }
                    NoiseArg::Probabilities(ps) => {
                        return Err(NoiseError::InvalidProbabilityTuple { args: ps.clone() });
                    }
                }
            } else {
                let NoiseArg::Probabilities(ps) = arg else {
                    return Err(NoiseError::WrongArgCount {
                        name: name.clone(),
                        got: arg.values().len(),
                    });
                };
                if !data.parens_args.contains(ps.len()) {
                    return Err(NoiseError::WrongArgCount {
                        name: name.clone(),
                        got: ps.len(),
                    });
                }
                let sum: f64 = ps.iter().sum();
                if ps.iter().any(|p| !(0.0..=1.0).contains(p)) || !(0.0..=1.0).contains(&sum) {
                    return Err(NoiseError::InvalidProbabilityTuple { args: ps.clone() });
                }
            }
        }
        Ok(NoiseRule {
            before: self.before,
            after: self.after,
            flip_result: self.flip_result,
        })
    }
}
