//! Noise model configuration and rule selection.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use rimfax_ir::{Instruction, Pauli, gate_data};

use crate::error::{NoiseError, NoiseResult};
use crate::rule::NoiseRule;
use crate::split::occurs_in_classical_control_system;

/// A complete description of how to add noise to a circuit.
///
/// Every knob is an explicit field; [`Default`] gives the all-off model.
/// Scalar shorthands for the Clifford fallback rules are available as
/// [`NoiseRule::depolarizing1`] and [`NoiseRule::depolarizing2`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Single-qubit depolarization applied to every system qubit not touched
    /// during a moment (immune qubits excluded).
    pub idle_depolarization: f64,

    /// Noise applied to all system qubits (minus immune) at every tick
    /// boundary. Must not flip measurement results.
    pub tick_noise: Option<NoiseRule>,

    /// Extra single-qubit depolarization applied to non-collapsing system
    /// qubits during any moment that contains a reset or measurement.
    pub additional_depolarization_waiting_for_m_or_r: f64,

    /// First-priority rule overrides, keyed by gate name.
    pub gate_rules: FxHashMap<String, NoiseRule>,

    /// Rules for measurements, keyed by the measured Pauli product
    /// (e.g. `"Z"`, `"XX"`). MPP bases are inferred from the Pauli targets.
    pub measure_rules: FxHashMap<String, NoiseRule>,

    /// Fallback rule for any measurement-producing operation.
    pub any_measurement_rule: Option<NoiseRule>,

    /// Fallback rule for single-qubit Clifford unitaries.
    pub any_clifford_1q_rule: Option<NoiseRule>,

    /// Fallback rule for two-qubit Clifford unitaries.
    pub any_clifford_2q_rule: Option<NoiseRule>,

    /// Disable the one-use-per-qubit-per-moment safety check.
    pub allow_multiple_uses_of_a_qubit_in_one_tick: bool,
}

impl NoiseModel {
    /// Superconducting-inspired noise.
    ///
    /// As defined in "A Fault-Tolerant Honeycomb Memory"
    /// <https://arxiv.org/abs/2108.10457>.
    ///
    /// Small tweak when measurements aren't immediately followed by a reset:
    /// the measurement result is probabilistically flipped instead of the
    /// input qubit. The input qubit is depolarized after the measurement.
    pub fn si1000(p: f64) -> NoiseResult<Self> {
        let mut measure_rules = FxHashMap::default();
        measure_rules.insert(
            "Z".to_string(),
            NoiseRule::builder()
                .after("DEPOLARIZE1", p)
                .flip_result(p * 5.0)
                .build()?,
        );
        measure_rules.insert(
            "ZZ".to_string(),
            NoiseRule::builder()
                .after("DEPOLARIZE2", p)
                .flip_result(p * 5.0)
                .build()?,
        );
        let mut gate_rules = FxHashMap::default();
        gate_rules.insert(
            "R".to_string(),
            NoiseRule::builder().after("X_ERROR", p * 2.0).build()?,
        );
        Ok(NoiseModel {
            idle_depolarization: p / 10.0,
            additional_depolarization_waiting_for_m_or_r: 2.0 * p,
            any_clifford_1q_rule: Some(NoiseRule::depolarizing1(p / 10.0)?),
            any_clifford_2q_rule: Some(NoiseRule::depolarizing2(p)?),
            measure_rules,
            gate_rules,
            ..Default::default()
        })
    }

    /// Near-standard circuit depolarizing noise.
    ///
    /// Everything has the same parameter `p`. Single- and two-qubit Clifford
    /// gates get depolarization, dissipative gates have their result
    /// probabilistically bit flipped (or phase flipped if appropriate).
    ///
    /// Non-demolition measurement is treated a bit unusually in that it is
    /// the result that is flipped instead of the input qubit. The input
    /// qubit is depolarized.
    pub fn uniform_depolarizing(p: f64, single_qubit_only: bool) -> NoiseResult<Self> {
        let dep2 = if single_qubit_only {
            "DEPOLARIZE1"
        } else {
            "DEPOLARIZE2"
        };
        let mut measure_rules = FxHashMap::default();
        for basis in [Pauli::X, Pauli::Y, Pauli::Z] {
            measure_rules.insert(
                basis.to_string(),
                NoiseRule::builder()
                    .after("DEPOLARIZE1", p)
                    .flip_result(p)
                    .build()?,
            );
            for basis2 in [Pauli::X, Pauli::Y, Pauli::Z] {
                measure_rules.insert(
                    format!("{basis}{basis2}"),
                    NoiseRule::builder().after(dep2, p).flip_result(p).build()?,
                );
            }
        }
        let mut gate_rules = FxHashMap::default();
        gate_rules.insert(
            "RX".to_string(),
            NoiseRule::builder().after("Z_ERROR", p).build()?,
        );
        gate_rules.insert(
            "RY".to_string(),
            NoiseRule::builder().after("X_ERROR", p).build()?,
        );
        gate_rules.insert(
            "R".to_string(),
            NoiseRule::builder().after("X_ERROR", p).build()?,
        );
        Ok(NoiseModel {
            idle_depolarization: p,
            any_clifford_1q_rule: Some(NoiseRule::depolarizing1(p)?),
            any_clifford_2q_rule: Some(if single_qubit_only {
                NoiseRule::depolarizing1(p)?
            } else {
                NoiseRule::depolarizing2(p)?
            }),
            measure_rules,
            gate_rules,
            ..Default::default()
        })
    }

    /// Check the model's structural invariants.
    pub(crate) fn validate(&self) -> NoiseResult<()> {
        if let Some(tick_noise) = &self.tick_noise {
            if tick_noise.flip_result() != 0.0 {
                return Err(NoiseError::TickNoiseFlipsResults);
            }
        }
        Ok(())
    }

    /// Select the noise rule for one split operation.
    ///
    /// `Ok(None)` means the operation deliberately gets no noise (classical
    /// control system updates and bare Pauli channels); a missing rule for
    /// anything else is a [`NoiseError::NoNoiseSpecified`] failure.
    pub(crate) fn noise_rule_for_split_operation(
        &self,
        split_op: &Instruction,
    ) -> NoiseResult<Option<NoiseRule>> {
        if occurs_in_classical_control_system(split_op)? {
            return Ok(None);
        }
        if split_op.name == "PAULI_CHANNEL_1" || split_op.name == "PAULI_CHANNEL_2" {
            return Ok(None);
        }

        if let Some(rule) = self.gate_rules.get(&split_op.name) {
            return Ok(Some(rule.clone()));
        }

        let data = gate_data(&split_op.name)?;

        if data.is_unitary && data.is_single_qubit_gate {
            if let Some(rule) = &self.any_clifford_1q_rule {
                return Ok(Some(rule.clone()));
            }
        }
        if data.is_unitary && data.is_two_qubit_gate {
            if let Some(rule) = &self.any_clifford_2q_rule {
                return Ok(Some(rule.clone()));
            }
        }
        if let Some(basis) = measure_basis(split_op)? {
            if let Some(rule) = self.measure_rules.get(&basis) {
                return Ok(Some(rule.clone()));
            }
        }
        if data.produces_measurements {
            if let Some(rule) = &self.any_measurement_rule {
                return Ok(Some(rule.clone()));
            }
        }
        if data.is_reset && data.produces_measurements {
            let (m_name, r_name) = match data.name {
                "MRX" => ("MX", "RX"),
                "MRY" => ("MY", "RY"),
                "MR" => ("M", "R"),
                _ => {
                    return Err(NoiseError::Unsupported {
                        op: split_op.to_string(),
                    });
                }
            };
            let r_noise = self.noise_rule_for_split_operation(&Instruction::new(
                r_name,
                split_op.targets.iter().copied(),
                [],
            ))?;
            let m_noise = self.noise_rule_for_split_operation(&Instruction::new(
                m_name,
                split_op.targets.iter().copied(),
                [],
            ))?;
            let mut builder = NoiseRule::builder();
            if let Some(r_noise) = r_noise {
                for (name, arg) in r_noise.before() {
                    builder = builder.before(name.clone(), arg.clone());
                }
                for (name, arg) in r_noise.after() {
                    builder = builder.after(name.clone(), arg.clone());
                }
            }
            if let Some(m_noise) = m_noise {
                builder = builder.flip_result(m_noise.flip_result());
            }
            return Ok(Some(builder.build()?));
        }

        Err(NoiseError::NoNoiseSpecified {
            op: split_op.to_string(),
        })
    }
}

/// The Pauli product basis a measurement operation measures, as a string
/// (e.g. `"Z"` or `"XX"`). `None` for operations that are not measurements.
pub(crate) fn measure_basis(split_op: &Instruction) -> NoiseResult<Option<String>> {
    let basis = match split_op.name.as_str() {
        "M" | "MR" | "MZ" | "MRZ" => "Z".to_string(),
        "MX" | "MRX" => "X".to_string(),
        "MY" | "MRY" => "Y".to_string(),
        "MXX" => "XX".to_string(),
        "MYY" => "YY".to_string(),
        "MZZ" => "ZZ".to_string(),
        "MPP" => {
            let mut result = String::new();
            let mut k = 0;
            while k < split_op.targets.len() {
                match split_op.targets[k].pauli_basis() {
                    Some(basis) => result.push(basis.letter()),
                    None => {
                        return Err(NoiseError::Unsupported {
                            op: split_op.to_string(),
                        });
                    }
                }
                k += 2;
            }
            result
        }
        _ => return Ok(None),
    };
    Ok(Some(basis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rimfax_ir::GateTarget;

    fn op(text: &str) -> Instruction {
        let circuit: rimfax_ir::Circuit = text.parse().unwrap();
        circuit.items()[0]
            .as_instruction()
            .expect("expected instruction")
            .clone()
    }

    #[test]
    fn test_measure_basis() {
        assert_eq!(measure_basis(&op("M 0")).unwrap().as_deref(), Some("Z"));
        assert_eq!(measure_basis(&op("MRX 0")).unwrap().as_deref(), Some("X"));
        assert_eq!(measure_basis(&op("MZZ 0 1")).unwrap().as_deref(), Some("ZZ"));
        assert_eq!(
            measure_basis(&op("MPP X0*Y1*Z2")).unwrap().as_deref(),
            Some("XYZ")
        );
        assert_eq!(measure_basis(&op("H 0")).unwrap(), None);
    }

    #[test]
    fn test_si1000_tables() {
        let p = 0.001;
        let model = NoiseModel::si1000(p).unwrap();
        assert_eq!(model.idle_depolarization, p / 10.0);
        assert_eq!(model.additional_depolarization_waiting_for_m_or_r, 2.0 * p);
        assert_eq!(model.measure_rules["Z"].flip_result(), p * 5.0);
        assert_eq!(
            model.gate_rules["R"].after()["X_ERROR"].values(),
            &[p * 2.0]
        );
    }

    #[test]
    fn test_uniform_depolarizing_tables() {
        let model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
        assert_eq!(model.measure_rules.len(), 12);
        assert!(model.measure_rules["XY"].after().contains_key("DEPOLARIZE2"));

        let model = NoiseModel::uniform_depolarizing(0.01, true).unwrap();
        assert!(model.measure_rules["XY"].after().contains_key("DEPOLARIZE1"));
    }

    #[test]
    fn test_preset_rejects_bad_probability() {
        assert!(NoiseModel::si1000(2.0).is_err());
        assert!(NoiseModel::uniform_depolarizing(-0.5, false).is_err());
    }

    #[test]
    fn test_rule_selection_priority() {
        let mut model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
        model.gate_rules.insert(
            "H".to_string(),
            NoiseRule::builder().after("Y_ERROR", 0.5).build().unwrap(),
        );
        let rule = model
            .noise_rule_for_split_operation(&op("H 0"))
            .unwrap()
            .unwrap();
        assert!(rule.after().contains_key("Y_ERROR"));

        let rule = model
            .noise_rule_for_split_operation(&op("S 0"))
            .unwrap()
            .unwrap();
        assert!(rule.after().contains_key("DEPOLARIZE1"));
    }

    #[test]
    fn test_classical_control_gets_no_rule() {
        let model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
        assert!(
            model
                .noise_rule_for_split_operation(&op("CX rec[-1] 0"))
                .unwrap()
                .is_none()
        );
        assert!(
            model
                .noise_rule_for_split_operation(&op("DETECTOR rec[-1]"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_missing_rule_is_fatal() {
        let model = NoiseModel::default();
        assert!(matches!(
            model.noise_rule_for_split_operation(&op("H 0")),
            Err(NoiseError::NoNoiseSpecified { .. })
        ));
    }

    #[test]
    fn test_measure_reset_composite() {
        // No "Z" measure rule and no fallback, so MR resolves its parts.
        let mut model = NoiseModel::default();
        model.gate_rules.insert(
            "R".to_string(),
            NoiseRule::builder().after("X_ERROR", 0.02).build().unwrap(),
        );
        model.gate_rules.insert(
            "M".to_string(),
            NoiseRule::builder().flip_result(0.01).build().unwrap(),
        );
        let rule = model
            .noise_rule_for_split_operation(&Instruction::new("MR", [GateTarget::Qubit(0)], []))
            .unwrap()
            .unwrap();
        assert_eq!(rule.flip_result(), 0.01);
        assert_eq!(rule.after()["X_ERROR"].values(), &[0.02]);
    }

    #[test]
    fn test_tick_noise_must_not_flip() {
        let model = NoiseModel {
            tick_noise: Some(
                NoiseRule::builder()
                    .after("DEPOLARIZE1", 0.01)
                    .flip_result(0.1)
                    .build()
                    .unwrap(),
            ),
            ..Default::default()
        };
        assert!(matches!(
            model.validate(),
            Err(NoiseError::TickNoiseFlipsResults)
        ));
    }
}
