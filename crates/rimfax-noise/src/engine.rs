//! The noise engine: moment-by-moment circuit instrumentation.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use rimfax_ir::{Circuit, GateTarget, Instruction, gate_data};

use crate::error::{NoiseError, NoiseResult};
use crate::model::NoiseModel;
use crate::split::{MomentItem, occurs_in_classical_control_system, split_op_moments};

/// Explicit Pauli operations get special handling: a Pauli on a qubit also
/// touched by a proper Clifford this moment carries no noise of its own.
fn is_explicit_pauli(name: &str) -> bool {
    matches!(name, "I" | "X" | "Y" | "Z")
}

/// Grouped noise channels, keyed by `(channel name, arguments)`.
///
/// Targets accumulate per key; emission is one instruction per key, ordered
/// by name and then by argument values.
#[derive(Debug, Default)]
pub(crate) struct NoiseGroups {
    groups: Vec<((String, Vec<f64>), Vec<GateTarget>)>,
}

impl NoiseGroups {
    pub(crate) fn extend(&mut self, name: &str, args: &[f64], targets: &[GateTarget]) {
        for ((group_name, group_args), group_targets) in &mut self.groups {
            if group_name == name && group_args == args {
                group_targets.extend_from_slice(targets);
                return;
            }
        }
        self.groups
            .push(((name.to_string(), args.to_vec()), targets.to_vec()));
    }

    fn emit_into(mut self, out: &mut Circuit) -> NoiseResult<()> {
        self.groups.sort_by(|((name_a, args_a), _), ((name_b, args_b), _)| {
            name_a.cmp(name_b).then_with(|| {
                args_a
                    .iter()
                    .zip(args_b)
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| args_a.len().cmp(&args_b.len()))
            })
        });
        for ((name, args), targets) in self.groups {
            out.append(name, targets, args)?;
        }
        Ok(())
    }
}

/// Per-invocation transformation state.
///
/// Carries the bare-Pauli-channel deduplication flag, which is scoped to one
/// top-level noisification rather than to the model.
struct NoiseBuilder<'a> {
    model: &'a NoiseModel,
    added_pauli_channel: bool,
}

impl NoiseModel {
    /// Returns a noisy version of the given circuit, by applying the
    /// receiving noise model.
    ///
    /// `system_qubits` are the qubits eligible for idling noise; when absent,
    /// every qubit index below the circuit's qubit count is used.
    /// `immune_qubits` never receive noise, even if operated on.
    pub fn noisy_circuit(
        &self,
        circuit: &Circuit,
        system_qubits: Option<&FxHashSet<u32>>,
        immune_qubits: Option<&FxHashSet<u32>>,
    ) -> NoiseResult<Circuit> {
        self.validate()?;
        let system: FxHashSet<u32> = match system_qubits {
            Some(qubits) => qubits.clone(),
            None => (0..circuit.num_qubits() as u32).collect(),
        };
        let immune = immune_qubits.cloned().unwrap_or_default();
        let mut builder = NoiseBuilder {
            model: self,
            added_pauli_channel: false,
        };
        builder.noisy_circuit(circuit, &system, &immune)
    }

    /// Adds noise to the circuit except for MPP operations at the start/end.
    ///
    /// Divides the circuit into three parts: a leading and a trailing stretch
    /// of annotation-or-MPP instructions, and the body between them. Noise is
    /// added to the body only and the pieces are reassembled.
    pub fn noisy_circuit_skipping_mpp_boundaries(
        &self,
        circuit: &Circuit,
        immune_qubits: Option<&FxHashSet<u32>>,
    ) -> NoiseResult<Circuit> {
        const ALLOWED: [&str; 6] = [
            "TICK",
            "OBSERVABLE_INCLUDE",
            "DETECTOR",
            "MPP",
            "QUBIT_COORDS",
            "SHIFT_COORDS",
        ];
        let items = circuit.items();
        let mut start = 0;
        let mut end = items.len();
        while start < items.len() && ALLOWED.contains(&items[start].name()) {
            start += 1;
        }
        while end > 0 && ALLOWED.contains(&items[end - 1].name()) {
            end -= 1;
        }
        while end < items.len() && items[end].name() != "MPP" {
            end += 1;
        }
        while end > 0 && items[end - 1].name() == "TICK" {
            end -= 1;
        }
        if end <= start {
            return Err(NoiseError::EmptyBody);
        }

        let body = Circuit::from_items(items[start..end].to_vec());
        let noisy_body = self.noisy_circuit(&body, None, immune_qubits)?;
        let mut all = items[..start].to_vec();
        all.extend(noisy_body.items().iter().cloned());
        all.extend(items[end..].iter().cloned());
        Ok(Circuit::from_items(all))
    }
}

impl NoiseBuilder<'_> {
    fn noisy_circuit(
        &mut self,
        circuit: &Circuit,
        system_qubits: &FxHashSet<u32>,
        immune_qubits: &FxHashSet<u32>,
    ) -> NoiseResult<Circuit> {
        let moments = split_op_moments(circuit, immune_qubits)?;
        debug!(
            moments = moments.len(),
            system = system_qubits.len(),
            "instrumenting circuit"
        );
        let mut result = Circuit::new();
        let mut first = true;
        for moment_item in moments {
            if first {
                first = false;
            } else if matches!(result.last_item(), Some(rimfax_ir::CircuitItem::Repeat(_))) {
                // A noisy repeat block already ends with a TICK inside.
            } else {
                result.append("TICK", [], [])?;
            }
            match moment_item {
                MomentItem::Repeat(block) => {
                    let mut noisy_body =
                        self.noisy_circuit(&block.body, system_qubits, immune_qubits)?;
                    noisy_body.append("TICK", [], [])?;
                    result.append_repeat(noisy_body, block.repetitions);
                }
                MomentItem::Moment(moment_split_ops) => {
                    self.append_noisy_moment(
                        &moment_split_ops,
                        &mut result,
                        system_qubits,
                        immune_qubits,
                    )?;
                }
            }
        }
        Ok(result)
    }

    fn append_noisy_moment(
        &mut self,
        moment_split_ops: &[Instruction],
        out: &mut Circuit,
        system_qubits: &FxHashSet<u32>,
        immune_qubits: &FxHashSet<u32>,
    ) -> NoiseResult<()> {
        // Qubits covered by a proper single-qubit Clifford this moment; an
        // explicit Pauli on such a qubit gets no noise of its own.
        let mut skip_pauli_targets: FxHashSet<u32> = FxHashSet::default();
        for split_op in moment_split_ops {
            let data = gate_data(&split_op.name)?;
            if data.is_unitary && data.is_single_qubit_gate && !is_explicit_pauli(&split_op.name)
            {
                skip_pauli_targets.extend(split_op.qubit_values());
            }
        }

        let mut before = NoiseGroups::default();
        let mut after = NoiseGroups::default();
        let mut grow = Circuit::new();
        for split_op in moment_split_ops {
            let rule = self.model.noise_rule_for_split_operation(split_op)?;
            match rule {
                None => {
                    if split_op.name == "PAULI_CHANNEL_1" || split_op.name == "PAULI_CHANNEL_2" {
                        if !self.added_pauli_channel {
                            grow.append_instruction(split_op.clone())?;
                            self.added_pauli_channel = true;
                        }
                        continue;
                    }
                    grow.append_instruction(split_op.clone())?;
                }
                Some(rule) if is_explicit_pauli(&split_op.name) => {
                    let mut new_targets = Vec::new();
                    let mut skipped_targets = Vec::new();
                    for target in &split_op.targets {
                        match target.qubit_value() {
                            Some(q) if skip_pauli_targets.contains(&q) => {
                                skipped_targets.push(*target);
                            }
                            Some(q) => {
                                new_targets.push(*target);
                                skip_pauli_targets.insert(q);
                            }
                            None => new_targets.push(*target),
                        }
                    }
                    if !skipped_targets.is_empty() {
                        grow.append(
                            split_op.name.clone(),
                            skipped_targets,
                            split_op.args.clone(),
                        )?;
                    }
                    if !new_targets.is_empty() {
                        rule.append_noisy_version_of(
                            &Instruction::new(
                                split_op.name.clone(),
                                new_targets,
                                split_op.args.clone(),
                            ),
                            &mut grow,
                            &mut before,
                            &mut after,
                            immune_qubits,
                        )?;
                    }
                }
                Some(rule) => {
                    rule.append_noisy_version_of(
                        split_op,
                        &mut grow,
                        &mut before,
                        &mut after,
                        immune_qubits,
                    )?;
                }
            }
        }

        before.emit_into(out)?;
        out.extend_from(&grow);
        after.emit_into(out)?;

        self.append_idle_error(moment_split_ops, out, system_qubits, immune_qubits)
    }

    fn append_idle_error(
        &mut self,
        moment_split_ops: &[Instruction],
        out: &mut Circuit,
        system_qubits: &FxHashSet<u32>,
        immune_qubits: &FxHashSet<u32>,
    ) -> NoiseResult<()> {
        let mut collapse_qubits: Vec<u32> = Vec::new();
        let mut clifford_qubits: Vec<u32> = Vec::new();
        let mut pauli_qubits: Vec<u32> = Vec::new();
        for split_op in moment_split_ops {
            if occurs_in_classical_control_system(split_op)? {
                continue;
            }
            let data = gate_data(&split_op.name)?;
            let qubits_out = if data.is_reset || data.produces_measurements {
                &mut collapse_qubits
            } else if is_explicit_pauli(&split_op.name) {
                &mut pauli_qubits
            } else if data.is_unitary {
                &mut clifford_qubits
            } else if split_op.name == "PAULI_CHANNEL_1" || split_op.name == "PAULI_CHANNEL_2" {
                if !self.added_pauli_channel {
                    out.append_instruction(split_op.clone())?;
                    self.added_pauli_channel = true;
                }
                continue;
            } else {
                return Err(NoiseError::Unsupported {
                    op: split_op.to_string(),
                });
            };
            qubits_out.extend(split_op.qubit_values());
        }

        // Safety check for operation collisions.
        let mut usage_counts: FxHashMap<u32, usize> = FxHashMap::default();
        for &q in collapse_qubits.iter().chain(&clifford_qubits) {
            *usage_counts.entry(q).or_insert(0) += 1;
        }
        for &q in &pauli_qubits {
            usage_counts.entry(q).or_insert(1);
        }
        let mut qubits_used_multiple_times: Vec<u32> = usage_counts
            .iter()
            .filter(|&(_, &count)| count != 1)
            .map(|(&q, _)| q)
            .collect();
        if !qubits_used_multiple_times.is_empty()
            && !self.model.allow_multiple_uses_of_a_qubit_in_one_tick
        {
            qubits_used_multiple_times.sort_unstable();
            let mut moment = Circuit::new();
            for split_op in moment_split_ops {
                moment.append_instruction(split_op.clone())?;
            }
            return Err(NoiseError::QubitCollision {
                qubits: qubits_used_multiple_times,
                moment: moment.to_string(),
            });
        }

        let collapse_set: FxHashSet<u32> = collapse_qubits.into_iter().collect();
        let mut touched_set: FxHashSet<u32> = clifford_qubits.into_iter().collect();
        touched_set.extend(pauli_qubits);

        let mut idle: Vec<u32> = system_qubits
            .iter()
            .copied()
            .filter(|q| {
                !collapse_set.contains(q) && !touched_set.contains(q) && !immune_qubits.contains(q)
            })
            .collect();
        idle.sort_unstable();
        if !idle.is_empty() && self.model.idle_depolarization > 0.0 {
            out.append(
                "DEPOLARIZE1",
                idle.iter().map(|&q| GateTarget::Qubit(q)),
                [self.model.idle_depolarization],
            )?;
        }

        let waiting_for_mr = system_qubits
            .iter()
            .any(|q| !collapse_set.contains(q) && !immune_qubits.contains(q));
        if !collapse_set.is_empty()
            && waiting_for_mr
            && self.model.additional_depolarization_waiting_for_m_or_r > 0.0
        {
            // The extra depolarization targets the same idle set as above,
            // not the full non-collapse set.
            out.append(
                "DEPOLARIZE1",
                idle.iter().map(|&q| GateTarget::Qubit(q)),
                [self.model.additional_depolarization_waiting_for_m_or_r],
            )?;
        }

        if let Some(tick_noise) = &self.model.tick_noise {
            let mut tick_targets: Vec<u32> = system_qubits
                .iter()
                .copied()
                .filter(|q| !immune_qubits.contains(q))
                .collect();
            tick_targets.sort_unstable();
            for (name, arg) in tick_noise.before().iter().chain(tick_noise.after()) {
                out.append(
                    name.clone(),
                    tick_targets.iter().map(|&q| GateTarget::Qubit(q)),
                    arg.values().iter().copied(),
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::NoiseRule;

    fn circuit(text: &str) -> Circuit {
        text.parse().unwrap()
    }

    #[test]
    fn test_identity_model_only_inserts_ticks() {
        let mut model = NoiseModel::default();
        model.any_clifford_1q_rule = Some(NoiseRule::none());
        model.any_clifford_2q_rule = Some(NoiseRule::none());
        model.any_measurement_rule = Some(NoiseRule::none());
        model
            .gate_rules
            .insert("R".to_string(), NoiseRule::none());

        let input = circuit("R 0\nTICK\nH 0\nTICK\nCX 0 1\nTICK\nM 0 1");
        let noisy = model.noisy_circuit(&input, None, None).unwrap();
        assert_eq!(noisy, input);
    }

    #[test]
    fn test_qubit_collision_detected() {
        let model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
        let input = circuit("H 0\nS 0");
        let err = model.noisy_circuit(&input, None, None).unwrap_err();
        match err {
            NoiseError::QubitCollision { qubits, moment } => {
                assert_eq!(qubits, vec![0]);
                assert!(moment.contains("H 0"));
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_collision_override_flag() {
        let mut model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
        model.allow_multiple_uses_of_a_qubit_in_one_tick = true;
        assert!(
            model
                .noisy_circuit(&circuit("H 0\nS 0"), None, None)
                .is_ok()
        );
    }

    #[test]
    fn test_lone_pauli_counts_once() {
        // A Pauli on an otherwise untouched qubit is not a collision.
        let model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
        assert!(model.noisy_circuit(&circuit("X 0"), None, None).is_ok());
        // A Pauli plus a Clifford on the same qubit is fine too (the Pauli
        // piggybacks on the Clifford's noise).
        assert!(
            model
                .noisy_circuit(&circuit("H 0\nX 0"), None, None)
                .is_ok()
        );
    }

    #[test]
    fn test_noise_groups_sorted_emission() {
        let mut groups = NoiseGroups::default();
        groups.extend("DEPOLARIZE2", &[0.02], &[GateTarget::Qubit(0), GateTarget::Qubit(1)]);
        groups.extend("DEPOLARIZE1", &[0.01], &[GateTarget::Qubit(2)]);
        groups.extend("DEPOLARIZE1", &[0.01], &[GateTarget::Qubit(3)]);
        let mut out = Circuit::new();
        groups.emit_into(&mut out).unwrap();
        assert_eq!(
            out.to_string(),
            "DEPOLARIZE1(0.01) 2 3\nDEPOLARIZE2(0.02) 0 1"
        );
    }
}
