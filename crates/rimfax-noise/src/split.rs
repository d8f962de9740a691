//! Moment splitting.
//!
//! Partitions a circuit into moments (the intervals between TICKs) while
//! splitting composite operations into independently noisable pieces: joint
//! Pauli-product measurements into one piece per product, two-qubit gates
//! with classical operands away from purely-quantum pairs, and per-target
//! pieces whenever immune qubits are configured.

use rustc_hash::FxHashSet;

use rimfax_ir::{Circuit, CircuitItem, Instruction, RepeatBlock, gate_data, is_annotation};

use crate::error::{NoiseError, NoiseResult};

/// One item of the split moment stream.
#[derive(Debug, Clone, PartialEq)]
pub enum MomentItem {
    /// The split operations of one moment. The closing TICK is not included.
    Moment(Vec<Instruction>),
    /// A repeat block, passed through unchanged.
    Repeat(RepeatBlock),
}

/// Split a circuit into moments, with composite operations broken up.
///
/// TICKs close the current moment (possibly yielding an empty one); a repeat
/// block flushes a non-empty moment in progress and is passed through; a
/// trailing unterminated moment is yielded only if non-empty.
pub fn split_op_moments(
    circuit: &Circuit,
    immune_qubits: &FxHashSet<u32>,
) -> NoiseResult<Vec<MomentItem>> {
    let mut result = Vec::new();
    let mut cur_moment = Vec::new();
    for item in circuit {
        match item {
            CircuitItem::Repeat(block) => {
                if !cur_moment.is_empty() {
                    result.push(MomentItem::Moment(std::mem::take(&mut cur_moment)));
                }
                result.push(MomentItem::Repeat(block.clone()));
            }
            CircuitItem::Instruction(op) => {
                if op.name == "TICK" {
                    result.push(MomentItem::Moment(std::mem::take(&mut cur_moment)));
                } else {
                    split_targets_if_needed(op, immune_qubits, &mut cur_moment)?;
                }
            }
        }
    }
    if !cur_moment.is_empty() {
        result.push(MomentItem::Moment(cur_moment));
    }
    Ok(result)
}

/// Determine if an operation is an annotation or a classical control system
/// update (a two-qubit gate whose every pair has a classical operand).
pub fn occurs_in_classical_control_system(op: &Instruction) -> NoiseResult<bool> {
    if is_annotation(&op.name) {
        return Ok(true);
    }
    let data = gate_data(&op.name)?;
    if data.is_unitary && data.is_two_qubit_gate {
        for pair in op.targets.chunks(2) {
            let classical = pair.iter().any(|t| t.is_classical());
            if !classical {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    Ok(false)
}

fn split_targets_if_needed(
    op: &Instruction,
    immune_qubits: &FxHashSet<u32>,
    out: &mut Vec<Instruction>,
) -> NoiseResult<()> {
    let data = gate_data(&op.name)?;
    if data.is_unitary && data.is_two_qubit_gate {
        split_clifford_2q(op, immune_qubits, out)
    } else if op.name == "MPP" {
        split_mpp(op, out);
        Ok(())
    } else if is_annotation(&op.name) {
        out.push(op.clone());
        Ok(())
    } else if data.is_noisy_gate && !data.produces_measurements {
        out.push(op.clone());
        Ok(())
    } else if data.is_single_qubit_gate {
        if immune_qubits.is_empty() {
            out.push(op.clone());
        } else {
            for t in &op.targets {
                out.push(Instruction::new(op.name.clone(), [*t], op.args.clone()));
            }
        }
        Ok(())
    } else if data.is_two_qubit_gate {
        if immune_qubits.is_empty() {
            out.push(op.clone());
            Ok(())
        } else {
            split_into_pairs(op, out)
        }
    } else {
        Err(NoiseError::Unsupported { op: op.to_string() })
    }
}

/// Split a two-qubit Clifford so classical control system updates are
/// separated from pairs actually happening on the quantum computer.
fn split_clifford_2q(
    op: &Instruction,
    immune_qubits: &FxHashSet<u32>,
    out: &mut Vec<Instruction>,
) -> NoiseResult<()> {
    if !immune_qubits.is_empty() || op.targets.iter().any(|t| t.is_classical()) {
        split_into_pairs(op, out)
    } else {
        out.push(op.clone());
        Ok(())
    }
}

fn split_into_pairs(op: &Instruction, out: &mut Vec<Instruction>) -> NoiseResult<()> {
    if op.targets.len() % 2 != 0 {
        return Err(NoiseError::Unsupported { op: op.to_string() });
    }
    for pair in op.targets.chunks_exact(2) {
        out.push(Instruction::new(
            op.name.clone(),
            pair.iter().copied(),
            op.args.clone(),
        ));
    }
    Ok(())
}

/// Split an MPP operation into one operation per Pauli product it measures.
fn split_mpp(op: &Instruction, out: &mut Vec<Instruction>) {
    let targets = &op.targets;
    let mut k = 0;
    let mut start = 0;
    while k < targets.len() {
        if k + 1 == targets.len() || !targets[k + 1].is_combiner() {
            out.push(Instruction::new(
                op.name.clone(),
                targets[start..=k].iter().copied(),
                op.args.clone(),
            ));
            k += 1;
            start = k;
        } else {
            k += 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moments_of(text: &str) -> Vec<MomentItem> {
        let circuit: Circuit = text.parse().unwrap();
        split_op_moments(&circuit, &FxHashSet::default()).unwrap()
    }

    fn moment_names(item: &MomentItem) -> Vec<String> {
        match item {
            MomentItem::Moment(ops) => ops.iter().map(|op| op.to_string()).collect(),
            MomentItem::Repeat(_) => vec!["REPEAT".into()],
        }
    }

    #[test]
    fn test_ticks_close_moments() {
        let moments = moments_of("H 0\nTICK\nCX 0 1\nTICK\nTICK\nM 0");
        assert_eq!(moments.len(), 4);
        assert_eq!(moment_names(&moments[0]), ["H 0"]);
        assert_eq!(moment_names(&moments[1]), ["CX 0 1"]);
        assert!(moment_names(&moments[2]).is_empty());
        assert_eq!(moment_names(&moments[3]), ["M 0"]);
    }

    #[test]
    fn test_trailing_empty_moment_not_yielded() {
        let moments = moments_of("H 0\nTICK");
        assert_eq!(moments.len(), 1);
    }

    #[test]
    fn test_mpp_splits_per_product() {
        let moments = moments_of("MPP X0*X1 Z2 Y3*Y4*Y5");
        assert_eq!(
            moment_names(&moments[0]),
            ["MPP X0*X1", "MPP Z2", "MPP Y3*Y4*Y5"]
        );
    }

    #[test]
    fn test_classical_pairs_split_from_quantum() {
        let moments = moments_of("CX rec[-1] 0 1 2");
        assert_eq!(moment_names(&moments[0]), ["CX rec[-1] 0", "CX 1 2"]);

        let moments = moments_of("CX sweep[0] 0 1 2");
        assert_eq!(moment_names(&moments[0]), ["CX sweep[0] 0", "CX 1 2"]);
    }

    #[test]
    fn test_quantum_2q_passes_through_without_immune() {
        let moments = moments_of("CX 0 1 2 3");
        assert_eq!(moment_names(&moments[0]), ["CX 0 1 2 3"]);
    }

    #[test]
    fn test_immune_splits_everything() {
        let circuit: Circuit = "H 0 1\nCZ 0 1 2 3\nMXX 0 1 2 3".parse().unwrap();
        let immune: FxHashSet<u32> = [3].into_iter().collect();
        let moments = split_op_moments(&circuit, &immune).unwrap();
        assert_eq!(
            moment_names(&moments[0]),
            ["H 0", "H 1", "CZ 0 1", "CZ 2 3", "MXX 0 1", "MXX 2 3"]
        );
    }

    #[test]
    fn test_repeat_block_flushes_moment() {
        let moments = moments_of("H 0\nREPEAT 2 {\n    X 0\n}\nM 0");
        assert_eq!(moments.len(), 3);
        assert!(matches!(moments[1], MomentItem::Repeat(_)));
        assert_eq!(moment_names(&moments[2]), ["M 0"]);
    }

    #[test]
    fn test_noise_and_annotations_pass_through() {
        let moments = moments_of("DEPOLARIZE1(0.01) 0 1\nDETECTOR rec[-1]\nMPAD 0");
        assert_eq!(
            moment_names(&moments[0]),
            ["DEPOLARIZE1(0.01) 0 1", "DETECTOR rec[-1]", "MPAD 0"]
        );
    }

    #[test]
    fn test_classical_control_detection() {
        let cx_feedback: Circuit = "CX rec[-1] 0".parse().unwrap();
        let CircuitItem::Instruction(op) = &cx_feedback.items()[0] else {
            panic!("expected instruction");
        };
        assert!(occurs_in_classical_control_system(op).unwrap());

        let cx: Circuit = "CX 0 1".parse().unwrap();
        let CircuitItem::Instruction(op) = &cx.items()[0] else {
            panic!("expected instruction");
        };
        assert!(!occurs_in_classical_control_system(op).unwrap());

        let det: Circuit = "DETECTOR rec[-1]".parse().unwrap();
        let CircuitItem::Instruction(op) = &det.items()[0] else {
            panic!("expected instruction");
        };
        assert!(occurs_in_classical_control_system(op).unwrap());
    }
}
