//! End-to-end tests for the noise engine.

use rustc_hash::FxHashSet;

use rimfax_ir::{Circuit, CircuitItem, Instruction};
use rimfax_noise::{NoiseError, NoiseModel, NoiseRule};

fn circuit(text: &str) -> Circuit {
    text.parse().unwrap()
}

fn count_instructions(circuit: &Circuit, name: &str) -> usize {
    let mut count = 0;
    for item in circuit {
        match item {
            CircuitItem::Instruction(inst) => {
                if inst.name == name {
                    count += 1;
                }
            }
            CircuitItem::Repeat(block) => count += count_instructions(&block.body, name),
        }
    }
    count
}

fn instructions(circuit: &Circuit) -> Vec<&Instruction> {
    circuit
        .items()
        .iter()
        .filter_map(CircuitItem::as_instruction)
        .collect()
}

#[test]
fn test_uniform_depolarizing_end_to_end() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let system: FxHashSet<u32> = [0, 1].into_iter().collect();
    let noisy = model
        .noisy_circuit(&circuit("H 0\nTICK\nCX 0 1\nTICK\nM 0 1"), Some(&system), None)
        .unwrap();
    assert_eq!(
        noisy.to_string(),
        "H 0\n\
         DEPOLARIZE1(0.001) 0\n\
         DEPOLARIZE1(0.001) 1\n\
         TICK\n\
         CX 0 1\n\
         DEPOLARIZE2(0.001) 0 1\n\
         TICK\n\
         M(0.001) 0 1\n\
         DEPOLARIZE1(0.001) 0 1"
    );
}

#[test]
fn test_repeat_block_gets_trailing_tick() {
    let model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
    let noisy = model
        .noisy_circuit(
            &circuit("REPEAT 3 {\n    H 0\n    TICK\n    H 0\n    TICK\n}"),
            None,
            None,
        )
        .unwrap();
    let CircuitItem::Repeat(block) = &noisy.items()[0] else {
        panic!("expected repeat block");
    };
    assert_eq!(block.repetitions, 3);
    assert_eq!(count_instructions(&block.body, "H"), 2);
    assert_eq!(count_instructions(&block.body, "DEPOLARIZE1"), 2);
    assert_eq!(block.body.last_item().unwrap().name(), "TICK");
}

#[test]
fn test_no_extra_tick_after_repeat_block() {
    let model = NoiseModel::uniform_depolarizing(0.01, false).unwrap();
    let noisy = model
        .noisy_circuit(
            &circuit("REPEAT 2 {\n    H 0\n    TICK\n}\nM 0"),
            None,
            None,
        )
        .unwrap();
    // The repeat block carries its own trailing TICK; the measurement moment
    // follows it directly.
    assert!(matches!(noisy.items()[0], CircuitItem::Repeat(_)));
    assert_eq!(noisy.items()[1].name(), "M");
}

#[test]
fn test_mpp_split_resolves_bases() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let noisy = model
        .noisy_circuit(&circuit("MPP X0*X1 Z2"), None, None)
        .unwrap();
    assert_eq!(
        noisy.to_string(),
        "MPP(0.001) X0*X1\n\
         MPP(0.001) Z2\n\
         DEPOLARIZE1(0.001) 2\n\
         DEPOLARIZE2(0.001) 0 1"
    );
}

#[test]
fn test_si1000_reset_and_waiting_noise() {
    let p = 0.001;
    let model = NoiseModel::si1000(p).unwrap();
    let system: FxHashSet<u32> = [0, 1].into_iter().collect();
    let noisy = model
        .noisy_circuit(&circuit("R 0"), Some(&system), None)
        .unwrap();
    let ops = instructions(&noisy);
    // R picks up its X_ERROR; the idle qubit waits for the reset to finish.
    assert_eq!(ops[0].name, "R");
    assert_eq!(ops[1].name, "X_ERROR");
    assert_eq!(ops[1].args, vec![p * 2.0]);
    let idle: Vec<&&Instruction> = ops.iter().filter(|op| op.name == "DEPOLARIZE1").collect();
    assert_eq!(idle.len(), 2);
    assert_eq!(idle[0].args, vec![p / 10.0]);
    assert_eq!(idle[1].args, vec![2.0 * p]);
}

#[test]
fn test_immune_qubits_get_no_noise() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let immune: FxHashSet<u32> = [1].into_iter().collect();
    let noisy = model
        .noisy_circuit(&circuit("CX 0 1"), None, Some(&immune))
        .unwrap();
    assert_eq!(noisy.to_string(), "CX 0 1");

    // Non-immune operations in the same moment still pick up their noise.
    let noisy = model
        .noisy_circuit(&circuit("CX 0 1 2 3"), None, Some(&immune))
        .unwrap();
    assert_eq!(noisy.to_string(), "CX 0 1\nCX 2 3\nDEPOLARIZE2(0.001) 2 3");
}

#[test]
fn test_feedback_passes_through_unnoisified() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let system: FxHashSet<u32> = [0].into_iter().collect();
    let noisy = model
        .noisy_circuit(&circuit("CX rec[-1] 0"), Some(&system), None)
        .unwrap();
    // The classical-control update is not a quantum operation: no gate noise,
    // and its qubit still idles.
    assert_eq!(noisy.to_string(), "CX rec[-1] 0\nDEPOLARIZE1(0.001) 0");
}

#[test]
fn test_pauli_channel_deduplication() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let input = circuit(
        "PAULI_CHANNEL_1(0.01, 0.02, 0.03) 0\nTICK\nH 0\nTICK\nPAULI_CHANNEL_1(0.01, 0.02, 0.03) 0",
    );
    let noisy = model.noisy_circuit(&input, None, None).unwrap();
    assert_eq!(count_instructions(&noisy, "PAULI_CHANNEL_1"), 1);

    // A fresh invocation starts a fresh deduplication scope.
    let noisy_again = model.noisy_circuit(&input, None, None).unwrap();
    assert_eq!(count_instructions(&noisy_again, "PAULI_CHANNEL_1"), 1);
}

#[test]
fn test_flip_result_confinement() {
    // After noisification, the only instructions with a probability argument
    // the input didn't have are noisy measurement-producing ones.
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let noisy = model
        .noisy_circuit(
            &circuit("R 0\nTICK\nH 0\nTICK\nMPP X0*X1\nTICK\nM 0 1"),
            None,
            None,
        )
        .unwrap();
    fn check(circuit: &Circuit) {
        for item in circuit {
            match item {
                CircuitItem::Instruction(inst) => {
                    if !inst.args.is_empty() {
                        let data = rimfax_ir::gate_data(&inst.name).unwrap();
                        assert!(
                            data.is_noisy_gate,
                            "unexpected args on {inst}",
                        );
                    }
                }
                CircuitItem::Repeat(block) => check(&block.body),
            }
        }
    }
    check(&noisy);
    assert_eq!(count_instructions(&noisy, "MPP"), 1);
    let mpp = instructions(&noisy)
        .into_iter()
        .find(|op| op.name == "MPP")
        .unwrap();
    assert_eq!(mpp.args, vec![0.001]);
}

#[test]
fn test_measurement_with_existing_args_is_rejected() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let err = model
        .noisy_circuit(&circuit("M(0.25) 0"), None, None)
        .unwrap_err();
    assert!(matches!(err, NoiseError::UnexpectedMeasurementArgs { .. }));
}

#[test]
fn test_tick_noise() {
    let model = NoiseModel {
        tick_noise: Some(
            NoiseRule::builder()
                .after("Y_ERROR", 0.125)
                .build()
                .unwrap(),
        ),
        any_clifford_1q_rule: Some(NoiseRule::none()),
        ..Default::default()
    };
    let system: FxHashSet<u32> = [0, 1].into_iter().collect();
    let noisy = model
        .noisy_circuit(&circuit("H 0\nTICK\nH 1"), Some(&system), None)
        .unwrap();
    assert_eq!(
        noisy.to_string(),
        "H 0\nY_ERROR(0.125) 0 1\nTICK\nH 1\nY_ERROR(0.125) 0 1"
    );
}

#[test]
fn test_bare_noise_without_rule_is_fatal() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let err = model
        .noisy_circuit(&circuit("DEPOLARIZE1(0.1) 0"), None, None)
        .unwrap_err();
    assert!(matches!(err, NoiseError::NoNoiseSpecified { .. }));
}

#[test]
fn test_skipping_mpp_boundaries() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let input = circuit("MPP X0*X1\nTICK\nH 0\nTICK\nMPP Z0");
    let noisy = model
        .noisy_circuit_skipping_mpp_boundaries(&input, None)
        .unwrap();
    assert_eq!(
        noisy.to_string(),
        "MPP X0*X1\n\
         TICK\n\
         H 0\n\
         DEPOLARIZE1(0.001) 0\n\
         TICK\n\
         MPP Z0"
    );
}

#[test]
fn test_skipping_mpp_boundaries_requires_body() {
    let model = NoiseModel::uniform_depolarizing(0.001, false).unwrap();
    let err = model
        .noisy_circuit_skipping_mpp_boundaries(&circuit("MPP X0*X1\nTICK\nMPP Z0"), None)
        .unwrap_err();
    assert!(matches!(err, NoiseError::EmptyBody));
}

#[test]
fn test_empty_moments_still_idle() {
    let model = NoiseModel::uniform_depolarizing(0.5, false).unwrap();
    let system: FxHashSet<u32> = [0].into_iter().collect();
    let noisy = model
        .noisy_circuit(&circuit("H 0\nTICK\nTICK\nM 0"), Some(&system), None)
        .unwrap();
    assert_eq!(
        noisy.to_string(),
        "H 0\n\
         DEPOLARIZE1(0.5) 0\n\
         TICK\n\
         DEPOLARIZE1(0.5) 0\n\
         TICK\n\
         M(0.5) 0\n\
         DEPOLARIZE1(0.5) 0"
    );
}

#[test]
fn test_serde_roundtrip_of_model() {
    let model = NoiseModel::si1000(0.002).unwrap();
    let json = serde_json::to_string(&model).unwrap();
    let back: NoiseModel = serde_json::from_str(&json).unwrap();
    assert_eq!(back.idle_depolarization, model.idle_depolarization);
    assert_eq!(back.measure_rules["ZZ"], model.measure_rules["ZZ"]);
}
