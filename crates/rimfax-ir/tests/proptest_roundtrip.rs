//! Property-based tests for circuit text round-tripping.
//!
//! Tests that circuit → text → circuit preserves structure exactly.

use proptest::prelude::*;
use rimfax_ir::{Circuit, GateTarget};

/// Instructions that can be applied to a circuit under test.
#[derive(Debug, Clone)]
enum Op {
    H(u32),
    S(u32),
    X(u32),
    Cx(u32, u32),
    Swap(u32, u32),
    Tick,
    Measure(u32),
    Reset(u32),
    Depolarize(u32, u32),
}

impl Op {
    fn apply(&self, circuit: &mut Circuit) {
        let result = match *self {
            Op::H(q) => circuit.append("H", [GateTarget::Qubit(q)], []),
            Op::S(q) => circuit.append("S", [GateTarget::Qubit(q)], []),
            Op::X(q) => circuit.append("X", [GateTarget::Qubit(q)], []),
            Op::Cx(a, b) => circuit.append("CX", [GateTarget::Qubit(a), GateTarget::Qubit(b)], []),
            Op::Swap(a, b) => {
                circuit.append("SWAP", [GateTarget::Qubit(a), GateTarget::Qubit(b)], [])
            }
            Op::Tick => circuit.append("TICK", [], []),
            Op::Measure(q) => circuit.append("M", [GateTarget::Qubit(q)], []),
            Op::Reset(q) => circuit.append("R", [GateTarget::Qubit(q)], []),
            Op::Depolarize(q, milli) => circuit.append(
                "DEPOLARIZE1",
                [GateTarget::Qubit(q)],
                [f64::from(milli) / 1000.0],
            ),
        };
        result.unwrap();
    }
}

fn arb_op(num_qubits: u32) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..num_qubits).prop_map(Op::H),
        (0..num_qubits).prop_map(Op::S),
        (0..num_qubits).prop_map(Op::X),
        (0..num_qubits, 0..num_qubits).prop_map(|(a, b)| Op::Cx(a, b)),
        (0..num_qubits, 0..num_qubits).prop_map(|(a, b)| Op::Swap(a, b)),
        Just(Op::Tick),
        (0..num_qubits).prop_map(Op::Measure),
        (0..num_qubits).prop_map(Op::Reset),
        (0..num_qubits, 1u32..999).prop_map(|(q, m)| Op::Depolarize(q, m)),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (1u32..=5).prop_flat_map(|num_qubits| {
        (
            prop::collection::vec(arb_op(num_qubits), 1..=20),
            prop::option::of((prop::collection::vec(arb_op(num_qubits), 1..=5), 1u64..=10)),
        )
            .prop_map(|(ops, block)| {
                let mut circuit = Circuit::new();
                for op in &ops {
                    op.apply(&mut circuit);
                }
                if let Some((body_ops, reps)) = block {
                    let mut body = Circuit::new();
                    for op in &body_ops {
                        op.apply(&mut body);
                    }
                    circuit.append_repeat(body, reps);
                }
                circuit
            })
    })
}

proptest! {
    #[test]
    fn text_roundtrip_preserves_circuit(circuit in arb_circuit()) {
        let text = circuit.to_string();
        let reparsed: Circuit = text.parse().unwrap();
        prop_assert_eq!(&reparsed, &circuit);
        prop_assert_eq!(reparsed.to_string(), text);
    }

    #[test]
    fn serde_roundtrip_preserves_circuit(circuit in arb_circuit()) {
        let json = serde_json::to_string(&circuit).unwrap();
        let reparsed: Circuit = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(reparsed, circuit);
    }
}
