//! Benchmarks for Rimfax circuit parsing and printing
//!
//! Run with: cargo bench -p rimfax-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rimfax_ir::{Circuit, GateTarget};

/// Build a repetitive memory-experiment-shaped circuit.
fn sample_circuit(rounds: u64, qubits: u32) -> Circuit {
    let mut body = Circuit::new();
    for q in 0..qubits {
        body.append("H", [GateTarget::Qubit(q)], []).unwrap();
    }
    body.append("TICK", [], []).unwrap();
    for q in (0..qubits.saturating_sub(1)).step_by(2) {
        body.append("CX", [GateTarget::Qubit(q), GateTarget::Qubit(q + 1)], [])
            .unwrap();
    }
    body.append("TICK", [], []).unwrap();

    let mut circuit = Circuit::new();
    for q in 0..qubits {
        circuit.append("R", [GateTarget::Qubit(q)], []).unwrap();
    }
    circuit.append("TICK", [], []).unwrap();
    circuit.append_repeat(body, rounds);
    for q in 0..qubits {
        circuit.append("M", [GateTarget::Qubit(q)], []).unwrap();
    }
    circuit
}

fn bench_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("print");
    for qubits in &[4u32, 16, 64] {
        let circuit = sample_circuit(25, *qubits);
        group.bench_with_input(BenchmarkId::new("to_string", qubits), &circuit, |b, c| {
            b.iter(|| black_box(c).to_string());
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for qubits in &[4u32, 16, 64] {
        let text = sample_circuit(25, *qubits).to_string();
        group.bench_with_input(BenchmarkId::new("from_str", qubits), &text, |b, t| {
            b.iter(|| black_box(t).parse::<Circuit>().unwrap());
        });
    }
    group.finish();
}

fn bench_num_qubits(c: &mut Criterion) {
    let circuit = sample_circuit(25, 64);
    c.bench_function("num_qubits", |b| {
        b.iter(|| black_box(&circuit).num_qubits());
    });
}

criterion_group!(benches, bench_print, bench_parse, bench_num_qubits);
criterion_main!(benches);
