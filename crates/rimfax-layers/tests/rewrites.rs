//! End-to-end tests for the rewrite passes.

use rimfax_ir::Circuit;
use rimfax_layers::{Layer, LayerCircuit, LayerError, LayerKind};

fn layered(text: &str) -> LayerCircuit {
    LayerCircuit::from_circuit(&text.parse::<Circuit>().unwrap()).unwrap()
}

fn kinds(circuit: &LayerCircuit) -> Vec<LayerKind> {
    circuit.layers.iter().map(Layer::kind).collect()
}

#[test]
fn test_cancelling_rotations_collapse() {
    let optimized = layered("R 0\nTICK\nH 0\nTICK\nH 0\nTICK\nM 0")
        .with_locally_optimized_layers()
        .with_irrelevant_tail_layers_removed();
    assert_eq!(optimized.to_circuit().to_string(), "R 0\nTICK\nM 0");
}

#[test]
fn test_feedback_survives_rotation_passes() {
    let text = "M 0\nTICK\nCX rec[-1] 1\nTICK\nH 1";
    let rewritten = layered(text)
        .with_whole_rotation_layers_slid_earlier()
        .with_rotations_merged_earlier()
        .with_clearable_rotation_layers_cleared();
    assert_eq!(rewritten.to_circuit().to_string(), text);
}

#[test]
fn test_loop_ejection() {
    let ejected = layered("REPEAT 5 {\n    H 0\n    TICK\n}").with_ejected_loop_iterations();
    assert_eq!(
        kinds(&ejected),
        vec![
            LayerKind::Rotation,
            LayerKind::Empty,
            LayerKind::Loop,
            LayerKind::Rotation,
            LayerKind::Empty,
        ]
    );
    let Layer::Loop(inner) = &ejected.layers[2] else {
        panic!("expected loop");
    };
    assert_eq!(inner.repetitions, 3);
    assert_eq!(inner.body.layers.len(), 2);
}

#[test]
fn test_loop_ejection_small_counts() {
    let ejected = layered("REPEAT 2 {\n    H 0\n    TICK\n}").with_ejected_loop_iterations();
    assert_eq!(ejected.layers.len(), 4);
    assert!(!kinds(&ejected).contains(&LayerKind::Loop));

    let ejected = layered("REPEAT 1 {\n    H 0\n    TICK\n}").with_ejected_loop_iterations();
    assert_eq!(ejected.layers.len(), 2);

    let ejected = layered("REPEAT 0 {\n    H 0\n    TICK\n}").with_ejected_loop_iterations();
    assert!(ejected.layers.is_empty());
}

#[test]
fn test_rotations_before_resets_removed() {
    let rewritten = layered("H 0\nTICK\nR 0").with_rotations_before_resets_removed();
    assert_eq!(rewritten.to_circuit().to_string(), "R 0");

    // A rotation whose qubit is measured first must stay.
    let rewritten = layered("H 0\nTICK\nM 0\nTICK\nR 0").with_rotations_before_resets_removed();
    assert_eq!(rewritten.to_circuit().to_string(), "H 0\nTICK\nM 0\nTICK\nR 0");
}

#[test]
fn test_rotations_before_resets_removed_across_loop_boundary() {
    // The H at the end of each iteration is undone by the next iteration's
    // reset, and by the loop-exit reset of the trailing layer.
    let rewritten = layered(
        "REPEAT 3 {\n    R 0\n    TICK\n    H 0\n    TICK\n}\nR 0",
    )
    .with_rotations_before_resets_removed();
    assert_eq!(
        rewritten.to_circuit().to_string(),
        "REPEAT 3 {\n    R 0\n    TICK\n}\nR 0"
    );
}

#[test]
fn test_clearable_rotation_layers_cleared() {
    let rewritten = layered("H 0\nTICK\nX 1\nTICK\nH 0")
        .with_clearable_rotation_layers_cleared()
        .with_locally_optimized_layers();
    assert_eq!(rewritten.to_circuit().to_string(), "X 1");
}

#[test]
fn test_rotations_merged_earlier() {
    let rewritten = layered("H 0\nTICK\nS 0").with_rotations_merged_earlier();
    assert_eq!(rewritten.to_circuit().to_string(), "C_ZYX 0");
}

#[test]
fn test_whole_rotation_layer_slides_earlier() {
    let rewritten = layered("CX 0 1\nTICK\nH 2").with_whole_rotation_layers_slid_earlier();
    assert_eq!(rewritten.to_circuit().to_string(), "H 2\nTICK\nCX 0 1");

    // Touching qubits block the slide.
    let blocked = layered("CX 0 1\nTICK\nH 1").with_whole_rotation_layers_slid_earlier();
    assert_eq!(blocked.to_circuit().to_string(), "CX 0 1\nTICK\nH 1");
}

#[test]
fn test_measurement_slide_adjusts_rec_offsets() {
    let rewritten =
        layered("M 0\nDETECTOR rec[-1]\nTICK\nM 1").with_whole_measurement_layers_slid_earlier();
    assert_eq!(
        rewritten.to_circuit().to_string(),
        "M 0 1\nDETECTOR rec[-2]"
    );
}

#[test]
fn test_locally_merged_measure_layers() {
    let rewritten =
        layered("M 0\nDETECTOR rec[-1]\nM 1").with_locally_merged_measure_layers();
    assert_eq!(
        rewritten.to_circuit().to_string(),
        "M 0 1\nDETECTOR rec[-2]"
    );

    // Overlapping targets cannot merge; the separating TICK re-derives.
    let kept = layered("M 0\nDETECTOR rec[-1]\nM 0").with_locally_merged_measure_layers();
    assert_eq!(kept.to_circuit().to_string(), "M 0\nDETECTOR rec[-1]\nTICK\nM 0");
}

#[test]
fn test_whole_layers_slid_to_merge() {
    let rewritten = layered("M 0\nTICK\nH 2\nTICK\nM 1")
        .with_whole_layers_slid_as_to_merge_with_previous_layer_of_same_type(&[LayerKind::Measure]);
    assert_eq!(rewritten.to_circuit().to_string(), "M 0 1\nTICK\nH 2");
}

#[test]
fn test_rotation_rolled_from_end_of_loop() {
    let rewritten = layered("REPEAT 3 {\n    R 0\n    TICK\n    H 0\n    TICK\n}")
        .without_empty_layers()
        .with_rotations_rolled_from_end_of_loop_to_start_of_loop();
    // The loop body now starts with the rotation, surrounded by its inverse
    // before the loop and a copy after it.
    assert_eq!(
        kinds(&rewritten),
        vec![LayerKind::Rotation, LayerKind::Loop, LayerKind::Rotation]
    );
    let Layer::Loop(inner) = &rewritten.layers[1] else {
        panic!("expected loop");
    };
    assert!(matches!(inner.body.layers[0], Layer::Rotation(_)));
}

#[test]
fn test_cleaned_up_loop_iterations() {
    let rewritten = layered("H 0\nTICK\nREPEAT 2 {\n    H 0\n    TICK\n}\nH 0")
        .with_cleaned_up_loop_iterations();
    assert_eq!(
        rewritten.to_circuit().to_string(),
        "REPEAT 4 {\n    H 0\n    TICK\n}"
    );
}

#[test]
fn test_qubit_coords_hoisted_to_start() {
    let rewritten = layered("H 0\nTICK\nSHIFT_COORDS(10)\nQUBIT_COORDS(1) 3")
        .with_qubit_coords_at_start()
        .unwrap();
    assert_eq!(
        rewritten.to_circuit().to_string(),
        "QUBIT_COORDS(11) 3\nH 0\nSHIFT_COORDS(10)"
    );
}

#[test]
fn test_qubit_coords_duplicates_rejected() {
    let circuit = layered("QUBIT_COORDS(0) 0\nTICK\nQUBIT_COORDS(1) 0");
    assert!(matches!(
        circuit.with_qubit_coords_at_start(),
        Err(LayerError::DuplicateQubitCoords(_))
    ));
}

#[test]
fn test_qubit_coords_cannot_cross_loop() {
    let circuit = layered("REPEAT 2 {\n    H 0\n    TICK\n}\nQUBIT_COORDS(0) 1");
    assert!(matches!(
        circuit.with_qubit_coords_at_start(),
        Err(LayerError::CoordsAcrossLoop)
    ));
}

#[test]
fn test_irrelevant_tail_layers_removed() {
    let rewritten = layered("M 0\nTICK\nR 0\nTICK\nH 1\nTICK\nSWAP 0 1")
        .with_irrelevant_tail_layers_removed();
    assert_eq!(rewritten.to_circuit().to_string(), "M 0");
}

#[test]
fn test_touched_union_property() {
    let circuit = layered("H 0\nTICK\nCX 1 2\nTICK\nMPP X3*Z4\nTICK\nM 5");
    let mut union = rustc_hash::FxHashSet::default();
    for layer in &circuit.layers {
        union.extend(layer.touched());
    }
    assert_eq!(circuit.touched(), union);
    assert_eq!(circuit.touched().len(), 6);
}

#[test]
fn test_pass_idempotence() {
    let samples = [
        "R 0\nTICK\nH 0\nTICK\nH 0\nTICK\nM 0",
        "H 0\nTICK\nX 1\nTICK\nH 0",
        "M 0\nDETECTOR rec[-1]\nTICK\nM 1",
        "CX 0 1\nTICK\nH 2\nTICK\nR 2",
        "REPEAT 3 {\n    R 0\n    TICK\n    H 0\n    TICK\n}\nR 0",
        "QUBIT_COORDS(0) 0\nH 0\nTICK\nSWAP 0 1",
    ];
    type Pass = fn(&LayerCircuit) -> LayerCircuit;
    let passes: [(&str, Pass); 8] = [
        ("locally_optimized", |c| c.with_locally_optimized_layers()),
        ("rot_before_reset", |c| {
            c.with_rotations_before_resets_removed()
        }),
        ("clearable", |c| c.with_clearable_rotation_layers_cleared()),
        ("merged_earlier", |c| c.with_rotations_merged_earlier()),
        ("rot_slid", |c| c.with_whole_rotation_layers_slid_earlier()),
        ("meas_slid", |c| {
            c.with_whole_measurement_layers_slid_earlier()
        }),
        ("no_empty", |c| c.without_empty_layers()),
        ("tail", |c| c.with_irrelevant_tail_layers_removed()),
    ];
    for text in samples {
        for (name, pass) in passes {
            let once = pass(&layered(text));
            let twice = pass(&once);
            assert_eq!(once, twice, "pass {name} not idempotent on {text:?}");
        }
    }
}
