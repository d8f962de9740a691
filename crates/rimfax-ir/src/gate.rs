//! Gate-data registry.
//!
//! Every gate name that may appear in a circuit is described by a
//! [`GateData`] record: whether it is unitary, how many qubits it acts on,
//! whether it collapses state or produces measurement results, whether it is
//! a noise channel, and how many parenthesized arguments it accepts.
//! Lookups for unknown names are a fatal [`IrError::UnknownGate`].

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

use crate::error::{IrError, IrResult};

/// Annotation operations: metadata rather than physical action.
pub const ANNOTATION_OPS: [&str; 6] = [
    "DETECTOR",
    "OBSERVABLE_INCLUDE",
    "QUBIT_COORDS",
    "SHIFT_COORDS",
    "TICK",
    "MPAD",
];

/// Check if a gate name is an annotation operation.
pub fn is_annotation(name: &str) -> bool {
    ANNOTATION_OPS.contains(&name)
}

/// The allowed number of parenthesized arguments for a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgRange {
    /// Minimum allowed argument count.
    pub min: usize,
    /// Maximum allowed argument count.
    pub max: usize,
}

impl ArgRange {
    /// No arguments allowed.
    pub const NONE: ArgRange = ArgRange { min: 0, max: 0 };

    /// Any number of arguments allowed.
    pub const ANY: ArgRange = ArgRange {
        min: 0,
        max: usize::MAX,
    };

    /// Exactly `n` arguments.
    pub const fn exactly(n: usize) -> Self {
        ArgRange { min: n, max: n }
    }

    /// Between zero and `n` arguments.
    pub const fn up_to(n: usize) -> Self {
        ArgRange { min: 0, max: n }
    }

    /// Check whether `n` arguments are acceptable.
    pub fn contains(self, n: usize) -> bool {
        self.min <= n && n <= self.max
    }
}

/// Classification data for a named gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateData {
    /// Canonical gate name.
    pub name: &'static str,
    /// Whether the gate implements a unitary operation.
    pub is_unitary: bool,
    /// Whether the gate acts on individual qubits.
    pub is_single_qubit_gate: bool,
    /// Whether the gate acts on qubit pairs.
    pub is_two_qubit_gate: bool,
    /// Whether the gate projectively reinitializes its targets.
    pub is_reset: bool,
    /// Whether the gate appends results to the measurement record.
    pub produces_measurements: bool,
    /// Whether the gate is probabilistic (a noise channel, or a measurement
    /// accepting a flip probability).
    pub is_noisy_gate: bool,
    /// Allowed parenthesized argument counts.
    pub parens_args: ArgRange,
}

impl GateData {
    const fn annotation(name: &'static str, parens_args: ArgRange) -> Self {
        GateData {
            name,
            is_unitary: false,
            is_single_qubit_gate: false,
            is_two_qubit_gate: false,
            is_reset: false,
            produces_measurements: false,
            is_noisy_gate: false,
            parens_args,
        }
    }

    const fn record_padding(name: &'static str) -> Self {
        let mut data = Self::annotation(name, ArgRange::NONE);
        data.produces_measurements = true;
        data
    }

    const fn unitary_1q(name: &'static str) -> Self {
        let mut data = Self::annotation(name, ArgRange::NONE);
        data.is_unitary = true;
        data.is_single_qubit_gate = true;
        data
    }

    const fn unitary_2q(name: &'static str) -> Self {
        let mut data = Self::annotation(name, ArgRange::NONE);
        data.is_unitary = true;
        data.is_two_qubit_gate = true;
        data
    }

    const fn reset_1q(name: &'static str) -> Self {
        let mut data = Self::annotation(name, ArgRange::NONE);
        data.is_reset = true;
        data.is_single_qubit_gate = true;
        data
    }

    const fn measure(name: &'static str, single: bool, two: bool, reset: bool) -> Self {
        let mut data = Self::annotation(name, ArgRange::up_to(1));
        data.is_single_qubit_gate = single;
        data.is_two_qubit_gate = two;
        data.is_reset = reset;
        data.produces_measurements = true;
        data.is_noisy_gate = true;
        data
    }

    const fn noise(name: &'static str, single: bool, two: bool, args: usize) -> Self {
        let mut data = Self::annotation(name, ArgRange::exactly(args));
        data.is_single_qubit_gate = single;
        data.is_two_qubit_gate = two;
        data.is_noisy_gate = true;
        data
    }
}

/// Every gate the IR understands, keyed by canonical name.
static GATE_TABLE: &[GateData] = &[
    // Annotations
    GateData::annotation("TICK", ArgRange::NONE),
    GateData::annotation("DETECTOR", ArgRange::ANY),
    GateData::annotation("OBSERVABLE_INCLUDE", ArgRange::exactly(1)),
    GateData::annotation("QUBIT_COORDS", ArgRange::ANY),
    GateData::annotation("SHIFT_COORDS", ArgRange::ANY),
    GateData::record_padding("MPAD"),
    // Single-qubit Clifford rotations (all 24, by canonical name)
    GateData::unitary_1q("I"),
    GateData::unitary_1q("X"),
    GateData::unitary_1q("Y"),
    GateData::unitary_1q("Z"),
    GateData::unitary_1q("H"),
    GateData::unitary_1q("H_XY"),
    GateData::unitary_1q("H_YZ"),
    GateData::unitary_1q("H_NXY"),
    GateData::unitary_1q("H_NXZ"),
    GateData::unitary_1q("H_NYZ"),
    GateData::unitary_1q("S"),
    GateData::unitary_1q("S_DAG"),
    GateData::unitary_1q("SQRT_X"),
    GateData::unitary_1q("SQRT_X_DAG"),
    GateData::unitary_1q("SQRT_Y"),
    GateData::unitary_1q("SQRT_Y_DAG"),
    GateData::unitary_1q("C_XYZ"),
    GateData::unitary_1q("C_ZYX"),
    GateData::unitary_1q("C_NXYZ"),
    GateData::unitary_1q("C_XNYZ"),
    GateData::unitary_1q("C_XYNZ"),
    GateData::unitary_1q("C_ZYNX"),
    GateData::unitary_1q("C_ZNYX"),
    GateData::unitary_1q("C_NZYX"),
    // Two-qubit Clifford gates
    GateData::unitary_2q("CX"),
    GateData::unitary_2q("CY"),
    GateData::unitary_2q("CZ"),
    GateData::unitary_2q("XCX"),
    GateData::unitary_2q("XCY"),
    GateData::unitary_2q("XCZ"),
    GateData::unitary_2q("YCX"),
    GateData::unitary_2q("YCY"),
    GateData::unitary_2q("YCZ"),
    GateData::unitary_2q("SWAP"),
    GateData::unitary_2q("ISWAP"),
    GateData::unitary_2q("ISWAP_DAG"),
    GateData::unitary_2q("CXSWAP"),
    GateData::unitary_2q("SWAPCX"),
    GateData::unitary_2q("SQRT_XX"),
    GateData::unitary_2q("SQRT_XX_DAG"),
    GateData::unitary_2q("SQRT_YY"),
    GateData::unitary_2q("SQRT_YY_DAG"),
    GateData::unitary_2q("SQRT_ZZ"),
    GateData::unitary_2q("SQRT_ZZ_DAG"),
    // Resets
    GateData::reset_1q("R"),
    GateData::reset_1q("RX"),
    GateData::reset_1q("RY"),
    // Measurements
    GateData::measure("M", true, false, false),
    GateData::measure("MX", true, false, false),
    GateData::measure("MY", true, false, false),
    GateData::measure("MXX", false, true, false),
    GateData::measure("MYY", false, true, false),
    GateData::measure("MZZ", false, true, false),
    GateData::measure("MPP", false, false, false),
    // Measure-and-reset composites
    GateData::measure("MR", true, false, true),
    GateData::measure("MRX", true, false, true),
    GateData::measure("MRY", true, false, true),
    // Noise channels
    GateData::noise("DEPOLARIZE1", true, false, 1),
    GateData::noise("DEPOLARIZE2", false, true, 1),
    GateData::noise("X_ERROR", true, false, 1),
    GateData::noise("Y_ERROR", true, false, 1),
    GateData::noise("Z_ERROR", true, false, 1),
    GateData::noise("PAULI_CHANNEL_1", true, false, 3),
    GateData::noise("PAULI_CHANNEL_2", false, true, 15),
];

/// Alternate spellings accepted on input.
static ALIASES: &[(&str, &str)] = &[
    ("MZ", "M"),
    ("RZ", "R"),
    ("MRZ", "MR"),
    ("H_XZ", "H"),
    ("SQRT_Z", "S"),
    ("SQRT_Z_DAG", "S_DAG"),
];

static REGISTRY: LazyLock<FxHashMap<&'static str, &'static GateData>> = LazyLock::new(|| {
    let mut map: FxHashMap<&'static str, &'static GateData> = FxHashMap::default();
    for data in GATE_TABLE {
        map.insert(data.name, data);
    }
    for (alias, canonical) in ALIASES {
        let data = map[canonical];
        map.insert(alias, data);
    }
    map
});

/// Look up the gate data for a name.
///
/// Unknown names are a fatal error.
pub fn gate_data(name: &str) -> IrResult<&'static GateData> {
    REGISTRY
        .get(name)
        .copied()
        .ok_or_else(|| IrError::UnknownGate(name.to_string()))
}
