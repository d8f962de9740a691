//! Gate targets and Pauli bases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single-qubit Pauli basis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Pauli {
    /// The X basis.
    X,
    /// The Y basis.
    Y,
    /// The Z basis.
    Z,
}

impl Pauli {
    /// The basis letter, as it appears in gate names and Pauli targets.
    #[inline]
    pub fn letter(self) -> char {
        match self {
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Parse a basis letter.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'X' => Some(Pauli::X),
            'Y' => Some(Pauli::Y),
            'Z' => Some(Pauli::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One operand of a circuit instruction.
///
/// Targets are either quantum (a qubit index, possibly decorated with a Pauli
/// basis), classical (a measurement-record back-reference or a sweep bit), or
/// the combiner token that joins Pauli targets into one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GateTarget {
    /// Plain qubit index (`3`).
    Qubit(u32),
    /// Pauli-X target on a qubit (`X3`).
    PauliX(u32),
    /// Pauli-Y target on a qubit (`Y3`).
    PauliY(u32),
    /// Pauli-Z target on a qubit (`Z3`).
    PauliZ(u32),
    /// Measurement-record back-reference (`rec[-2]`). The offset is negative.
    Rec(i32),
    /// Sweep-bit reference (`sweep[5]`).
    Sweep(u32),
    /// Joins adjacent Pauli targets into one product (`*`).
    Combiner,
}

impl GateTarget {
    /// A Pauli target in the given basis.
    pub fn pauli(basis: Pauli, qubit: u32) -> Self {
        match basis {
            Pauli::X => GateTarget::PauliX(qubit),
            Pauli::Y => GateTarget::PauliY(qubit),
            Pauli::Z => GateTarget::PauliZ(qubit),
        }
    }

    /// The qubit index, for plain-qubit and Pauli targets.
    #[inline]
    pub fn qubit_value(&self) -> Option<u32> {
        match self {
            GateTarget::Qubit(q)
            | GateTarget::PauliX(q)
            | GateTarget::PauliY(q)
            | GateTarget::PauliZ(q) => Some(*q),
            _ => None,
        }
    }

    /// The Pauli basis, for Pauli targets.
    #[inline]
    pub fn pauli_basis(&self) -> Option<Pauli> {
        match self {
            GateTarget::PauliX(_) => Some(Pauli::X),
            GateTarget::PauliY(_) => Some(Pauli::Y),
            GateTarget::PauliZ(_) => Some(Pauli::Z),
            _ => None,
        }
    }

    /// Check if this is a plain qubit target.
    pub fn is_qubit_target(&self) -> bool {
        matches!(self, GateTarget::Qubit(_))
    }

    /// Check if this is a Pauli target.
    pub fn is_pauli_target(&self) -> bool {
        self.pauli_basis().is_some()
    }

    /// Check if this is a measurement-record back-reference.
    pub fn is_measurement_record(&self) -> bool {
        matches!(self, GateTarget::Rec(_))
    }

    /// Check if this is a sweep-bit reference.
    pub fn is_sweep_bit(&self) -> bool {
        matches!(self, GateTarget::Sweep(_))
    }

    /// Check if this target lives in the classical control system.
    pub fn is_classical(&self) -> bool {
        self.is_measurement_record() || self.is_sweep_bit()
    }

    /// Check if this is the combiner token.
    pub fn is_combiner(&self) -> bool {
        matches!(self, GateTarget::Combiner)
    }
}

impl From<u32> for GateTarget {
    fn from(qubit: u32) -> Self {
        GateTarget::Qubit(qubit)
    }
}

impl fmt::Display for GateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateTarget::Qubit(q) => write!(f, "{q}"),
            GateTarget::PauliX(q) => write!(f, "X{q}"),
            GateTarget::PauliY(q) => write!(f, "Y{q}"),
            GateTarget::PauliZ(q) => write!(f, "Z{q}"),
            GateTarget::Rec(k) => write!(f, "rec[{k}]"),
            GateTarget::Sweep(k) => write!(f, "sweep[{k}]"),
            GateTarget::Combiner => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        assert_eq!(GateTarget::Qubit(5).to_string(), "5");
        assert_eq!(GateTarget::PauliX(0).to_string(), "X0");
        assert_eq!(GateTarget::PauliY(12).to_string(), "Y12");
        assert_eq!(GateTarget::Rec(-3).to_string(), "rec[-3]");
        assert_eq!(GateTarget::Sweep(2).to_string(), "sweep[2]");
        assert_eq!(GateTarget::Combiner.to_string(), "*");
    }

    #[test]
    fn test_target_classification() {
        assert!(GateTarget::Qubit(0).is_qubit_target());
        assert!(GateTarget::PauliZ(0).is_pauli_target());
        assert!(GateTarget::Rec(-1).is_classical());
        assert!(GateTarget::Sweep(0).is_classical());
        assert!(!GateTarget::Qubit(0).is_classical());
        assert_eq!(GateTarget::PauliY(7).qubit_value(), Some(7));
        assert_eq!(GateTarget::Rec(-1).qubit_value(), None);
        assert_eq!(GateTarget::Combiner.qubit_value(), None);
    }

    #[test]
    fn test_pauli_order() {
        assert!(Pauli::X < Pauli::Y);
        assert!(Pauli::Y < Pauli::Z);
        assert_eq!(Pauli::from_letter('Y'), Some(Pauli::Y));
        assert_eq!(Pauli::from_letter('Q'), None);
    }
}
