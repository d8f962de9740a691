//! Circuits: ordered sequences of instructions and repeat blocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IrError, IrResult};
use crate::gate::gate_data;
use crate::instruction::Instruction;
use crate::target::GateTarget;

/// A block of circuit repeated a fixed number of times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatBlock {
    /// The repeated body.
    pub body: Circuit,
    /// How many times the body runs.
    pub repetitions: u64,
}

/// One top-level element of a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CircuitItem {
    /// A single instruction.
    Instruction(Instruction),
    /// A repeat block.
    Repeat(RepeatBlock),
}

impl CircuitItem {
    /// The item's name: the gate name, or `REPEAT` for blocks.
    pub fn name(&self) -> &str {
        match self {
            CircuitItem::Instruction(inst) => &inst.name,
            CircuitItem::Repeat(_) => "REPEAT",
        }
    }

    /// Get the instruction, if this item is one.
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            CircuitItem::Instruction(inst) => Some(inst),
            CircuitItem::Repeat(_) => None,
        }
    }
}

/// An ordered sequence of instructions and repeat blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    items: Vec<CircuitItem>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a circuit from a list of items.
    pub fn from_items(items: Vec<CircuitItem>) -> Self {
        Self { items }
    }

    /// The circuit's items.
    pub fn items(&self) -> &[CircuitItem] {
        &self.items
    }

    /// Number of top-level items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the circuit has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a validated instruction built from parts.
    ///
    /// The gate name must be known to the registry and the argument count
    /// must be inside the gate's declared range.
    pub fn append(
        &mut self,
        name: impl Into<String>,
        targets: impl IntoIterator<Item = GateTarget>,
        args: impl IntoIterator<Item = f64>,
    ) -> IrResult<()> {
        self.append_instruction(Instruction::new(name, targets, args))
    }

    /// Append a validated instruction.
    pub fn append_instruction(&mut self, inst: Instruction) -> IrResult<()> {
        let data = gate_data(&inst.name)?;
        if !data.parens_args.contains(inst.args.len()) {
            return Err(IrError::ArgCountMismatch {
                name: inst.name,
                min: data.parens_args.min,
                max: data.parens_args.max,
                got: inst.args.len(),
            });
        }
        self.items.push(CircuitItem::Instruction(inst));
        Ok(())
    }

    /// Append a repeat block.
    pub fn append_repeat(&mut self, body: Circuit, repetitions: u64) {
        self.items
            .push(CircuitItem::Repeat(RepeatBlock { body, repetitions }));
    }

    /// Append all of another circuit's items.
    pub fn extend_from(&mut self, other: &Circuit) {
        self.items.extend_from_slice(&other.items);
    }

    /// The last top-level item, if any.
    pub fn last_item(&self) -> Option<&CircuitItem> {
        self.items.last()
    }

    /// Iterate the top-level items.
    pub fn iter(&self) -> impl Iterator<Item = &CircuitItem> {
        self.items.iter()
    }

    /// The number of qubits: one past the highest qubit index any target
    /// mentions, including inside repeat blocks.
    pub fn num_qubits(&self) -> usize {
        let mut max: Option<u32> = None;
        self.visit_instructions(&mut |inst| {
            for q in inst.qubit_values() {
                max = Some(max.map_or(q, |m| m.max(q)));
            }
        });
        max.map_or(0, |m| m as usize + 1)
    }

    fn visit_instructions(&self, f: &mut impl FnMut(&Instruction)) {
        for item in &self.items {
            match item {
                CircuitItem::Instruction(inst) => f(inst),
                CircuitItem::Repeat(block) => block.body.visit_instructions(f),
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        let mut first = true;
        for item in &self.items {
            if !first {
                writeln!(f)?;
            }
            first = false;
            match item {
                CircuitItem::Instruction(inst) => write!(f, "{pad}{inst}")?,
                CircuitItem::Repeat(block) => {
                    writeln!(f, "{pad}REPEAT {} {{", block.repetitions)?;
                    if !block.body.is_empty() {
                        block.body.fmt_indented(f, indent + 4)?;
                        writeln!(f)?;
                    }
                    write!(f, "{pad}}}")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl FromStr for Circuit {
    type Err = IrError;

    fn from_str(s: &str) -> IrResult<Self> {
        crate::parse::parse_circuit(s)
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a CircuitItem;
    type IntoIter = std::slice::Iter<'a, CircuitItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Pauli;

    #[test]
    fn test_append_validates_name() {
        let mut c = Circuit::new();
        assert!(c.append("H", [GateTarget::Qubit(0)], []).is_ok());
        assert!(matches!(
            c.append("NOPE", [GateTarget::Qubit(0)], []),
            Err(IrError::UnknownGate(_))
        ));
    }

    #[test]
    fn test_append_validates_arg_count() {
        let mut c = Circuit::new();
        assert!(matches!(
            c.append("H", [GateTarget::Qubit(0)], [0.5]),
            Err(IrError::ArgCountMismatch { .. })
        ));
        assert!(c.append("M", [GateTarget::Qubit(0)], [0.01]).is_ok());
        assert!(matches!(
            c.append("M", [GateTarget::Qubit(0)], [0.01, 0.02]),
            Err(IrError::ArgCountMismatch { .. })
        ));
    }

    #[test]
    fn test_num_qubits() {
        let mut body = Circuit::new();
        body.append("CX", [GateTarget::Qubit(2), GateTarget::Qubit(7)], [])
            .unwrap();
        let mut c = Circuit::new();
        c.append("H", [GateTarget::Qubit(0)], []).unwrap();
        c.append_repeat(body, 5);
        c.append(
            "MPP",
            [
                GateTarget::pauli(Pauli::X, 3),
                GateTarget::Combiner,
                GateTarget::pauli(Pauli::X, 4),
            ],
            [],
        )
        .unwrap();
        assert_eq!(c.num_qubits(), 8);
        assert_eq!(Circuit::new().num_qubits(), 0);
    }

    #[test]
    fn test_display_repeat() {
        let mut body = Circuit::new();
        body.append("H", [GateTarget::Qubit(0)], []).unwrap();
        body.append("TICK", [], []).unwrap();
        let mut c = Circuit::new();
        c.append("R", [GateTarget::Qubit(0)], []).unwrap();
        c.append_repeat(body, 3);
        c.append("M", [GateTarget::Qubit(0)], []).unwrap();
        assert_eq!(
            c.to_string(),
            "R 0\nREPEAT 3 {\n    H 0\n    TICK\n}\nM 0"
        );
    }
}
