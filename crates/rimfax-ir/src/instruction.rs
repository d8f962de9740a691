//! Circuit instructions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::target::GateTarget;

/// A single named operation with its targets and parenthesized arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The gate name.
    pub name: String,
    /// Ordered operands.
    pub targets: Vec<GateTarget>,
    /// Ordered parenthesized arguments.
    pub args: Vec<f64>,
}

impl Instruction {
    /// Create an instruction. Validation against the gate registry happens
    /// when the instruction is appended to a [`crate::Circuit`].
    pub fn new(
        name: impl Into<String>,
        targets: impl IntoIterator<Item = GateTarget>,
        args: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            name: name.into(),
            targets: targets.into_iter().collect(),
            args: args.into_iter().collect(),
        }
    }

    /// Iterate the qubit indices of all non-combiner quantum targets.
    pub fn qubit_values(&self) -> impl Iterator<Item = u32> + '_ {
        self.targets.iter().filter_map(GateTarget::qubit_value)
    }
}

/// Format a float the way circuit files spell it: integral values print
/// without a decimal point.
pub(crate) fn format_arg(x: f64) -> String {
    if x == x.trunc() && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| format_arg(*a)).collect();
            write!(f, "({})", args.join(", "))?;
        }
        let mut after_combiner = false;
        for target in &self.targets {
            if target.is_combiner() {
                write!(f, "*")?;
                after_combiner = true;
            } else {
                if !after_combiner {
                    write!(f, " ")?;
                }
                write!(f, "{target}")?;
                after_combiner = false;
            }
        }
        Ok(())
    }
}
