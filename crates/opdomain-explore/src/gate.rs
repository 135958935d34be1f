//! Maps gate layout names to the Boolean functions they
//! must implement.
//!
//! Layout files are named `<type>_<variant>.<ext>`, e.g. `or_bestagon.sqd`.
//! The gate type is the file stem up to the first `_`; it selects the
//! expected truth tables an operational oracle checks the layout against.

use crate::error::ExploreError;
use std::fmt;
use std::path::Path;

/// Largest supported truth table (64 bits).
pub const MAX_VARS: u8 = 6;

/// Complete truth table of a Boolean function of up to [`MAX_VARS`] inputs.
///
/// Bit `i` is the output for the input assignment whose binary encoding is
/// `i` (input 0 is the least significant bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TruthTable {
    num_vars: u8,
    bits: u64,
}

impl TruthTable {
    /// Parse a binary string, most significant bit (highest input
    /// assignment) first. The length must be `2^n` with `n <= MAX_VARS`.
    pub fn from_binary_string(s: &str) -> Result<Self, ExploreError> {
        let invalid = || ExploreError::InvalidTruthTable(s.to_string());

        let len = s.len();
        if len == 0 || !len.is_power_of_two() || len > 1 << MAX_VARS {
            return Err(invalid());
        }

        let mut bits = 0u64;
        for c in s.chars() {
            bits = (bits << 1)
                | match c {
                    '0' => 0,
                    '1' => 1,
                    _ => return Err(invalid()),
                };
        }
        Ok(Self {
            num_vars: len.trailing_zeros() as u8,
            bits,
        })
    }

    /// The projection onto input `var`.
    pub fn nth_var(num_vars: u8, var: u8) -> Self {
        let mut table = Self { num_vars, bits: 0 };
        for row in 0..table.num_bits() {
            if (row >> var) & 1 == 1 {
                table.bits |= 1 << row;
            }
        }
        table
    }

    pub fn num_vars(&self) -> u8 {
        self.num_vars
    }

    pub fn num_bits(&self) -> usize {
        1 << self.num_vars
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Output for the input assignment `row`.
    pub fn output(&self, row: usize) -> bool {
        row < self.num_bits() && (self.bits >> row) & 1 == 1
    }

    pub fn complement(&self) -> Self {
        let mask = if self.num_bits() == 64 {
            u64::MAX
        } else {
            (1u64 << self.num_bits()) - 1
        };
        Self {
            num_vars: self.num_vars,
            bits: !self.bits & mask,
        }
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.num_bits()).rev() {
            f.write_str(if self.output(row) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Gate types with known expected functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateType {
    Or,
    Wire,
    Not,
    DoubleWire,
    Majority,
}

impl GateType {
    pub fn from_name(name: &str) -> Result<Self, ExploreError> {
        match name {
            "or" => Ok(GateType::Or),
            "wire" => Ok(GateType::Wire),
            "not" => Ok(GateType::Not),
            "wire2" => Ok(GateType::DoubleWire),
            "maj" => Ok(GateType::Majority),
            other => Err(ExploreError::UnknownGate(other.to_string())),
        }
    }

    /// Expected output functions, one per gate output.
    pub fn truth_tables(self) -> Vec<TruthTable> {
        match self {
            GateType::Or => {
                let a = TruthTable::nth_var(2, 0);
                let b = TruthTable::nth_var(2, 1);
                vec![TruthTable {
                    num_vars: 2,
                    bits: a.bits | b.bits,
                }]
            }
            GateType::Wire => vec![TruthTable::nth_var(1, 0)],
            GateType::Not => vec![TruthTable::nth_var(1, 0).complement()],
            GateType::DoubleWire => vec![TruthTable::nth_var(2, 1), TruthTable::nth_var(2, 0)],
            // Majority as seen through the inverted inputs of the QCA-style layouts.
            GateType::Majority => vec![TruthTable {
                num_vars: 3,
                bits: 0b0010_1011,
            }],
        }
    }
}

/// Gate type prefix of a layout name: the file stem up to the first `_`.
///
/// `"gates/or_bestagon.sqd"` → `"or"`, `"wire"` → `"wire"`.
pub fn gate_type_from_name(name: &str) -> &str {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    stem.split('_').next().unwrap_or(stem)
}

/// A named gate layout and the functions it must implement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSpec {
    /// Layout name without directory and extension.
    pub name: String,
    pub gate_type: GateType,
    pub truth_tables: Vec<TruthTable>,
}

/// Resolves layout names to gate specifications.
pub struct GateCatalog;

impl GateCatalog {
    /// Expected truth tables for the gate named `name` (a layout file name
    /// or path; only the type prefix matters).
    pub fn resolve(name: &str) -> Result<Vec<TruthTable>, ExploreError> {
        Ok(GateType::from_name(gate_type_from_name(name))?.truth_tables())
    }

    /// Full specification for the layout named `name`.
    pub fn spec(name: &str) -> Result<GateSpec, ExploreError> {
        let gate_type = GateType::from_name(gate_type_from_name(name))?;
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        Ok(GateSpec {
            name: stem.to_string(),
            gate_type,
            truth_tables: gate_type.truth_tables(),
        })
    }
}
