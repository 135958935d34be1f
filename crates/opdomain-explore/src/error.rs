//! Errors from the exploration engine.

use crate::domain::Exploration;
use crate::oracle::OracleError;
use crate::space::{Point, SweepParameter};
use thiserror::Error;

/// Errors from the exploration engine.
///
/// Running out of evaluation budget or trace iterations is not an error:
/// those runs return normally with a partial [`Completeness`] marker.
///
/// [`Completeness`]: crate::domain::Completeness
#[derive(Error, Debug)]
pub enum ExploreError {
    #[error("dimension {index} is invalid: {reason}")]
    InvalidDimension { index: usize, reason: String },

    #[error("dimension {index} sweeps {parameter} a second time")]
    DuplicateParameter {
        index: usize,
        parameter: SweepParameter,
    },

    #[error("parameter space has no dimensions")]
    EmptySpace,

    #[error("invalid seed {point}: {reason}")]
    InvalidSeed { point: Point, reason: String },

    #[error("{strategy} requires {expected} dimensions, space has {found}")]
    UnsupportedDimensions {
        strategy: &'static str,
        expected: usize,
        found: usize,
    },

    /// The oracle failed; exploration halted. `partial` holds everything
    /// sampled before the failing point.
    #[error("oracle failed at {point}: {source}")]
    OracleFailure {
        point: Point,
        #[source]
        source: OracleError,
        partial: Box<Exploration>,
    },

    #[error("critical temperature of {gate} failed: {source}")]
    CriticalTemperature {
        gate: String,
        #[source]
        source: OracleError,
    },

    #[error("operational fraction is undefined: no points were evaluated")]
    DivisionUndefined,

    #[error("unknown gate type '{0}'")]
    UnknownGate(String),

    #[error("invalid truth table '{0}': expected a binary string of length 2^n")]
    InvalidTruthTable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ExploreError {
    /// The exploration computed before an oracle failure, if any.
    pub fn partial_exploration(&self) -> Option<&Exploration> {
        match self {
            ExploreError::OracleFailure { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
