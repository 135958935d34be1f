//! Physical constants handed to the oracle.
//!
//! An exploration run starts from a base [`SimulationParameters`] and, for
//! every grid point, overwrites the swept parameters with the point's
//! values. Everything not swept keeps its base value.

use crate::space::{ParameterSpace, Point, SweepParameter};
use serde::{Deserialize, Serialize};

/// Physical constants of one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Number of charge states (2 or 3).
    pub base_number: u8,
    /// Charge transition level µ₋ (eV).
    pub mu_minus: f64,
    /// Relative permittivity.
    pub epsilon_r: f64,
    /// Thomas-Fermi screening length (nm).
    pub lambda_tf: f64,
}

impl SimulationParameters {
    pub fn new(base_number: u8, mu_minus: f64, epsilon_r: f64, lambda_tf: f64) -> Self {
        Self {
            base_number,
            mu_minus,
            epsilon_r,
            lambda_tf,
        }
    }

    /// The established SiQAD constants: `epsilon_r = 5.6`, `lambda_tf = 5 nm`.
    pub fn established(mu_minus: f64) -> Self {
        Self::new(3, mu_minus, 5.6, 5.0)
    }

    /// The revised constants: `epsilon_r = 4.1`, `lambda_tf = 1.8 nm`.
    pub fn revised(mu_minus: f64) -> Self {
        Self::new(3, mu_minus, 4.1, 1.8)
    }

    /// Current value of a sweepable parameter.
    pub fn get(&self, parameter: SweepParameter) -> f64 {
        match parameter {
            SweepParameter::EpsilonR => self.epsilon_r,
            SweepParameter::LambdaTf => self.lambda_tf,
            SweepParameter::MuMinus => self.mu_minus,
        }
    }

    /// Copy with one parameter replaced.
    pub fn with(mut self, parameter: SweepParameter, value: f64) -> Self {
        match parameter {
            SweepParameter::EpsilonR => self.epsilon_r = value,
            SweepParameter::LambdaTf => self.lambda_tf = value,
            SweepParameter::MuMinus => self.mu_minus = value,
        }
        self
    }

    /// Copy with every swept parameter set to `point`'s value in `space`.
    pub fn at_point(&self, space: &ParameterSpace, point: &Point) -> Self {
        space
            .dimensions()
            .iter()
            .zip(space.values(point))
            .fold(*self, |params, (dimension, value)| {
                params.with(dimension.parameter, value)
            })
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self::established(-0.32)
    }
}
