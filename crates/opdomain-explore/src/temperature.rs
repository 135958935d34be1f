//! Critical temperature of a gate under one set of physical constants.
//!
//! The critical temperature is the highest temperature at which the gate
//! still produces the correct output with the required confidence. It
//! follows from the energy gap between the correct ground state and the
//! lowest erroneous state: with a Boltzmann population of the two,
//! `P(correct) = 1 / (1 + exp(-E_gap / k_B T))`, which stays above the
//! confidence level `c` up to `T = E_gap / (k_B ln(c / (1 - c)))`.
//!
//! Like the operational check, the computation is an injected capability:
//! any `Fn(&SimulationParameters) -> Result<TemperatureEstimate, OracleError>`
//! closure implements [`CriticalTemperature`].

use crate::oracle::OracleError;
use crate::parameters::SimulationParameters;
use serde::{Deserialize, Serialize};

/// Boltzmann constant in meV/K.
pub const BOLTZMANN_MEV_PER_KELVIN: f64 = 8.617_333_262e-2;

/// Required probability of observing the correct output.
pub const DEFAULT_CONFIDENCE: f64 = 0.99;

/// Upper end of the temperature search (K).
pub const MAX_TEMPERATURE: f64 = 400.0;

/// Critical temperature and the energy gap it derives from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureEstimate {
    /// Kelvin, in `[0, MAX_TEMPERATURE]`.
    pub critical_temperature: f64,
    /// Energy between the ground state and the first erroneous state (meV).
    pub energy_gap: f64,
}

impl TemperatureEstimate {
    /// Estimate for an energy gap at [`DEFAULT_CONFIDENCE`].
    ///
    /// A non-positive gap means the ground state is already wrong, so the
    /// critical temperature is zero.
    pub fn from_energy_gap(energy_gap: f64) -> Self {
        Self {
            critical_temperature: critical_temperature(energy_gap, DEFAULT_CONFIDENCE),
            energy_gap,
        }
    }
}

/// Highest temperature (K) at which a two-state system with `energy_gap`
/// (meV) stays correct with probability `confidence`, capped at
/// [`MAX_TEMPERATURE`].
pub fn critical_temperature(energy_gap: f64, confidence: f64) -> f64 {
    if energy_gap.is_nan() || energy_gap <= 0.0 || !(0.5..1.0).contains(&confidence) {
        return 0.0;
    }
    let odds = (confidence / (1.0 - confidence)).ln();
    (energy_gap / (BOLTZMANN_MEV_PER_KELVIN * odds)).min(MAX_TEMPERATURE)
}

/// Computes the critical temperature of a gate at one set of constants.
pub trait CriticalTemperature {
    fn critical_temperature(
        &self,
        parameters: &SimulationParameters,
    ) -> Result<TemperatureEstimate, OracleError>;
}

impl<F> CriticalTemperature for F
where
    F: Fn(&SimulationParameters) -> Result<TemperatureEstimate, OracleError>,
{
    fn critical_temperature(
        &self,
        parameters: &SimulationParameters,
    ) -> Result<TemperatureEstimate, OracleError> {
        self(parameters)
    }
}
