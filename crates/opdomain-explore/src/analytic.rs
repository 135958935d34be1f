//! Closed-form operational models.
//!
//! Stand-ins for a physical simulator: each model decides operationality
//! from the physical constants alone, so the explorers can be run and
//! compared without a layout or a ground-state engine. [`GateOracle`] binds
//! a model to a gate and charges one simulator call per input pattern, the
//! way a real operational check simulates every row of the truth table.
//!
//! The region is drawn in the (epsilon_r, lambda_tf) plane and scales with
//! µ₋: at [`REFERENCE_MU_MINUS`] it has its nominal size, a deeper
//! transition level widens it and a shallower one shrinks it. The margin
//! doubles as an energy gap for the critical temperature estimate.

use crate::gate::GateSpec;
use crate::oracle::{Evaluation, Oracle, OracleError};
use crate::parameters::SimulationParameters;
use crate::temperature::{CriticalTemperature, TemperatureEstimate};
use serde::{Deserialize, Serialize};

/// Metric carrying the signed distance to the region boundary.
pub const MARGIN_METRIC: &str = "margin";

/// µ₋ at which a model's region has its nominal size (eV).
pub const REFERENCE_MU_MINUS: f64 = -0.32;

/// Energy gap per unit of margin (meV).
pub const GAP_PER_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticModel {
    /// Operational while `epsilon_r * lambda_tf <= limit`.
    Product { limit: f64 },
    /// Operational inside a disk in the (epsilon_r, lambda_tf) plane.
    Disk {
        epsilon_r: f64,
        lambda_tf: f64,
        radius: f64,
    },
}

impl Default for AnalyticModel {
    fn default() -> Self {
        AnalyticModel::Disk {
            epsilon_r: 5.6,
            lambda_tf: 5.0,
            radius: 3.0,
        }
    }
}

impl AnalyticModel {
    /// Signed margin: non-negative inside the operational region.
    pub fn margin(&self, parameters: &SimulationParameters) -> f64 {
        let scale = parameters.mu_minus / REFERENCE_MU_MINUS;
        match *self {
            AnalyticModel::Product { limit } => {
                limit * scale - parameters.epsilon_r * parameters.lambda_tf
            }
            AnalyticModel::Disk {
                epsilon_r,
                lambda_tf,
                radius,
            } => {
                let dx = parameters.epsilon_r - epsilon_r;
                let dy = parameters.lambda_tf - lambda_tf;
                radius * scale - (dx * dx + dy * dy).sqrt()
            }
        }
    }
}

impl CriticalTemperature for AnalyticModel {
    fn critical_temperature(
        &self,
        parameters: &SimulationParameters,
    ) -> Result<TemperatureEstimate, OracleError> {
        let margin = self.margin(parameters);
        if !margin.is_finite() {
            return Err(format!("model produced a non-finite margin at {:?}", parameters).into());
        }
        Ok(TemperatureEstimate::from_energy_gap(
            margin.max(0.0) * GAP_PER_MARGIN,
        ))
    }
}

impl Oracle for AnalyticModel {
    fn evaluate(&self, parameters: &SimulationParameters) -> Result<Evaluation, OracleError> {
        let margin = self.margin(parameters);
        if !margin.is_finite() {
            return Err(format!("model produced a non-finite margin at {:?}", parameters).into());
        }
        Ok(Evaluation::from_operational(margin >= 0.0).with_metric(MARGIN_METRIC, margin))
    }
}

/// A gate checked against an analytic model.
#[derive(Debug, Clone)]
pub struct GateOracle {
    gate: GateSpec,
    model: AnalyticModel,
}

impl GateOracle {
    pub fn new(gate: GateSpec, model: AnalyticModel) -> Self {
        Self { gate, model }
    }

    pub fn gate(&self) -> &GateSpec {
        &self.gate
    }

    /// Simulator calls per operational check: one per input pattern.
    pub fn patterns(&self) -> u64 {
        self.gate
            .truth_tables
            .first()
            .map_or(1, |tt| tt.num_bits() as u64)
    }
}

impl Oracle for GateOracle {
    fn evaluate(&self, parameters: &SimulationParameters) -> Result<Evaluation, OracleError> {
        Ok(self.model.evaluate(parameters)?.with_invocations(self.patterns()))
    }
}

impl CriticalTemperature for GateOracle {
    fn critical_temperature(
        &self,
        parameters: &SimulationParameters,
    ) -> Result<TemperatureEstimate, OracleError> {
        self.model.critical_temperature(parameters)
    }
}
