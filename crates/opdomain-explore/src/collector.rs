//! Runs one (gate, mu) experiment at a time, accumulates one row per
//! experiment and renders the comparison table.
//!
//! Records are plain values; the collector is passed around explicitly and
//! can be saved to / loaded from JSON between sessions.

use crate::config::ExplorationConfig;
use crate::contour::contour_tracing;
use crate::domain::Exploration;
use crate::error::ExploreError;
use crate::flood_fill::flood_fill;
use crate::oracle::Oracle;
use crate::parameters::SimulationParameters;
use crate::space::ParameterSpace;
use crate::temperature::{CriticalTemperature, TemperatureEstimate};
use log::info;
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::fs;
use std::path::Path;

/// Errors from collector persistence.
#[derive(Debug, Snafu)]
pub enum CollectorError {
    #[snafu(display("I/O error"), context(false))]
    Io { source: std::io::Error },

    #[snafu(display("JSON error"), context(false))]
    Json { source: serde_json::Error },
}

/// The numbers the comparison table shows for one exploration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Distinct points evaluated.
    pub samples: u64,
    /// Operational share of the evaluated points; None if nothing was
    /// evaluated.
    pub operational_fraction: Option<f64>,
    pub simulator_calls: u64,
    pub seconds: f64,
    pub complete: bool,
    #[serde(default)]
    pub touches_grid_edge: bool,
}

impl From<&Exploration> for RunSummary {
    fn from(exploration: &Exploration) -> Self {
        let stats = &exploration.stats;
        Self {
            samples: stats.evaluated_count,
            operational_fraction: stats.operational_fraction().ok(),
            simulator_calls: stats.oracle_invocations,
            seconds: stats.elapsed.as_secs_f64(),
            complete: exploration.is_complete(),
            touches_grid_edge: stats.touches_grid_edge,
        }
    }
}

/// One experiment: a gate at one mu value. The critical temperature is
/// computed under both constant sets; the domain is explored with both
/// strategies at the established constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub gate: String,
    pub mu_minus: f64,
    /// Critical temperature under the established constants (K).
    pub ct_old: f64,
    /// Energy gap to the first erroneous state, established constants (meV).
    pub e_gap_old: f64,
    pub ct_new: f64,
    pub e_gap_new: f64,
    pub contour_tracing: RunSummary,
    pub flood_fill: RunSummary,
}

impl SweepRecord {
    pub fn new(
        gate: impl Into<String>,
        mu_minus: f64,
        old: &TemperatureEstimate,
        new: &TemperatureEstimate,
        contour_tracing: &Exploration,
        flood_fill: &Exploration,
    ) -> Self {
        Self {
            gate: gate.into(),
            mu_minus,
            ct_old: old.critical_temperature,
            e_gap_old: old.energy_gap,
            ct_new: new.critical_temperature,
            e_gap_new: new.energy_gap,
            contour_tracing: contour_tracing.into(),
            flood_fill: flood_fill.into(),
        }
    }
}

/// Everything one (gate, mu) experiment produced.
#[derive(Debug)]
pub struct Experiment {
    pub mu_minus: f64,
    /// Critical temperature under [`SimulationParameters::established`].
    pub old: TemperatureEstimate,
    /// Critical temperature under [`SimulationParameters::revised`].
    pub new: TemperatureEstimate,
    pub contour_tracing: Exploration,
    pub flood_fill: Exploration,
}

impl Experiment {
    pub fn record(&self, gate: impl Into<String>) -> SweepRecord {
        SweepRecord::new(
            gate,
            self.mu_minus,
            &self.old,
            &self.new,
            &self.contour_tracing,
            &self.flood_fill,
        )
    }
}

/// Run one experiment for the gate bound into `oracle`.
///
/// Both explorers run over `space` with the established constants at
/// `mu_minus`, whatever parameters the configs carry; seeds, budgets and
/// the rest of each config are used as given.
pub fn run_experiment<O: Oracle + CriticalTemperature>(
    gate: &str,
    oracle: &O,
    space: &ParameterSpace,
    contour_config: &ExplorationConfig,
    flood_config: &ExplorationConfig,
    mu_minus: f64,
) -> Result<Experiment, ExploreError> {
    let established = SimulationParameters::established(mu_minus);
    let temperature = |parameters: &SimulationParameters| {
        oracle
            .critical_temperature(parameters)
            .map_err(|source| ExploreError::CriticalTemperature {
                gate: gate.to_string(),
                source,
            })
    };
    let old = temperature(&established)?;
    let new = temperature(&SimulationParameters::revised(mu_minus))?;
    info!(
        "{} at mu {}: critical temperature {:.2} K (old), {:.2} K (new)",
        gate, mu_minus, old.critical_temperature, new.critical_temperature
    );

    let contour_config = ExplorationConfig {
        parameters: established,
        ..contour_config.clone()
    };
    let flood_config = ExplorationConfig {
        parameters: established,
        ..flood_config.clone()
    };

    Ok(Experiment {
        mu_minus,
        old,
        new,
        contour_tracing: contour_tracing(space, oracle, &contour_config)?,
        flood_fill: flood_fill(space, oracle, &flood_config)?,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepCollector {
    records: Vec<SweepRecord>,
}

impl SweepCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: SweepRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SweepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Comparison table, one row per record in insertion order.
    ///
    /// Run cells end in `*` when the run was cut short and `+` when a
    /// contour reached the grid edge.
    pub fn render_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{:<24} {:>6} │ {:>8} {:>8} {:>8} {:>8} │ {:>8} {:>7} {:>10} {:>8} │ {:>8} {:>7} {:>10} {:>8}\n",
            "gate",
            "mu",
            "CT old",
            "Eg old",
            "CT new",
            "Eg new",
            "#samples",
            "op.",
            "sim calls",
            "t in s",
            "#samples",
            "op.",
            "sim calls",
            "t in s",
        ));
        output.push_str(&format!(
            "{:<31} │ {:<35} │ {:<36} │ {:<36}\n",
            "", "critical temperature [K], gap [meV]", "contour tracing", "flood fill"
        ));
        output.push_str(&"─".repeat(150));
        output.push('\n');

        for record in &self.records {
            output.push_str(&format!(
                "{:<24} {:>6.2} │ {:>8.2} {:>8.3} {:>8.2} {:>8.3} │ {} │ {}\n",
                record.gate,
                record.mu_minus,
                record.ct_old,
                record.e_gap_old,
                record.ct_new,
                record.e_gap_new,
                summary_cells(&record.contour_tracing),
                summary_cells(&record.flood_fill),
            ));
        }
        output
    }
}

fn summary_cells(summary: &RunSummary) -> String {
    let fraction = match summary.operational_fraction {
        Some(f) => format!("{:.4}", f),
        None => "n/a".to_string(),
    };
    let mut markers = String::new();
    if !summary.complete {
        markers.push('*');
    }
    if summary.touches_grid_edge {
        markers.push('+');
    }
    format!(
        "{:>8} {:>7} {:>10} {:>8.3}{}",
        summary.samples, fraction, summary.simulator_calls, summary.seconds, markers
    )
}

/// Save the collector as pretty JSON.
pub fn save_collector<P: AsRef<Path>>(
    path: P,
    collector: &SweepCollector,
) -> Result<(), CollectorError> {
    let json = serde_json::to_string_pretty(collector)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a collector saved with [`save_collector`].
pub fn load_collector<P: AsRef<Path>>(path: P) -> Result<SweepCollector, CollectorError> {
    let json = fs::read_to_string(path)?;
    let collector = serde_json::from_str(&json)?;
    Ok(collector)
}
