//! Operational domain exploration for SiDB gate layouts.
//!
//! A gate layout is *operational* at a set of physical constants when its
//! simulated ground state implements the gate's truth table. This crate
//! maps which points of a discretized parameter grid (relative
//! permittivity, Thomas-Fermi screening length, charge transition level)
//! are operational while calling the expensive operational check as
//! rarely as possible.
//!
//! # Architecture
//!
//! ```text
//! ParameterSpace + ExplorationConfig + Oracle
//!        │
//!        ├── FloodFill       BFS from seeds; operational points expand,
//!        │                   non-operational points form the boundary
//!        └── ContourTracer   march to the boundary, then follow it
//!        │                   (Moore-neighbour tracing, 2-D only)
//!        ▼
//!   SampleCache  ──► at most one oracle call per distinct point per run
//!        ▼
//!   Exploration { DomainResult, RunStatistics }
//! ```
//!
//! # Example Usage
//!
//! ```
//! use opdomain_explore::config::ExplorationConfig;
//! use opdomain_explore::flood_fill::flood_fill;
//! use opdomain_explore::oracle::{Evaluation, OracleError};
//! use opdomain_explore::parameters::SimulationParameters;
//! use opdomain_explore::space::{Dimension, ParameterSpace, Point, SweepParameter};
//!
//! let space = ParameterSpace::new(vec![
//!     Dimension::new(SweepParameter::EpsilonR, 1.0, 2.0, 0.5),
//!     Dimension::new(SweepParameter::LambdaTf, 1.0, 2.0, 0.5),
//! ])
//! .unwrap();
//! let oracle = |p: &SimulationParameters| -> Result<Evaluation, OracleError> {
//!     Ok(Evaluation::from_operational(p.epsilon_r * p.lambda_tf <= 2.25))
//! };
//! let config = ExplorationConfig::with_seeds(vec![Point::new(vec![0, 0])]);
//!
//! let exploration = flood_fill(&space, &oracle, &config).unwrap();
//! assert_eq!(exploration.domain.operational_points().count(), 6);
//! assert_eq!(exploration.stats.evaluated_count, 8);
//! ```
//!
//! # Module Structure
//!
//! - [`space`] — Dimensions, grid points and neighbourhoods
//! - [`parameters`] — Physical constants a point is evaluated at
//! - [`oracle`] — The operational check as an injected capability
//! - [`analytic`] — Closed-form stand-in oracles
//! - [`cache`] — Per-run memo of oracle verdicts
//! - [`flood_fill`] — Flood-fill explorer
//! - [`contour`] — Contour-tracing explorer
//! - [`domain`] — Samples, completeness and contours of a run
//! - [`stats`] — Evaluation counts and timing
//! - [`temperature`] — Critical temperature as an injected capability
//! - [`gate`] — Expected truth tables per gate type
//! - [`writer`] — CSV output
//! - [`collector`] — Multi-experiment comparison table
//! - [`report`] — Human-readable reports
//!
//! # Determinism
//!
//! Exploration is deterministic given the same seeds and oracle: random
//! seeds come from a seeded `ChaCha8Rng`, and points are kept in
//! `BTreeMap`/`BTreeSet`. Parallel flood fill commits each layer in queue
//! order, so it visits points in the same order as the sequential run.

pub mod analytic;
pub mod cache;
pub mod collector;
pub mod config;
pub mod contour;
pub mod domain;
pub mod error;
pub mod flood_fill;
pub mod gate;
pub mod oracle;
pub mod parameters;
pub mod report;
pub mod space;
pub mod stats;
pub mod temperature;
pub mod writer;

// Re-export main types for convenience
pub use analytic::{AnalyticModel, GateOracle};
pub use cache::SampleCache;
pub use collector::{run_experiment, Experiment, RunSummary, SweepCollector, SweepRecord};
pub use config::{EdgePolicy, ExplorationConfig, SeedSelection};
pub use contour::{contour_tracing, ContourTracer};
pub use domain::{Completeness, Contour, DomainResult, Exploration, PartialReason, Sample, Strategy};
pub use error::ExploreError;
pub use flood_fill::{flood_fill, FloodFill};
pub use gate::{GateCatalog, GateSpec, TruthTable};
pub use oracle::{Evaluation, Metrics, Oracle, OracleError, Verdict};
pub use parameters::SimulationParameters;
pub use space::{Dimension, Neighborhood, ParameterSpace, Point, SweepParameter};
pub use stats::RunStatistics;
pub use temperature::{CriticalTemperature, TemperatureEstimate};
pub use writer::{write_domain_csv, SampleWritingMode, WriteParams};
