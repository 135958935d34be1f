//! Exploration configuration shared by both strategies.

use crate::error::ExploreError;
use crate::parameters::SimulationParameters;
use crate::space::{Neighborhood, ParameterSpace, Point};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Where exploration starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSelection {
    /// Caller-chosen points, used in order.
    Explicit(Vec<Point>),
    /// `count` uniformly random grid points drawn from a seeded RNG.
    Random { count: usize },
}

impl Default for SeedSelection {
    fn default() -> Self {
        SeedSelection::Random { count: 100 }
    }
}

/// How contour tracing treats cells outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Out-of-grid cells count as non-operational without being evaluated,
    /// so contours of regions touching the edge still close.
    #[default]
    Boundary,
    /// The trace stops where it would follow the grid edge and the result
    /// is marked partial.
    Stop,
}

/// Configuration for one exploration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Physical constants for everything not swept.
    pub parameters: SimulationParameters,
    /// Seed points.
    pub seeds: SeedSelection,
    /// Cap on oracle evaluations (None = unbounded).
    pub max_evaluations: Option<u64>,
    /// Cap on contour trace steps, summed over all traces (None = unbounded).
    pub max_trace_steps: Option<u64>,
    /// Flood fill adjacency.
    pub neighborhood: Neighborhood,
    /// Contour tracing behaviour at the grid edge.
    pub edge_policy: EdgePolicy,
    /// Lattice stride for coarse interior sampling after contour tracing
    /// (None = off).
    pub interior_stride: Option<usize>,
    /// Worker threads for flood fill frontier evaluation (1 = sequential).
    pub parallelism: usize,
    /// Seed for random seed selection.
    pub rng_seed: u64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            parameters: SimulationParameters::default(),
            seeds: SeedSelection::default(),
            max_evaluations: None,
            max_trace_steps: None,
            neighborhood: Neighborhood::VonNeumann,
            edge_policy: EdgePolicy::Boundary,
            interior_stride: None,
            parallelism: 1,
            rng_seed: 42,
        }
    }
}

impl ExplorationConfig {
    /// Config starting from the given explicit seed points.
    pub fn with_seeds(seeds: Vec<Point>) -> Self {
        Self {
            seeds: SeedSelection::Explicit(seeds),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ExploreError> {
        if self.parallelism == 0 {
            return Err(ExploreError::Config("parallelism must be at least 1".into()));
        }
        if self.interior_stride == Some(0) {
            return Err(ExploreError::Config("interior_stride must be at least 1".into()));
        }
        if let SeedSelection::Random { count: 0 } = self.seeds {
            return Err(ExploreError::Config("random seed count must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolve the seed selection into concrete points of `space`.
    ///
    /// Random seeds are reproducible for a fixed `rng_seed`. Explicit
    /// points are returned as given, including any that lie off the grid.
    pub fn seed_points(&self, space: &ParameterSpace) -> Vec<Point> {
        match &self.seeds {
            SeedSelection::Explicit(points) => points.clone(),
            SeedSelection::Random { count } => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.rng_seed);
                (0..*count).map(|_| space.random_point(&mut rng)).collect()
            }
        }
    }
}
