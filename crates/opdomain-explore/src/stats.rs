//! Evaluation counts and timing of one exploration run.

use crate::domain::{PartialReason, Strategy};
use crate::error::ExploreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters for one exploration run.
///
/// `operational_count <= evaluated_count <= oracle_invocations` always
/// holds; the gap between the last two shows how much work each oracle
/// call hid (e.g. one simulation per truth-table row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub strategy: Strategy,
    /// Oracle evaluations performed (distinct points, for caching oracles).
    pub evaluated_count: u64,
    /// Evaluations that came back operational.
    pub operational_count: u64,
    /// Simulator invocations reported by the oracle.
    pub oracle_invocations: u64,
    /// Lookups answered from the sample cache.
    pub cache_hits: u64,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Set when the run stopped early.
    pub partial: Option<PartialReason>,
    /// Whether a traced contour ran along the grid edge, i.e. the region
    /// may extend past the swept ranges.
    #[serde(default)]
    pub touches_grid_edge: bool,
}

impl RunStatistics {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            evaluated_count: 0,
            operational_count: 0,
            oracle_invocations: 0,
            cache_hits: 0,
            elapsed: Duration::ZERO,
            partial: None,
            touches_grid_edge: false,
        }
    }

    /// Fraction of evaluated points that are operational, in `[0, 1]`.
    pub fn operational_fraction(&self) -> Result<f64, ExploreError> {
        if self.evaluated_count == 0 {
            return Err(ExploreError::DivisionUndefined);
        }
        Ok(self.operational_count as f64 / self.evaluated_count as f64)
    }

    /// Oracle evaluations saved by the cache, as a share of all lookups.
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.evaluated_count + self.cache_hits;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    pub fn is_partial(&self) -> bool {
        self.partial.is_some()
    }
}
