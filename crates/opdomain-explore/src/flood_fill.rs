//! Flood-fill explorer: breadth-first growth of the operational region.
//!
//! Starting from the seed points, every operational point enqueues its
//! in-grid neighbours; non-operational points are recorded as the boundary
//! ring and stop propagation. The run ends when the queue drains or the
//! evaluation budget runs out. The number of oracle calls is bounded by the
//! size of the operational region plus its boundary, not by the grid.
//!
//! The queue is processed layer by layer. Each layer holds distinct points
//! that have never been evaluated (a point enters at most one layer), so
//! the points of a layer can be handed to a worker pool without any risk
//! of evaluating the same point twice. Results are committed in queue
//! order, which keeps the visitation order identical to a sequential FIFO
//! traversal.

use crate::cache::SampleCache;
use crate::config::ExplorationConfig;
use crate::domain::{Completeness, Exploration, PartialReason, Strategy};
use crate::error::ExploreError;
use crate::oracle::{Evaluation, Oracle, OracleError, Verdict};
use crate::parameters::SimulationParameters;
use crate::space::{ParameterSpace, Point};
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::BTreeSet;

/// Layers smaller than this are evaluated on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 4;

/// Breadth-first operational domain explorer.
pub struct FloodFill<'a, O: Oracle> {
    space: &'a ParameterSpace,
    oracle: &'a O,
    config: &'a ExplorationConfig,
}

impl<'a, O: Oracle> FloodFill<'a, O> {
    pub fn new(space: &'a ParameterSpace, oracle: &'a O, config: &'a ExplorationConfig) -> Self {
        Self {
            space,
            oracle,
            config,
        }
    }

    /// Run the flood fill to completion or until the budget is exhausted.
    ///
    /// Seeds that turn out non-operational are recorded but do not
    /// propagate; if every seed is non-operational the result simply has no
    /// operational points.
    pub fn run(&self) -> Result<Exploration, ExploreError> {
        self.config.validate()?;

        let pool = self.worker_pool()?;
        let mut cache = SampleCache::new(
            self.oracle,
            self.space,
            self.config.parameters,
            Strategy::FloodFill,
            self.config.max_evaluations,
        );

        let mut queued = BTreeSet::new();
        let mut layer = Vec::new();
        for seed in self.config.seed_points(self.space) {
            if !self.space.contains(&seed) {
                warn!("Skipping seed {} outside the parameter grid", seed);
                continue;
            }
            if queued.insert(seed.clone()) {
                layer.push(seed);
            }
        }

        info!(
            "Starting flood fill: {} seeds, {} grid points, {} worker(s)",
            layer.len(),
            self.space.total_points(),
            self.config.parallelism
        );

        let mut completeness = Completeness::Complete;
        let mut depth = 0usize;

        while !layer.is_empty() {
            let allowed = match cache.remaining_budget() {
                Some(remaining) => layer.len().min(remaining as usize),
                None => layer.len(),
            };
            if allowed == 0 {
                completeness = Completeness::Partial(PartialReason::EvaluationBudget);
                break;
            }
            let truncated = allowed < layer.len();
            layer.truncate(allowed);

            debug!("Flood fill layer {}: {} points", depth, layer.len());
            let verdicts = self.evaluate_layer(&mut cache, &layer, pool.as_ref())?;

            if truncated {
                completeness = Completeness::Partial(PartialReason::EvaluationBudget);
                break;
            }

            let mut next = Vec::new();
            for (point, verdict) in layer.iter().zip(verdicts) {
                if !verdict.is_operational() {
                    continue;
                }
                for neighbor in self.space.neighbors(point, self.config.neighborhood) {
                    if queued.insert(neighbor.clone()) {
                        next.push(neighbor);
                    }
                }
            }

            layer = next;
            depth += 1;
        }

        let exploration = cache.finish(completeness);
        if let Completeness::Partial(reason) = completeness {
            warn!(
                "Flood fill stopped early ({}) after {} evaluations",
                reason, exploration.stats.evaluated_count
            );
        }
        info!(
            "Flood fill finished: {} evaluated, {} operational, {} simulator calls in {:?}",
            exploration.stats.evaluated_count,
            exploration.stats.operational_count,
            exploration.stats.oracle_invocations,
            exploration.stats.elapsed
        );

        Ok(exploration)
    }

    fn worker_pool(&self) -> Result<Option<ThreadPool>, ExploreError> {
        if self.config.parallelism <= 1 {
            return Ok(None);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism)
            .build()
            .map(Some)
            .map_err(|e| ExploreError::Config(format!("failed to build worker pool: {}", e)))
    }

    /// Evaluate one layer of never-seen points and commit them in order.
    ///
    /// On an oracle failure every point the oracle answered stays recorded
    /// and the first failing point in queue order is reported. Sequential
    /// layers stop at the failure; parallel layers have already evaluated
    /// the whole layer, so successes after the failing point are kept too.
    fn evaluate_layer(
        &self,
        cache: &mut SampleCache<'a, O>,
        layer: &[Point],
        pool: Option<&ThreadPool>,
    ) -> Result<Vec<Verdict>, ExploreError> {
        let pool = match pool {
            Some(pool) if layer.len() >= PARALLEL_THRESHOLD => pool,
            _ => {
                return layer
                    .iter()
                    .map(|point| cache.lookup_or_evaluate(point).map(|s| s.verdict))
                    .collect();
            }
        };

        let parameters: Vec<SimulationParameters> =
            layer.iter().map(|p| cache.parameters_at(p)).collect();
        let oracle = self.oracle;
        let results: Vec<Result<Evaluation, OracleError>> = pool.install(|| {
            parameters
                .par_iter()
                .map(|params| oracle.evaluate(params))
                .collect()
        });

        let mut verdicts = Vec::with_capacity(layer.len());
        let mut failed = None;
        for (point, result) in layer.iter().zip(results) {
            match result {
                Ok(evaluation) => verdicts.push(cache.record(point.clone(), evaluation).verdict),
                Err(source) => {
                    failed.get_or_insert((point.clone(), source));
                }
            }
        }
        match failed {
            Some((point, source)) => Err(cache.failure(point, source)),
            None => Ok(verdicts),
        }
    }
}

/// Flood-fill `space` with `oracle` under `config`.
pub fn flood_fill<O: Oracle>(
    space: &ParameterSpace,
    oracle: &O,
    config: &ExplorationConfig,
) -> Result<Exploration, ExploreError> {
    FloodFill::new(space, oracle, config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedSelection;
    use crate::oracle::CountingOracle;
    use crate::space::{Dimension, Neighborhood, SweepParameter};
    use std::collections::BTreeSet;

    fn grid(min: f64, max: f64, step: f64) -> ParameterSpace {
        ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, min, max, step),
            Dimension::new(SweepParameter::LambdaTf, min, max, step),
        ])
        .unwrap()
    }

    fn product(p: &SimulationParameters) -> Result<Evaluation, OracleError> {
        Ok(Evaluation::from_operational(p.epsilon_r * p.lambda_tf <= 2.25))
    }

    /// Disk of radius 3 around (5, 5) on a 0..=10 grid.
    fn disk(p: &SimulationParameters) -> Result<Evaluation, OracleError> {
        let dx = p.epsilon_r - 5.0;
        let dy = p.lambda_tf - 5.0;
        Ok(Evaluation::from_operational(dx * dx + dy * dy <= 9.0).with_invocations(4))
    }

    fn pt(i: usize, j: usize) -> Point {
        Point::new(vec![i, j])
    }

    fn operational_set(exploration: &Exploration) -> BTreeSet<Point> {
        exploration.domain.operational_points().cloned().collect()
    }

    #[test]
    fn test_flood_fill_product_region() {
        let space = grid(1.0, 2.0, 0.5);
        let oracle = CountingOracle::new(product);
        let config = ExplorationConfig::with_seeds(vec![space.point_at(&[1.0, 1.0]).unwrap()]);

        let exploration = flood_fill(&space, &oracle, &config).unwrap();

        let expected: BTreeSet<Point> =
            [pt(0, 0), pt(0, 1), pt(0, 2), pt(1, 0), pt(1, 1), pt(2, 0)].into();
        assert_eq!(operational_set(&exploration), expected);

        let boundary: BTreeSet<Point> =
            exploration.domain.non_operational_points().cloned().collect();
        assert_eq!(boundary, [pt(1, 2), pt(2, 1)].into());

        // (2, 2) is only adjacent to non-operational points and is never touched.
        assert!(!exploration.domain.contains(&pt(2, 2)));
        assert_eq!(exploration.stats.evaluated_count, 8);
        assert_eq!(exploration.stats.evaluated_count as usize, exploration.domain.len());
        assert_eq!(oracle.calls(), 8);
        assert!(exploration.is_complete());
    }

    #[test]
    fn test_flood_fill_each_point_evaluated_once() {
        let space = grid(0.0, 10.0, 0.5);
        let oracle = CountingOracle::new(disk);
        let config = ExplorationConfig {
            seeds: SeedSelection::Explicit(vec![pt(10, 10), pt(10, 10), pt(9, 10), pt(0, 0)]),
            neighborhood: Neighborhood::Moore,
            ..Default::default()
        };

        let exploration = flood_fill(&space, &oracle, &config).unwrap();
        let stats = &exploration.stats;
        assert_eq!(oracle.calls(), stats.evaluated_count);
        assert_eq!(stats.evaluated_count as usize, exploration.domain.len());
        assert_eq!(stats.oracle_invocations, 4 * stats.evaluated_count);
        assert!(stats.operational_count <= stats.evaluated_count);
        let fraction = stats.operational_fraction().unwrap();
        assert!((0.0..=1.0).contains(&fraction));
    }

    #[test]
    fn test_flood_fill_bounded_by_region_not_grid() {
        let space = grid(0.0, 10.0, 0.1);
        let config = ExplorationConfig::with_seeds(vec![space.point_at(&[5.0, 5.0]).unwrap()]);
        let exploration = flood_fill(&space, &disk, &config).unwrap();

        assert!(exploration.domain.len() < space.total_points() / 2);
        for point in exploration.domain.non_operational_points() {
            let touches_region = space
                .neighbors(point, Neighborhood::VonNeumann)
                .iter()
                .any(|n| exploration.domain.get(n).is_some_and(|s| s.is_operational()));
            assert!(touches_region, "{} is not on the boundary ring", point);
        }
    }

    #[test]
    fn test_flood_fill_all_seeds_non_operational() {
        let space = grid(1.0, 2.0, 0.5);
        let config = ExplorationConfig::with_seeds(vec![pt(2, 2), pt(1, 2)]);
        let exploration = flood_fill(&space, &product, &config).unwrap();

        assert_eq!(exploration.domain.operational_points().count(), 0);
        assert_eq!(exploration.domain.len(), 2);
        assert!(exploration.is_complete());
        assert_eq!(exploration.stats.operational_fraction().unwrap(), 0.0);
    }

    #[test]
    fn test_flood_fill_budget_of_one() {
        let space = grid(1.0, 2.0, 0.5);
        let config = ExplorationConfig {
            max_evaluations: Some(1),
            ..ExplorationConfig::with_seeds(vec![pt(0, 0)])
        };
        let exploration = flood_fill(&space, &product, &config).unwrap();

        assert_eq!(exploration.domain.len(), 1);
        assert_eq!(exploration.domain.samples()[0].point, pt(0, 0));
        assert_eq!(
            exploration.domain.completeness(),
            Completeness::Partial(PartialReason::EvaluationBudget)
        );
        assert_eq!(exploration.stats.partial, Some(PartialReason::EvaluationBudget));
    }

    #[test]
    fn test_flood_fill_budget_exactly_sufficient_is_complete() {
        let space = grid(1.0, 2.0, 0.5);
        let config = ExplorationConfig {
            max_evaluations: Some(8),
            ..ExplorationConfig::with_seeds(vec![pt(0, 0)])
        };
        let exploration = flood_fill(&space, &product, &config).unwrap();
        assert_eq!(exploration.domain.len(), 8);
        assert!(exploration.is_complete());
    }

    #[test]
    fn test_flood_fill_idempotent() {
        let space = grid(0.0, 10.0, 0.25);
        let config = ExplorationConfig::with_seeds(vec![space.point_at(&[5.0, 5.0]).unwrap()]);
        let first = flood_fill(&space, &disk, &config).unwrap();
        let second = flood_fill(&space, &disk, &config).unwrap();

        assert_eq!(operational_set(&first), operational_set(&second));
        let a: Vec<_> = first.domain.visited_points().collect();
        let b: Vec<_> = second.domain.visited_points().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_flood_fill_skips_out_of_grid_seed() {
        let space = grid(1.0, 2.0, 0.5);
        let config = ExplorationConfig::with_seeds(vec![pt(7, 7), pt(0, 0)]);
        let exploration = flood_fill(&space, &product, &config).unwrap();
        assert_eq!(exploration.domain.samples()[0].point, pt(0, 0));
        assert_eq!(exploration.domain.len(), 8);
    }

    #[test]
    fn test_flood_fill_moore_crosses_diagonals() {
        let space = grid(0.0, 5.0, 1.0);
        let diagonal = |p: &SimulationParameters| -> Result<Evaluation, OracleError> {
            Ok(Evaluation::from_operational(p.epsilon_r == p.lambda_tf))
        };

        let von_neumann = flood_fill(
            &space,
            &diagonal,
            &ExplorationConfig::with_seeds(vec![pt(0, 0)]),
        )
        .unwrap();
        assert_eq!(von_neumann.domain.operational_points().count(), 1);

        let moore = flood_fill(
            &space,
            &diagonal,
            &ExplorationConfig {
                neighborhood: Neighborhood::Moore,
                ..ExplorationConfig::with_seeds(vec![pt(0, 0)])
            },
        )
        .unwrap();
        assert_eq!(moore.domain.operational_points().count(), 6);
    }

    #[test]
    fn test_flood_fill_parallel_matches_sequential() {
        let space = grid(0.0, 10.0, 0.25);
        let sequential_config =
            ExplorationConfig::with_seeds(vec![space.point_at(&[5.0, 5.0]).unwrap()]);
        let parallel_config = ExplorationConfig {
            parallelism: 4,
            ..sequential_config.clone()
        };

        let oracle = CountingOracle::new(disk);
        let sequential = flood_fill(&space, &disk, &sequential_config).unwrap();
        let parallel = flood_fill(&space, &oracle, &parallel_config).unwrap();

        let a: Vec<_> = sequential.domain.visited_points().collect();
        let b: Vec<_> = parallel.domain.visited_points().collect();
        assert_eq!(a, b);
        assert_eq!(oracle.calls(), parallel.stats.evaluated_count);
        assert_eq!(sequential.stats.evaluated_count, parallel.stats.evaluated_count);
    }

    #[test]
    fn test_flood_fill_parallel_respects_budget() {
        let space = grid(0.0, 10.0, 0.25);
        let config = ExplorationConfig {
            parallelism: 3,
            max_evaluations: Some(37),
            ..ExplorationConfig::with_seeds(vec![space.point_at(&[5.0, 5.0]).unwrap()])
        };
        let exploration = flood_fill(&space, &disk, &config).unwrap();
        assert_eq!(exploration.stats.evaluated_count, 37);
        assert!(!exploration.is_complete());
    }

    #[test]
    fn test_flood_fill_oracle_failure_halts() {
        let space = grid(0.0, 10.0, 1.0);
        let failing = |p: &SimulationParameters| -> Result<Evaluation, OracleError> {
            if p.epsilon_r >= 3.0 {
                Err(format!("simulation failed at epsilon_r={}", p.epsilon_r).into())
            } else {
                Ok(Evaluation::from_operational(true))
            }
        };
        let config = ExplorationConfig::with_seeds(vec![pt(0, 0)]);
        let err = flood_fill(&space, &failing, &config).unwrap_err();

        let partial = err.partial_exploration().expect("partial result");
        assert!(!partial.domain.is_empty());
        assert!(partial
            .domain
            .visited_points()
            .all(|p| p.index(0) < 3));
        assert!(matches!(err, ExploreError::OracleFailure { ref point, .. } if point.index(0) == 3));
    }

    #[test]
    fn test_flood_fill_parallel_failure_keeps_layer_successes() {
        let space = grid(0.0, 10.0, 1.0);
        let oracle = CountingOracle::new(|p: &SimulationParameters| -> Result<Evaluation, OracleError> {
            if p.epsilon_r == 3.0 && p.lambda_tf == 0.0 {
                Err("simulation failed".into())
            } else {
                Ok(Evaluation::from_operational(true))
            }
        });
        let config = ExplorationConfig {
            parallelism: 4,
            ..ExplorationConfig::with_seeds(vec![pt(0, 0)])
        };
        let err = flood_fill(&space, &oracle, &config).unwrap_err();

        // Layers of 1, 2 and 3 points run sequentially; the fourth layer
        // [(3,0), (2,1), (1,2), (0,3)] runs on the pool and fails first.
        assert!(matches!(err, ExploreError::OracleFailure { ref point, .. } if *point == pt(3, 0)));
        let partial = err.partial_exploration().unwrap();
        assert_eq!(oracle.calls(), 10);
        assert_eq!(partial.stats.evaluated_count, 9);
        assert_eq!(partial.domain.len(), 9);
        for point in [pt(2, 1), pt(1, 2), pt(0, 3)] {
            assert!(partial.domain.contains(&point), "{} was dropped", point);
        }
        assert!(!partial.domain.contains(&pt(3, 0)));
    }

    #[test]
    fn test_flood_fill_random_seeds() {
        let space = grid(0.0, 10.0, 0.5);
        let config = ExplorationConfig {
            seeds: SeedSelection::Random { count: 50 },
            rng_seed: 7,
            ..Default::default()
        };
        let first = flood_fill(&space, &disk, &config).unwrap();
        let second = flood_fill(&space, &disk, &config).unwrap();

        // The disk covers about a quarter of the 21x21 grid.
        assert!(first.domain.operational_points().count() > 0);
        assert_eq!(operational_set(&first), operational_set(&second));
    }

    #[test]
    fn test_flood_fill_three_dimensions() {
        let space = ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, 0.0, 4.0, 1.0),
            Dimension::new(SweepParameter::LambdaTf, 0.0, 4.0, 1.0),
            Dimension::new(SweepParameter::MuMinus, 0.0, 4.0, 1.0),
        ])
        .unwrap();
        let cube = |p: &SimulationParameters| -> Result<Evaluation, OracleError> {
            Ok(Evaluation::from_operational(
                p.epsilon_r <= 1.0 && p.lambda_tf <= 1.0 && p.mu_minus <= 1.0,
            ))
        };
        let config = ExplorationConfig::with_seeds(vec![Point::new(vec![0, 0, 0])]);
        let exploration = flood_fill(&space, &cube, &config).unwrap();

        assert_eq!(exploration.domain.operational_points().count(), 8);
        // Face neighbours of the 2x2x2 cube inside the grid: 3 faces x 4 cells.
        assert_eq!(exploration.domain.non_operational_points().count(), 12);
    }

    #[test]
    fn test_flood_fill_rejects_bad_config() {
        let space = grid(1.0, 2.0, 0.5);
        let config = ExplorationConfig {
            parallelism: 0,
            ..Default::default()
        };
        assert!(matches!(
            flood_fill(&space, &product, &config),
            Err(ExploreError::Config(_))
        ));
    }
}
