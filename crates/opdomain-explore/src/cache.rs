//! Per-run memo of oracle verdicts, one entry per grid point.
//!
//! The oracle dominates runtime, so the cache guarantees that within one
//! run each distinct point costs at most one oracle call. It also owns the
//! run's [`DomainResult`] and [`RunStatistics`] and enforces the
//! evaluation budget, so both explorers share the same bookkeeping.

use crate::domain::{Completeness, DomainResult, Exploration, PartialReason, Sample, Strategy};
use crate::error::ExploreError;
use crate::oracle::{Evaluation, Oracle, OracleError};
use crate::parameters::SimulationParameters;
use crate::space::{ParameterSpace, Point};
use crate::stats::RunStatistics;
use log::debug;
use std::time::Instant;

/// Per-run memo of oracle verdicts.
pub struct SampleCache<'a, O: Oracle> {
    oracle: &'a O,
    base: SimulationParameters,
    domain: DomainResult,
    stats: RunStatistics,
    max_evaluations: Option<u64>,
    caching: bool,
    started: Instant,
}

impl<'a, O: Oracle> SampleCache<'a, O> {
    /// Start a run over `space`. The clock for `elapsed` starts here.
    pub fn new(
        oracle: &'a O,
        space: &ParameterSpace,
        base: SimulationParameters,
        strategy: Strategy,
        max_evaluations: Option<u64>,
    ) -> Self {
        Self {
            oracle,
            base,
            domain: DomainResult::new(space.clone()),
            stats: RunStatistics::new(strategy),
            max_evaluations,
            caching: oracle.caches_verdicts(),
            started: Instant::now(),
        }
    }

    pub fn space(&self) -> &ParameterSpace {
        self.domain.space()
    }

    /// Cached sample for `point`, without touching the oracle.
    pub fn get(&self, point: &Point) -> Option<&Sample> {
        self.domain.get(point)
    }

    /// Whether a lookup of `point` would be answered without the oracle.
    pub fn is_cached(&self, point: &Point) -> bool {
        self.caching && self.domain.contains(point)
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    /// Whether the evaluation budget is used up.
    pub fn budget_exhausted(&self) -> bool {
        self.max_evaluations
            .is_some_and(|max| self.stats.evaluated_count >= max)
    }

    /// Evaluations left before the budget is exhausted (None = unbounded).
    pub fn remaining_budget(&self) -> Option<u64> {
        self.max_evaluations
            .map(|max| max.saturating_sub(self.stats.evaluated_count))
    }

    /// Physical constants the oracle sees at `point`.
    pub fn parameters_at(&self, point: &Point) -> SimulationParameters {
        self.base.at_point(self.domain.space(), point)
    }

    /// Return the sample for `point`, calling the oracle only if the point
    /// has not been evaluated in this run.
    ///
    /// `point` must lie inside the space. Budget checks are the caller's
    /// job: this always evaluates on a miss.
    pub fn lookup_or_evaluate(&mut self, point: &Point) -> Result<&Sample, ExploreError> {
        if self.caching {
            if let Some(slot) = self.domain.slot_of(point) {
                self.stats.cache_hits += 1;
                return Ok(self.domain.sample_at(slot));
            }
        }

        let parameters = self.parameters_at(point);
        match self.oracle.evaluate(&parameters) {
            Ok(evaluation) => Ok(self.record(point.clone(), evaluation)),
            Err(source) => Err(self.failure(point.clone(), source)),
        }
    }

    /// Store an evaluation computed outside the cache (parallel frontier).
    ///
    /// The caller guarantees `point` was not evaluated before in this run.
    pub(crate) fn record(&mut self, point: Point, evaluation: Evaluation) -> &Sample {
        debug_assert!(
            !self.is_cached(&point),
            "point {} evaluated twice in one run",
            point
        );

        self.stats.evaluated_count += 1;
        self.stats.oracle_invocations += evaluation.invocations.max(1);
        if evaluation.verdict.is_operational() {
            self.stats.operational_count += 1;
        }

        let values = self.domain.space().values(&point);
        debug!("Evaluated {} {:?}: {}", point, values, evaluation.verdict);

        let slot = self.domain.insert(Sample {
            point,
            values,
            verdict: evaluation.verdict,
            metrics: evaluation.metrics,
        });
        self.domain.sample_at(slot)
    }

    /// Build the error for an oracle failure at `point`, carrying a copy of
    /// everything sampled so far.
    pub(crate) fn failure(&self, point: Point, source: OracleError) -> ExploreError {
        ExploreError::OracleFailure {
            point,
            source,
            partial: Box::new(self.snapshot()),
        }
    }

    pub(crate) fn domain_mut(&mut self) -> &mut DomainResult {
        &mut self.domain
    }

    /// Close the run: stamp completeness and elapsed time.
    pub fn finish(mut self, completeness: Completeness) -> Exploration {
        self.domain.set_completeness(completeness);
        self.stats.partial = completeness.partial_reason();
        self.stats.touches_grid_edge = self.touches_grid_edge();
        self.stats.elapsed = self.started.elapsed();
        Exploration {
            strategy: self.stats.strategy,
            domain: self.domain,
            stats: self.stats,
        }
    }

    fn touches_grid_edge(&self) -> bool {
        self.stats.partial == Some(PartialReason::GridEdge)
            || self.domain.contours().iter().any(|c| c.touches_grid_edge)
    }

    fn snapshot(&self) -> Exploration {
        let mut stats = self.stats.clone();
        stats.touches_grid_edge = self.touches_grid_edge();
        stats.elapsed = self.started.elapsed();
        Exploration {
            strategy: stats.strategy,
            domain: self.domain.clone(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{CountingOracle, Verdict};
    use crate::space::{Dimension, SweepParameter};

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, 1.0, 2.0, 0.5),
            Dimension::new(SweepParameter::LambdaTf, 1.0, 2.0, 0.5),
        ])
        .unwrap()
    }

    fn product(p: &SimulationParameters) -> Result<Evaluation, OracleError> {
        Ok(Evaluation::from_operational(p.epsilon_r * p.lambda_tf <= 2.25).with_invocations(4))
    }

    #[test]
    fn test_cache_evaluates_each_point_once() {
        let oracle = CountingOracle::new(product);
        let space = space();
        let mut cache = SampleCache::new(
            &oracle,
            &space,
            SimulationParameters::default(),
            Strategy::FloodFill,
            None,
        );

        let p = Point::new(vec![1, 1]);
        assert_eq!(cache.lookup_or_evaluate(&p).unwrap().verdict, Verdict::Operational);
        assert_eq!(cache.lookup_or_evaluate(&p).unwrap().verdict, Verdict::Operational);
        cache.lookup_or_evaluate(&Point::new(vec![2, 2])).unwrap();

        assert_eq!(oracle.calls(), 2);
        let stats = cache.stats();
        assert_eq!(stats.evaluated_count, 2);
        assert_eq!(stats.operational_count, 1);
        assert_eq!(stats.oracle_invocations, 8);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_cache_records_values() {
        let space = space();
        let mut cache = SampleCache::new(
            &product,
            &space,
            SimulationParameters::default(),
            Strategy::FloodFill,
            None,
        );
        let sample = cache.lookup_or_evaluate(&Point::new(vec![0, 2])).unwrap();
        assert_eq!(sample.values, vec![1.0, 2.0]);
        assert!(sample.is_operational());
    }

    #[test]
    fn test_cache_budget() {
        let space = space();
        let mut cache = SampleCache::new(
            &product,
            &space,
            SimulationParameters::default(),
            Strategy::FloodFill,
            Some(2),
        );
        assert_eq!(cache.remaining_budget(), Some(2));
        cache.lookup_or_evaluate(&Point::new(vec![0, 0])).unwrap();
        assert!(!cache.budget_exhausted());
        cache.lookup_or_evaluate(&Point::new(vec![0, 1])).unwrap();
        assert!(cache.budget_exhausted());
        assert_eq!(cache.remaining_budget(), Some(0));
    }

    #[test]
    fn test_zero_invocations_count_as_one() {
        let oracle = |_: &SimulationParameters| -> Result<Evaluation, OracleError> {
            Ok(Evaluation::from_operational(true).with_invocations(0))
        };
        let space = space();
        let mut cache = SampleCache::new(
            &oracle,
            &space,
            SimulationParameters::default(),
            Strategy::FloodFill,
            None,
        );
        cache.lookup_or_evaluate(&Point::new(vec![0, 0])).unwrap();
        assert_eq!(cache.stats().oracle_invocations, 1);
    }

    #[test]
    fn test_cache_oracle_failure_keeps_partial() {
        let oracle = |p: &SimulationParameters| -> Result<Evaluation, OracleError> {
            if p.epsilon_r > 1.5 {
                Err("ground state search failed".into())
            } else {
                Ok(Evaluation::from_operational(true))
            }
        };
        let space = space();
        let mut cache = SampleCache::new(
            &oracle,
            &space,
            SimulationParameters::default(),
            Strategy::FloodFill,
            None,
        );
        cache.lookup_or_evaluate(&Point::new(vec![0, 0])).unwrap();
        let err = cache.lookup_or_evaluate(&Point::new(vec![2, 0])).unwrap_err();

        match err {
            ExploreError::OracleFailure { point, partial, .. } => {
                assert_eq!(point, Point::new(vec![2, 0]));
                assert_eq!(partial.domain.len(), 1);
                assert_eq!(partial.stats.evaluated_count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct Flaky;

    impl Oracle for Flaky {
        fn evaluate(&self, _: &SimulationParameters) -> Result<Evaluation, OracleError> {
            Ok(Evaluation::from_operational(true))
        }

        fn caches_verdicts(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_non_caching_oracle_reevaluates() {
        let oracle = CountingOracle::new(Flaky);
        let space = space();
        let mut cache = SampleCache::new(
            &oracle,
            &space,
            SimulationParameters::default(),
            Strategy::ContourTracing,
            None,
        );
        let p = Point::new(vec![0, 0]);
        cache.lookup_or_evaluate(&p).unwrap();
        cache.lookup_or_evaluate(&p).unwrap();

        assert_eq!(oracle.calls(), 2);
        assert_eq!(cache.stats().evaluated_count, 2);
        assert_eq!(cache.stats().cache_hits, 0);
        let exploration = cache.finish(Completeness::Complete);
        assert_eq!(exploration.domain.len(), 1);
    }

    #[test]
    fn test_finish_marks_partial() {
        let space = space();
        let cache = SampleCache::new(
            &product,
            &space,
            SimulationParameters::default(),
            Strategy::FloodFill,
            Some(0),
        );
        let exploration = cache.finish(Completeness::Partial(
            crate::domain::PartialReason::EvaluationBudget,
        ));
        assert!(!exploration.is_complete());
        assert!(exploration.stats.is_partial());
    }
}
