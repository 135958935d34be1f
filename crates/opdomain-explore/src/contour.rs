//! Contour-tracing explorer that walks the boundary of the operational region.
//!
//! Instead of filling the interior, the tracer finds one boundary point and
//! follows the boundary around, so a large simply connected region costs
//! evaluations proportional to its perimeter rather than its area.
//!
//! # Algorithm
//!
//! 1. From an operational seed, march along `+dim0` until the next point is
//!    non-operational (or off the grid). The last operational point is the
//!    start; the cell after it is the initial backtrack.
//! 2. Moore-neighbour tracing. The eight neighbours of the current point
//!    are examined clockwise in `(dim0, dim1)` coordinates:
//!
//!    ```text
//!    E, SE, S, SW, W, NW, N, NE
//!    ```
//!
//!    starting just after the backtrack cell. The first operational
//!    neighbour becomes the current point and the cell examined just before
//!    it becomes the new backtrack.
//! 3. The contour is closed when the trace re-enters a (point, backtrack
//!    direction) state it already occupied. The trace is deterministic, so
//!    from there on it would only repeat itself. A point with no
//!    operational neighbour is a closed contour of one.
//!
//! Every examined point goes through the [`SampleCache`], so revisits at
//! one-cell-wide necks are cache hits. Cells off the grid are handled by
//! the [`EdgePolicy`].

use crate::cache::SampleCache;
use crate::config::{EdgePolicy, ExplorationConfig, SeedSelection};
use crate::domain::{Completeness, Contour, Exploration, PartialReason, Strategy};
use crate::error::ExploreError;
use crate::oracle::{Oracle, Verdict};
use crate::space::{ParameterSpace, Point};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Clockwise Moore ring, starting east.
const DIRECTIONS: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const EAST: usize = 0;

fn direction_index(delta: (isize, isize)) -> Option<usize> {
    DIRECTIONS.iter().position(|&d| d == delta)
}

/// Outcome of probing one cell.
enum Probe {
    Verdict(Verdict),
    OffGrid,
    OutOfBudget,
}

/// How a single trace ended.
struct Trace {
    contour: Contour,
    stopped: Option<PartialReason>,
}

/// Boundary-following operational domain explorer. Two-dimensional spaces
/// only.
pub struct ContourTracer<'a, O: Oracle> {
    space: &'a ParameterSpace,
    oracle: &'a O,
    config: &'a ExplorationConfig,
}

impl<'a, O: Oracle> ContourTracer<'a, O> {
    pub fn new(space: &'a ParameterSpace, oracle: &'a O, config: &'a ExplorationConfig) -> Self {
        Self {
            space,
            oracle,
            config,
        }
    }

    /// Trace the contour(s) reachable from the configured seeds.
    ///
    /// An explicit seed that is off the grid or non-operational fails with
    /// `InvalidSeed`. Random seeds that are non-operational are skipped; if
    /// none is operational the result is empty and complete.
    pub fn run(&self) -> Result<Exploration, ExploreError> {
        self.config.validate()?;
        if self.space.num_dimensions() != 2 {
            return Err(ExploreError::UnsupportedDimensions {
                strategy: "contour tracing",
                expected: 2,
                found: self.space.num_dimensions(),
            });
        }

        let explicit = matches!(self.config.seeds, SeedSelection::Explicit(_));
        let seeds = self.config.seed_points(self.space);
        if seeds.is_empty() {
            return Err(ExploreError::Config(
                "contour tracing needs at least one seed".into(),
            ));
        }

        info!(
            "Starting contour tracing: {} seed(s), {} grid points, edge policy {:?}",
            seeds.len(),
            self.space.total_points(),
            self.config.edge_policy
        );

        let mut cache = SampleCache::new(
            self.oracle,
            self.space,
            self.config.parameters,
            Strategy::ContourTracing,
            self.config.max_evaluations,
        );
        let mut on_contour: BTreeSet<Point> = BTreeSet::new();
        let mut steps = 0u64;
        let mut stopped = None;

        for seed in seeds {
            if !self.space.contains(&seed) {
                return Err(ExploreError::InvalidSeed {
                    point: seed,
                    reason: "outside the parameter grid".into(),
                });
            }

            let verdict = match probe(&mut cache, Some(&seed))? {
                Probe::Verdict(v) => v,
                _ => {
                    stopped = Some(PartialReason::EvaluationBudget);
                    break;
                }
            };
            if !verdict.is_operational() {
                if explicit {
                    return Err(ExploreError::InvalidSeed {
                        point: seed,
                        reason: "seed is not operational, there is no boundary to trace".into(),
                    });
                }
                continue;
            }

            let (start, start_on_edge) = match self.march(&mut cache, seed)? {
                Ok(found) => found,
                Err(reason) => {
                    stopped = Some(reason);
                    break;
                }
            };
            if on_contour.contains(&start) {
                debug!("Start {} lies on a traced contour, skipping", start);
                continue;
            }

            let trace = self.trace(&mut cache, start, start_on_edge, &mut steps)?;
            on_contour.extend(trace.contour.points.iter().cloned());
            debug!(
                "Contour of {} points traced (closed: {}, touches edge: {})",
                trace.contour.points.len(),
                trace.contour.closed,
                trace.contour.touches_grid_edge
            );
            cache.domain_mut().push_contour(trace.contour);

            if trace.stopped.is_some() {
                stopped = trace.stopped;
                break;
            }
        }

        if stopped.is_none() {
            if let Some(stride) = self.config.interior_stride {
                match self.sample_interior(&mut cache, stride)? {
                    Ok(estimate) => cache.domain_mut().set_area_estimate(estimate),
                    Err(reason) => stopped = Some(reason),
                }
            }
        }

        let completeness = match stopped {
            Some(reason) => Completeness::Partial(reason),
            None => Completeness::Complete,
        };
        let exploration = cache.finish(completeness);
        if let Some(reason) = stopped {
            warn!(
                "Contour tracing stopped early ({}) after {} evaluations and {} steps",
                reason, exploration.stats.evaluated_count, steps
            );
        }
        info!(
            "Contour tracing finished: {} contour(s), {} evaluated, {} operational, {} simulator calls in {:?}",
            exploration.domain.contours().len(),
            exploration.stats.evaluated_count,
            exploration.stats.operational_count,
            exploration.stats.oracle_invocations,
            exploration.stats.elapsed
        );

        Ok(exploration)
    }

    /// March from `seed` along `+dim0` to the last operational point.
    ///
    /// Returns the start point and whether the cell after it is off the
    /// grid, or the reason the march had to stop.
    #[allow(clippy::type_complexity)]
    fn march(
        &self,
        cache: &mut SampleCache<'a, O>,
        seed: Point,
    ) -> Result<Result<(Point, bool), PartialReason>, ExploreError> {
        let mut current = seed;
        loop {
            let next = self.space.offset(&current, &[1, 0]);
            match probe(cache, next.as_ref())? {
                Probe::Verdict(Verdict::Operational) => {
                    // `probe` only yields a verdict for in-grid points.
                    if let Some(next) = next {
                        current = next;
                    }
                }
                Probe::Verdict(Verdict::NonOperational) => return Ok(Ok((current, false))),
                Probe::OffGrid => {
                    return Ok(match self.config.edge_policy {
                        EdgePolicy::Boundary => Ok((current, true)),
                        EdgePolicy::Stop => Err(PartialReason::GridEdge),
                    })
                }
                Probe::OutOfBudget => return Ok(Err(PartialReason::EvaluationBudget)),
            }
        }
    }

    /// Moore-neighbour trace from `start`, whose backtrack cell is east.
    fn trace(
        &self,
        cache: &mut SampleCache<'a, O>,
        start: Point,
        start_on_edge: bool,
        steps: &mut u64,
    ) -> Result<Trace, ExploreError> {
        let mut contour = Contour {
            points: vec![start.clone()],
            closed: false,
            touches_grid_edge: start_on_edge,
        };

        let mut current = start;
        let mut backtrack = EAST;
        let mut states = BTreeSet::new();
        states.insert((current.clone(), backtrack));

        loop {
            if self.config.max_trace_steps.is_some_and(|cap| *steps >= cap) {
                return Ok(Trace {
                    contour,
                    stopped: Some(PartialReason::IterationCap),
                });
            }
            *steps += 1;

            let mut found = None;
            for k in 1..DIRECTIONS.len() {
                let direction = (backtrack + k) % DIRECTIONS.len();
                let neighbor = self.space.offset(&current, &pair(DIRECTIONS[direction]));
                match probe(cache, neighbor.as_ref())? {
                    Probe::Verdict(Verdict::Operational) => {
                        if let Some(neighbor) = neighbor {
                            found = Some((neighbor, (direction + DIRECTIONS.len() - 1) % 8));
                        }
                        break;
                    }
                    Probe::Verdict(Verdict::NonOperational) => {}
                    Probe::OffGrid => match self.config.edge_policy {
                        EdgePolicy::Boundary => contour.touches_grid_edge = true,
                        EdgePolicy::Stop => {
                            return Ok(Trace {
                                contour,
                                stopped: Some(PartialReason::GridEdge),
                            })
                        }
                    },
                    Probe::OutOfBudget => {
                        return Ok(Trace {
                            contour,
                            stopped: Some(PartialReason::EvaluationBudget),
                        })
                    }
                }
            }

            let Some((next, previous)) = found else {
                // No operational neighbour: a region of a single point.
                contour.closed = true;
                return Ok(Trace {
                    contour,
                    stopped: None,
                });
            };

            // The previously examined cell, seen from `next`. Consecutive ring
            // cells are always adjacent, so this is one of the eight directions.
            let (dx, dy) = DIRECTIONS[previous];
            let (nx, ny) = DIRECTIONS[(previous + 1) % 8];
            let relative = (dx - nx, dy - ny);
            backtrack = direction_index(relative)
                .expect("consecutive Moore ring cells are adjacent");
            current = next;

            if !states.insert((current.clone(), backtrack)) {
                contour.closed = true;
                return Ok(Trace {
                    contour,
                    stopped: None,
                });
            }
            debug!("Trace step {}: {} (backtrack {})", steps, current, backtrack);
            contour.points.push(current.clone());
        }
    }

    /// Evaluate every `stride`-th point inside the bounding box of all traced
    /// contours and scale the operational share to the box size.
    fn sample_interior(
        &self,
        cache: &mut SampleCache<'a, O>,
        stride: usize,
    ) -> Result<Result<Option<f64>, PartialReason>, ExploreError> {
        let contours = cache.domain_mut().contours().to_vec();
        let mut points = contours.iter().flat_map(|c| c.points.iter());
        let Some(first) = points.next() else {
            return Ok(Ok(None));
        };

        let (mut lo, mut hi) = (first.indices().to_vec(), first.indices().to_vec());
        for point in points {
            for axis in 0..2 {
                lo[axis] = lo[axis].min(point.index(axis));
                hi[axis] = hi[axis].max(point.index(axis));
            }
        }

        let mut sampled = 0u64;
        let mut operational = 0u64;
        for i in (lo[0]..=hi[0]).step_by(stride) {
            for j in (lo[1]..=hi[1]).step_by(stride) {
                let point = Point::new(vec![i, j]);
                match probe(cache, Some(&point))? {
                    Probe::Verdict(verdict) => {
                        sampled += 1;
                        if verdict.is_operational() {
                            operational += 1;
                        }
                    }
                    _ => return Ok(Err(PartialReason::EvaluationBudget)),
                }
            }
        }

        let box_cells = ((hi[0] - lo[0] + 1) * (hi[1] - lo[1] + 1)) as f64;
        let estimate = operational as f64 / sampled as f64 * box_cells;
        debug!(
            "Interior sampling: {}/{} operational, estimated area {:.1} cells",
            operational, sampled, estimate
        );
        Ok(Ok(Some(estimate)))
    }
}

fn pair(delta: (isize, isize)) -> [isize; 2] {
    [delta.0, delta.1]
}

/// Look up `point` through the cache, respecting the evaluation budget.
fn probe<O: Oracle>(
    cache: &mut SampleCache<'_, O>,
    point: Option<&Point>,
) -> Result<Probe, ExploreError> {
    let Some(point) = point else {
        return Ok(Probe::OffGrid);
    };
    if !cache.is_cached(point) && cache.budget_exhausted() {
        return Ok(Probe::OutOfBudget);
    }
    Ok(Probe::Verdict(cache.lookup_or_evaluate(point)?.verdict))
}

/// Trace the operational domain of `space` with `oracle` under `config`.
pub fn contour_tracing<O: Oracle>(
    space: &ParameterSpace,
    oracle: &O,
    config: &ExplorationConfig,
) -> Result<Exploration, ExploreError> {
    ContourTracer::new(space, oracle, config).run()
}
