//! Every sampled point of one exploration run, with verdicts.

use crate::oracle::{Metrics, Verdict};
use crate::space::{ParameterSpace, Point};
use crate::stats::RunStatistics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One evaluated grid point. Created once per distinct point per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub point: Point,
    /// Physical values of `point`, one per dimension.
    pub values: Vec<f64>,
    pub verdict: Verdict,
    pub metrics: Metrics,
}

impl Sample {
    pub fn is_operational(&self) -> bool {
        self.verdict.is_operational()
    }
}

/// Which exploration strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FloodFill,
    ContourTracing,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::FloodFill => f.write_str("flood fill"),
            Strategy::ContourTracing => f.write_str("contour tracing"),
        }
    }
}

/// Why a run stopped before characterizing the whole region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialReason {
    /// The evaluation budget ran out with work still queued.
    EvaluationBudget,
    /// A contour trace hit its step cap before closing.
    IterationCap,
    /// A contour ran into the grid edge under [`EdgePolicy::Stop`].
    ///
    /// [`EdgePolicy::Stop`]: crate::config::EdgePolicy::Stop
    GridEdge,
}

impl fmt::Display for PartialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialReason::EvaluationBudget => f.write_str("evaluation budget exhausted"),
            PartialReason::IterationCap => f.write_str("trace iteration cap reached"),
            PartialReason::GridEdge => f.write_str("contour reached the grid edge"),
        }
    }
}

/// Whether a result covers the region fully or was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    #[default]
    Complete,
    Partial(PartialReason),
}

impl Completeness {
    pub fn is_complete(self) -> bool {
        matches!(self, Completeness::Complete)
    }

    pub fn partial_reason(self) -> Option<PartialReason> {
        match self {
            Completeness::Complete => None,
            Completeness::Partial(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completeness::Complete => f.write_str("complete"),
            Completeness::Partial(reason) => write!(f, "partial ({})", reason),
        }
    }
}

/// One traced boundary of the operational region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contour {
    /// Operational boundary points in trace order, starting at the anchor.
    pub points: Vec<Point>,
    pub closed: bool,
    /// Whether the trace followed the grid edge somewhere.
    pub touches_grid_edge: bool,
}

/// Mapping from sampled points to samples, in visitation order.
#[derive(Debug, Clone, Serialize)]
pub struct DomainResult {
    space: ParameterSpace,
    samples: Vec<Sample>,
    #[serde(skip)]
    index: BTreeMap<Point, usize>,
    completeness: Completeness,
    contours: Vec<Contour>,
    area_estimate: Option<f64>,
}

impl DomainResult {
    pub fn new(space: ParameterSpace) -> Self {
        Self {
            space,
            samples: Vec::new(),
            index: BTreeMap::new(),
            completeness: Completeness::Complete,
            contours: Vec::new(),
            area_estimate: None,
        }
    }

    /// Record a sample and return its slot. A point sampled again keeps its
    /// original position in visitation order; its verdict and metrics are
    /// replaced.
    pub(crate) fn insert(&mut self, sample: Sample) -> usize {
        match self.index.get(&sample.point) {
            Some(&slot) => {
                self.samples[slot] = sample;
                slot
            }
            None => {
                let slot = self.samples.len();
                self.index.insert(sample.point.clone(), slot);
                self.samples.push(sample);
                slot
            }
        }
    }

    pub(crate) fn slot_of(&self, point: &Point) -> Option<usize> {
        self.index.get(point).copied()
    }

    pub(crate) fn sample_at(&self, slot: usize) -> &Sample {
        &self.samples[slot]
    }

    pub(crate) fn set_completeness(&mut self, completeness: Completeness) {
        self.completeness = completeness;
    }

    pub(crate) fn push_contour(&mut self, contour: Contour) {
        self.contours.push(contour);
    }

    pub(crate) fn set_area_estimate(&mut self, area: Option<f64>) {
        self.area_estimate = area;
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn get(&self, point: &Point) -> Option<&Sample> {
        self.index.get(point).map(|&slot| &self.samples[slot])
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.index.contains_key(point)
    }

    /// All samples in visitation order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Points in visitation order.
    pub fn visited_points(&self) -> impl Iterator<Item = &Point> {
        self.samples.iter().map(|s| &s.point)
    }

    pub fn operational_points(&self) -> impl Iterator<Item = &Point> {
        self.samples
            .iter()
            .filter(|s| s.is_operational())
            .map(|s| &s.point)
    }

    pub fn non_operational_points(&self) -> impl Iterator<Item = &Point> {
        self.samples
            .iter()
            .filter(|s| !s.is_operational())
            .map(|s| &s.point)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn completeness(&self) -> Completeness {
        self.completeness
    }

    pub fn is_complete(&self) -> bool {
        self.completeness.is_complete()
    }

    /// Traced contours (contour tracing only).
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Estimated number of operational grid points from coarse interior
    /// sampling, if it was requested and every contour closed.
    pub fn area_estimate(&self) -> Option<f64> {
        self.area_estimate
    }
}

/// Result of one exploration run.
#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub strategy: Strategy,
    pub domain: DomainResult,
    pub stats: RunStatistics,
}

impl Exploration {
    pub fn is_complete(&self) -> bool {
        self.domain.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{Dimension, SweepParameter};

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![Dimension::new(SweepParameter::EpsilonR, 0.0, 4.0, 1.0)]).unwrap()
    }

    fn sample(index: usize, verdict: Verdict) -> Sample {
        Sample {
            point: Point::new(vec![index]),
            values: vec![index as f64],
            verdict,
            metrics: Metrics::new(),
        }
    }

    #[test]
    fn test_domain_preserves_visitation_order() {
        let mut domain = DomainResult::new(space());
        domain.insert(sample(3, Verdict::Operational));
        domain.insert(sample(1, Verdict::NonOperational));
        domain.insert(sample(2, Verdict::Operational));

        let order: Vec<_> = domain.visited_points().cloned().collect();
        assert_eq!(
            order,
            vec![Point::new(vec![3]), Point::new(vec![1]), Point::new(vec![2])]
        );
        assert_eq!(domain.operational_points().count(), 2);
        assert_eq!(domain.non_operational_points().count(), 1);
    }

    #[test]
    fn test_domain_reinsert_keeps_slot() {
        let mut domain = DomainResult::new(space());
        domain.insert(sample(0, Verdict::Operational));
        domain.insert(sample(1, Verdict::Operational));
        domain.insert(sample(0, Verdict::NonOperational));

        assert_eq!(domain.len(), 2);
        assert_eq!(domain.samples()[0].verdict, Verdict::NonOperational);
        assert_eq!(
            domain.get(&Point::new(vec![0])).map(|s| s.verdict),
            Some(Verdict::NonOperational)
        );
    }

    #[test]
    fn test_completeness_display() {
        assert_eq!(Completeness::Complete.to_string(), "complete");
        assert_eq!(
            Completeness::Partial(PartialReason::EvaluationBudget).to_string(),
            "partial (evaluation budget exhausted)"
        );
        assert_eq!(
            Completeness::Partial(PartialReason::GridEdge).partial_reason(),
            Some(PartialReason::GridEdge)
        );
    }

    #[test]
    fn test_new_domain_is_empty_and_complete() {
        let domain = DomainResult::new(space());
        assert!(domain.is_empty());
        assert!(domain.is_complete());
        assert!(domain.contours().is_empty());
        assert_eq!(domain.area_estimate(), None);
    }
}
