//! The discretized grid of physical settings being swept.
//!
//! A [`ParameterSpace`] is an ordered list of [`Dimension`]s. Each dimension
//! sweeps one [`SweepParameter`] from `min` to `max` in steps of `step`, so
//! it has `floor((max - min) / step) + 1` discrete levels. A [`Point`] is a
//! tuple of level indices, one per dimension, and maps to physical values
//! via `min + index * step`.

use crate::error::ExploreError;
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slack added before flooring the level count so that `(2.0 - 1.0) / 0.5`
/// yields three levels even when the division lands a hair below 2.
const LEVEL_EPSILON: f64 = 1e-9;

/// Most levels a single axis may have.
pub const MAX_LEVELS: usize = 1 << 24;

/// Steps with more decimals than this are used unrounded.
const MAX_STEP_DECIMALS: usize = 12;

/// Physical parameter swept along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    /// Relative permittivity of the substrate.
    EpsilonR,
    /// Thomas-Fermi screening length (nm).
    LambdaTf,
    /// Charge transition level µ₋ (eV).
    MuMinus,
}

impl SweepParameter {
    /// Column/identifier name.
    pub fn name(self) -> &'static str {
        match self {
            SweepParameter::EpsilonR => "epsilon_r",
            SweepParameter::LambdaTf => "lambda_tf",
            SweepParameter::MuMinus => "mu_minus",
        }
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "epsilon_r" | "epsilon-r" | "eps" => Ok(SweepParameter::EpsilonR),
            "lambda_tf" | "lambda-tf" | "lambda" => Ok(SweepParameter::LambdaTf),
            "mu_minus" | "mu-minus" | "mu" => Ok(SweepParameter::MuMinus),
            other => Err(format!(
                "unknown sweep parameter '{}' (expected epsilon_r, lambda_tf or mu_minus)",
                other
            )),
        }
    }
}

/// One swept axis of the parameter space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Which physical parameter this axis sweeps.
    pub parameter: SweepParameter,
    /// Lowest swept value (inclusive).
    pub min: f64,
    /// Highest swept value (inclusive if it lies on the step lattice).
    pub max: f64,
    /// Distance between adjacent levels.
    pub step: f64,
}

impl Dimension {
    pub fn new(parameter: SweepParameter, min: f64, max: f64, step: f64) -> Self {
        Self {
            parameter,
            min,
            max,
            step,
        }
    }

    /// Number of discrete levels along this axis.
    ///
    /// Zero for an axis [`ParameterSpace::new`] would reject.
    pub fn levels(&self) -> usize {
        self.level_count().unwrap_or(0)
    }

    fn level_count(&self) -> Option<usize> {
        let spans = ((self.max - self.min) / self.step + LEVEL_EPSILON).floor();
        if !spans.is_finite() || spans < 0.0 || spans >= MAX_LEVELS as f64 {
            return None;
        }
        Some(spans as usize + 1)
    }

    /// Physical value of level `index`, rounded to the decimals of `min`
    /// and `step` so that `1.0 + 3 * 0.05` reads `1.15`.
    pub fn value_at(&self, index: usize) -> f64 {
        let value = self.min + index as f64 * self.step;
        let places = decimals(self.step).max(decimals(self.min));
        if places > MAX_STEP_DECIMALS {
            return value;
        }
        let scale = 10f64.powi(places as i32);
        let rounded = (value * scale).round() / scale;
        if rounded.is_finite() {
            rounded
        } else {
            value
        }
    }

    /// Level closest to `value`, or `None` if `value` lies off the axis.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        let raw = ((value - self.min) / self.step).round();
        if raw < 0.0 || raw as usize >= self.levels() {
            return None;
        }
        Some(raw as usize)
    }

    fn validate(&self, index: usize) -> Result<(), ExploreError> {
        let reason = if !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite()) {
            Some("bounds and step must be finite".to_string())
        } else if self.step <= 0.0 {
            Some(format!("step must be positive, got {}", self.step))
        } else if self.min > self.max {
            Some(format!("min {} exceeds max {}", self.min, self.max))
        } else if self.level_count().is_none() {
            Some(format!(
                "step {} over {} .. {} yields more than {} levels",
                self.step, self.min, self.max, MAX_LEVELS
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ExploreError::InvalidDimension { index, reason }),
            None => Ok(()),
        }
    }
}

/// Digits after the decimal point in the shortest representation of `x`.
fn decimals(x: f64) -> usize {
    let repr = x.abs().to_string();
    repr.find('.').map_or(0, |dot| repr.len() - dot - 1)
}

/// A grid point: one level index per dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point(Vec<usize>);

impl Point {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Level indices, one per dimension.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Level index along `axis`.
    pub fn index(&self, axis: usize) -> usize {
        self.0[axis]
    }

    pub fn dimensionality(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for Point {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", index)?;
        }
        f.write_str(")")
    }
}

/// Which grid points count as adjacent during flood fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// ±1 along a single axis: 2K neighbours.
    #[default]
    VonNeumann,
    /// Every point within Chebyshev distance 1: 3^K - 1 neighbours.
    Moore,
}

/// The discretized grid under exploration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpace {
    dimensions: Vec<Dimension>,
}

impl<'de> Deserialize<'de> for ParameterSpace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Unchecked {
            dimensions: Vec<Dimension>,
        }

        let unchecked = Unchecked::deserialize(deserializer)?;
        Self::new(unchecked.dimensions).map_err(de::Error::custom)
    }
}

impl ParameterSpace {
    /// Build a space, validating every dimension.
    ///
    /// Fails with `EmptySpace` for zero dimensions, `InvalidDimension` for a
    /// non-positive step, `min > max`, too many levels on one axis or a grid
    /// whose point count overflows `usize`, and `DuplicateParameter` if the
    /// same physical parameter is swept twice.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self, ExploreError> {
        if dimensions.is_empty() {
            return Err(ExploreError::EmptySpace);
        }

        let mut total = 1usize;
        for (index, dimension) in dimensions.iter().enumerate() {
            dimension.validate(index)?;
            total = total.checked_mul(dimension.levels()).ok_or_else(|| {
                ExploreError::InvalidDimension {
                    index,
                    reason: "grid has more points than can be addressed".to_string(),
                }
            })?;
            if dimensions[..index]
                .iter()
                .any(|d| d.parameter == dimension.parameter)
            {
                return Err(ExploreError::DuplicateParameter {
                    index,
                    parameter: dimension.parameter,
                });
            }
        }

        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Number of swept dimensions (K).
    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    /// Levels per dimension.
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::levels).collect()
    }

    /// Total number of grid points.
    pub fn total_points(&self) -> usize {
        self.dimensions.iter().map(Dimension::levels).product()
    }

    /// Whether `point` has the right arity and every index is in range.
    pub fn contains(&self, point: &Point) -> bool {
        point.dimensionality() == self.dimensions.len()
            && point
                .indices()
                .iter()
                .zip(&self.dimensions)
                .all(|(&index, dimension)| index < dimension.levels())
    }

    /// Physical values of `point`, one per dimension.
    pub fn values(&self, point: &Point) -> Vec<f64> {
        point
            .indices()
            .iter()
            .zip(&self.dimensions)
            .map(|(&index, dimension)| dimension.value_at(index))
            .collect()
    }

    /// Grid point nearest to the physical `values`, if every value lies on
    /// its axis.
    pub fn point_at(&self, values: &[f64]) -> Option<Point> {
        if values.len() != self.dimensions.len() {
            return None;
        }
        values
            .iter()
            .zip(&self.dimensions)
            .map(|(&value, dimension)| dimension.index_of(value))
            .collect::<Option<Vec<_>>>()
            .map(Point)
    }

    /// Shift `point` by `delta`, returning `None` if the result leaves the grid.
    pub fn offset(&self, point: &Point, delta: &[isize]) -> Option<Point> {
        let mut indices = Vec::with_capacity(delta.len());
        for ((&index, &d), dimension) in point.indices().iter().zip(delta).zip(&self.dimensions) {
            let shifted = index.checked_add_signed(d)?;
            if shifted >= dimension.levels() {
                return None;
            }
            indices.push(shifted);
        }
        Some(Point(indices))
    }

    /// In-grid neighbours of `point`, in a fixed order.
    ///
    /// Von Neumann order is axis by axis, `-1` before `+1`. Moore order is
    /// lexicographic over offsets in `{-1, 0, 1}^K`.
    pub fn neighbors(&self, point: &Point, neighborhood: Neighborhood) -> Vec<Point> {
        let k = self.dimensions.len();
        match neighborhood {
            Neighborhood::VonNeumann => {
                let mut out = Vec::with_capacity(2 * k);
                for axis in 0..k {
                    for step in [-1isize, 1] {
                        let mut delta = vec![0isize; k];
                        delta[axis] = step;
                        if let Some(n) = self.offset(point, &delta) {
                            out.push(n);
                        }
                    }
                }
                out
            }
            Neighborhood::Moore => {
                let mut out = Vec::new();
                let mut delta = vec![-1isize; k];
                loop {
                    if delta.iter().any(|&d| d != 0) {
                        if let Some(n) = self.offset(point, &delta) {
                            out.push(n);
                        }
                    }
                    // Odometer increment over {-1, 0, 1}^K, last axis fastest.
                    let mut axis = k;
                    loop {
                        if axis == 0 {
                            return out;
                        }
                        axis -= 1;
                        if delta[axis] < 1 {
                            delta[axis] += 1;
                            break;
                        }
                        delta[axis] = -1;
                    }
                }
            }
        }
    }

    /// Uniformly random grid point.
    pub fn random_point(&self, rng: &mut impl Rng) -> Point {
        Point(
            self.dimensions
                .iter()
                .map(|d| rng.gen_range(0..d.levels()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn square(min: f64, max: f64, step: f64) -> ParameterSpace {
        ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, min, max, step),
            Dimension::new(SweepParameter::LambdaTf, min, max, step),
        ])
        .unwrap()
    }

    #[test]
    fn test_dimension_levels() {
        assert_eq!(Dimension::new(SweepParameter::EpsilonR, 1.0, 2.0, 0.5).levels(), 3);
        assert_eq!(Dimension::new(SweepParameter::EpsilonR, 1.0, 10.0, 0.05).levels(), 181);
        assert_eq!(Dimension::new(SweepParameter::EpsilonR, 1.0, 1.0, 0.5).levels(), 1);
        assert_eq!(Dimension::new(SweepParameter::EpsilonR, 0.0, 1.0, 0.3).levels(), 4);
    }

    #[test]
    fn test_dimension_value_and_index() {
        let d = Dimension::new(SweepParameter::LambdaTf, 1.0, 2.0, 0.5);
        assert_eq!(d.value_at(0), 1.0);
        assert_eq!(d.value_at(2), 2.0);
        assert_eq!(d.index_of(1.5), Some(1));
        assert_eq!(d.index_of(2.5), None);
        assert_eq!(d.index_of(0.5), None);
        assert_eq!(d.index_of(f64::NAN), None);
    }

    #[test]
    fn test_space_rejects_bad_step() {
        let err = ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, 1.0, 2.0, 0.5),
            Dimension::new(SweepParameter::LambdaTf, 1.0, 2.0, 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, ExploreError::InvalidDimension { index: 1, .. }));
    }

    #[test]
    fn test_space_rejects_inverted_bounds() {
        let err = ParameterSpace::new(vec![Dimension::new(
            SweepParameter::EpsilonR,
            3.0,
            2.0,
            0.5,
        )])
        .unwrap_err();
        assert!(matches!(err, ExploreError::InvalidDimension { index: 0, .. }));
    }

    #[test]
    fn test_space_rejects_too_many_levels() {
        let err = ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, 1.0, 2.0, 0.5),
            Dimension::new(SweepParameter::LambdaTf, 0.0, 1.0, 1e-300),
        ])
        .unwrap_err();
        assert!(matches!(err, ExploreError::InvalidDimension { index: 1, .. }));
        assert_eq!(Dimension::new(SweepParameter::LambdaTf, 0.0, 1.0, 1e-300).levels(), 0);
    }

    #[test]
    fn test_space_rejects_overflowing_point_count() {
        let wide = |parameter| Dimension::new(parameter, 0.0, (MAX_LEVELS - 1) as f64, 1.0);
        let dimensions = vec![
            wide(SweepParameter::EpsilonR),
            wide(SweepParameter::LambdaTf),
            wide(SweepParameter::MuMinus),
        ];
        assert_eq!(dimensions[0].levels(), MAX_LEVELS);

        let err = ParameterSpace::new(dimensions).unwrap_err();
        assert!(matches!(err, ExploreError::InvalidDimension { index: 2, .. }));
    }

    #[test]
    fn test_space_deserialize_validates() {
        let json = r#"{"dimensions": [
            {"parameter": "epsilon_r", "min": 0.0, "max": 1.0, "step": 1e-300}
        ]}"#;
        assert!(serde_json::from_str::<ParameterSpace>(json).is_err());

        let space = square(1.0, 2.0, 0.5);
        let json = serde_json::to_string(&space).unwrap();
        assert_eq!(serde_json::from_str::<ParameterSpace>(&json).unwrap(), space);
    }

    #[test]
    fn test_value_at_rounds_to_step_precision() {
        let d = Dimension::new(SweepParameter::EpsilonR, 1.0, 10.0, 0.05);
        assert_eq!(d.value_at(3), 1.15);
        assert_eq!(d.value_at(3).to_string(), "1.15");
        assert_eq!(d.value_at(180), 10.0);

        let offset = Dimension::new(SweepParameter::MuMinus, -0.325, -0.2, 0.025);
        assert_eq!(offset.value_at(1), -0.3);
        assert_eq!(offset.index_of(-0.3), Some(1));
    }

    #[test]
    fn test_space_rejects_empty_and_duplicates() {
        assert!(matches!(
            ParameterSpace::new(Vec::new()),
            Err(ExploreError::EmptySpace)
        ));
        let err = ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, 1.0, 2.0, 0.5),
            Dimension::new(SweepParameter::EpsilonR, 1.0, 2.0, 0.5),
        ])
        .unwrap_err();
        assert!(matches!(err, ExploreError::DuplicateParameter { index: 1, .. }));
    }

    #[test]
    fn test_space_shape_and_contains() {
        let space = square(1.0, 2.0, 0.5);
        assert_eq!(space.shape(), vec![3, 3]);
        assert_eq!(space.total_points(), 9);
        assert!(space.contains(&Point::new(vec![2, 2])));
        assert!(!space.contains(&Point::new(vec![3, 0])));
        assert!(!space.contains(&Point::new(vec![0])));
    }

    #[test]
    fn test_space_values_and_point_at() {
        let space = square(1.0, 2.0, 0.5);
        let p = space.point_at(&[1.5, 2.0]).unwrap();
        assert_eq!(p, Point::new(vec![1, 2]));
        assert_eq!(space.values(&p), vec![1.5, 2.0]);
        assert!(space.point_at(&[1.5]).is_none());
        assert!(space.point_at(&[1.5, 9.0]).is_none());
    }

    #[test]
    fn test_von_neumann_neighbors_skip_out_of_bounds() {
        let space = square(1.0, 2.0, 0.5);
        let corner = space.neighbors(&Point::new(vec![0, 0]), Neighborhood::VonNeumann);
        assert_eq!(corner, vec![Point::new(vec![1, 0]), Point::new(vec![0, 1])]);

        let center = space.neighbors(&Point::new(vec![1, 1]), Neighborhood::VonNeumann);
        assert_eq!(center.len(), 4);
        assert_eq!(center[0], Point::new(vec![0, 1]));
        assert_eq!(center[3], Point::new(vec![1, 2]));
    }

    #[test]
    fn test_moore_neighbors() {
        let space = square(1.0, 2.0, 0.5);
        let center = space.neighbors(&Point::new(vec![1, 1]), Neighborhood::Moore);
        assert_eq!(center.len(), 8);
        assert_eq!(center[0], Point::new(vec![0, 0]));
        assert_eq!(center[7], Point::new(vec![2, 2]));
        assert!(!center.contains(&Point::new(vec![1, 1])));

        let corner = space.neighbors(&Point::new(vec![0, 0]), Neighborhood::Moore);
        assert_eq!(corner.len(), 3);
    }

    #[test]
    fn test_neighbors_three_dimensions() {
        let space = ParameterSpace::new(vec![
            Dimension::new(SweepParameter::EpsilonR, 0.0, 4.0, 1.0),
            Dimension::new(SweepParameter::LambdaTf, 0.0, 4.0, 1.0),
            Dimension::new(SweepParameter::MuMinus, 0.0, 4.0, 1.0),
        ])
        .unwrap();
        let p = Point::new(vec![2, 2, 2]);
        assert_eq!(space.neighbors(&p, Neighborhood::VonNeumann).len(), 6);
        assert_eq!(space.neighbors(&p, Neighborhood::Moore).len(), 26);
    }

    #[test]
    fn test_random_point_in_bounds_and_deterministic() {
        let space = square(1.0, 10.0, 0.05);
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let p = space.random_point(&mut a);
            assert!(space.contains(&p));
            assert_eq!(p, space.random_point(&mut b));
        }
    }

    #[test]
    fn test_sweep_parameter_parse() {
        assert_eq!("epsilon_r".parse::<SweepParameter>(), Ok(SweepParameter::EpsilonR));
        assert_eq!("LAMBDA_TF".parse::<SweepParameter>(), Ok(SweepParameter::LambdaTf));
        assert!("kelvin".parse::<SweepParameter>().is_err());
        assert_eq!(SweepParameter::MuMinus.to_string(), "mu_minus");
    }

    #[test]
    fn test_point_display() {
        assert_eq!(Point::new(vec![3, 14]).to_string(), "(3, 14)");
    }
}
