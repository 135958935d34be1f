//! The operational oracle decides whether a gate works at one parameter point.
//!
//! The oracle is the expensive part of every exploration: typically a full
//! ground-state simulation per input combination of the gate's truth
//! table. The engine never looks inside it. Layout and gate specification
//! are bound into the implementor; the engine only supplies the physical
//! constants of the point being probed.
//!
//! Any `Fn(&SimulationParameters) -> Result<Evaluation, OracleError>`
//! closure is an oracle:
//!
//! ```
//! use opdomain_explore::oracle::{Evaluation, Oracle, OracleError};
//! use opdomain_explore::parameters::SimulationParameters;
//!
//! let oracle = |p: &SimulationParameters| -> Result<Evaluation, OracleError> {
//!     Ok(Evaluation::from_operational(p.epsilon_r * p.lambda_tf <= 2.25))
//! };
//! let eval = oracle.evaluate(&SimulationParameters::new(3, -0.32, 1.5, 1.5)).unwrap();
//! assert!(eval.verdict.is_operational());
//! ```

use crate::parameters::SimulationParameters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Error type oracles report. Propagated to the caller unchanged.
pub type OracleError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque numeric side results of an evaluation (e.g. an energy gap),
/// carried through to the domain result without interpretation.
pub type Metrics = BTreeMap<String, f64>;

/// Operational status of one parameter point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The layout implements the gate's truth table.
    Operational,
    /// At least one input combination yields the wrong output.
    NonOperational,
}

impl Verdict {
    pub fn is_operational(self) -> bool {
        matches!(self, Verdict::Operational)
    }
}

impl From<bool> for Verdict {
    fn from(operational: bool) -> Self {
        if operational {
            Verdict::Operational
        } else {
            Verdict::NonOperational
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Operational => f.write_str("operational"),
            Verdict::NonOperational => f.write_str("non-operational"),
        }
    }
}

/// What the oracle returns for one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub metrics: Metrics,
    /// Simulator invocations consumed by this evaluation. Counted as at
    /// least one by the engine.
    pub invocations: u64,
}

impl Evaluation {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            metrics: Metrics::new(),
            invocations: 1,
        }
    }

    pub fn from_operational(operational: bool) -> Self {
        Self::new(Verdict::from(operational))
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn with_invocations(mut self, invocations: u64) -> Self {
        self.invocations = invocations;
        self
    }
}

/// Decides operational status for one set of physical constants.
///
/// Oracles must be `Sync` so frontier points can be evaluated from a
/// worker pool.
pub trait Oracle: Sync {
    fn evaluate(&self, parameters: &SimulationParameters) -> Result<Evaluation, OracleError>;

    /// Whether verdicts may be memoized per point.
    ///
    /// Non-deterministic oracles return `false`; every visit of a point then
    /// re-evaluates it.
    fn caches_verdicts(&self) -> bool {
        true
    }
}

impl<F> Oracle for F
where
    F: Fn(&SimulationParameters) -> Result<Evaluation, OracleError> + Sync,
{
    fn evaluate(&self, parameters: &SimulationParameters) -> Result<Evaluation, OracleError> {
        self(parameters)
    }
}

/// Wraps an oracle and counts how often it is called.
pub struct CountingOracle<O> {
    inner: O,
    calls: AtomicU64,
}

impl<O: Oracle> CountingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of `evaluate` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: Oracle> Oracle for CountingOracle<O> {
    fn evaluate(&self, parameters: &SimulationParameters) -> Result<Evaluation, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.evaluate(parameters)
    }

    fn caches_verdicts(&self) -> bool {
        self.inner.caches_verdicts()
    }
}
