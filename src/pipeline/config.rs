//! Solve configuration.

use std::time::Duration;

use crate::matrix::SquareMatrix;
use crate::projection::ProjectionConfig;
use crate::registry::{ParamValue, Params};
use crate::solution::Permutation;

/// Starting point supplied by the caller instead of the default seed.
#[derive(Debug, Clone, PartialEq)]
pub enum WarmStart {
    /// A relaxed matrix; projected before the first step.
    Matrix(SquareMatrix),
    /// A permutation; used as a polytope vertex by continuous methods.
    Permutation(Permutation),
}

impl WarmStart {
    pub fn size(&self) -> usize {
        match self {
            WarmStart::Matrix(m) => m.size(),
            WarmStart::Permutation(p) => p.len(),
        }
    }
}

/// Configuration of a single solver run.
///
/// # Examples
///
/// ```
/// use u_qap::pipeline::SolveConfig;
///
/// let config = SolveConfig::default()
///     .with_max_iterations(500)
///     .with_window(25)
///     .with_time_limit_ms(2_000)
///     .with_seed(7)
///     .with_param("momentum", 0.9);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SolveConfig {
    /// Hard cap on solver steps.
    pub max_iterations: usize,

    /// Relative improvement threshold for convergence.
    ///
    /// The run converges when the signal changes by at most
    /// `tolerance · max(1, |signal|)` across `window` steps.
    pub tolerance: f64,

    /// Number of steps the improvement is measured over.
    pub window: usize,

    /// Optional wall-clock limit in milliseconds.
    ///
    /// Checked before each step, so a run may overshoot by one step.
    pub time_limit_ms: Option<u64>,

    /// Seed for the run's random generator.
    pub seed: u64,

    /// Optional starting point.
    pub warm_start: Option<WarmStart>,

    /// Polytope projection and discretization settings.
    pub projection: ProjectionConfig,

    /// Method parameter overrides, merged over the method's defaults.
    pub params: Params,

    /// Record every k-th step in the trace (the last step is always recorded).
    pub trace_stride: usize,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
            window: 50,
            time_limit_ms: None,
            seed: 42,
            warm_start: None,
            projection: ProjectionConfig::default(),
            params: Params::new(),
            trace_stride: 1,
        }
    }
}

impl SolveConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_warm_start(mut self, start: WarmStart) -> Self {
        self.warm_start = Some(start);
        self
    }

    pub fn with_projection(mut self, projection: ProjectionConfig) -> Self {
        self.projection = projection;
        self
    }

    /// Sets one method parameter override.
    pub fn with_param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.set(name, value);
        self
    }

    /// Replaces all method parameter overrides.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_trace_stride(mut self, stride: usize) -> Self {
        self.trace_stride = stride;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if !(self.tolerance >= 0.0) {
            return Err("tolerance must be non-negative".into());
        }
        if self.window == 0 {
            return Err("window must be at least 1".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        if self.trace_stride == 0 {
            return Err("trace_stride must be at least 1".into());
        }
        self.projection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = SolveConfig::default();
        assert_eq!(c.max_iterations, 1000);
        assert_eq!(c.window, 50);
        assert_eq!(c.seed, 42);
        assert!(c.time_limit_ms.is_none());
        assert!(c.params.is_empty());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let c = SolveConfig::default()
            .with_max_iterations(10)
            .with_tolerance(0.0)
            .with_window(3)
            .with_seed(9)
            .with_param("tenure", 5);
        assert_eq!(c.max_iterations, 10);
        assert_eq!(c.window, 3);
        assert_eq!(c.seed, 9);
        assert_eq!(c.params.usize("tenure").unwrap(), 5);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        assert!(SolveConfig::default().with_max_iterations(0).validate().is_err());
        assert!(SolveConfig::default().with_window(0).validate().is_err());
        assert!(SolveConfig::default().with_time_limit_ms(0).validate().is_err());
        assert!(SolveConfig::default().with_trace_stride(0).validate().is_err());
        assert!(SolveConfig::default().with_tolerance(-1.0).validate().is_err());
    }

    #[test]
    fn test_time_limit() {
        let c = SolveConfig::default().with_time_limit_ms(1500);
        assert_eq!(c.time_limit(), Some(Duration::from_millis(1500)));
    }
}
