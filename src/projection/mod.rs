//! Projection and validation.
//!
//! Two responsibilities:
//!
//! - **Doubly-stochastic projection** ([`SinkhornProjector`]): maps an
//!   arbitrary real matrix (e.g. after a gradient step) onto the Birkhoff
//!   polytope.
//! - **Discretization** ([`discretize`]): rounds a relaxed solution to the
//!   nearest permutation by solving a linear assignment problem.

mod assignment;
mod sinkhorn;
mod validate;

pub use assignment::{discretize, greedy_max, hungarian_max};
pub use sinkhorn::{SinkhornOutcome, SinkhornProjector};
pub use validate::{is_doubly_stochastic, is_permutation_matrix, marginal_error};

/// Projection and discretization settings.
///
/// # Examples
///
/// ```
/// use u_qap::projection::ProjectionConfig;
///
/// let config = ProjectionConfig::default()
///     .with_tolerance(1e-8)
///     .with_damping(0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectionConfig {
    /// Marginal tolerance ε for polytope membership.
    pub tolerance: f64,

    /// Sinkhorn sweep limit before reporting divergence.
    pub max_iterations: usize,

    /// Blend factor toward the uniform matrix used when retrying a
    /// diverged projection.
    pub damping: f64,

    /// Marginal error above which discretization logs a warning.
    pub far_threshold: f64,

    /// Largest `n` solved with the exact Hungarian method; larger
    /// matrices use greedy extraction.
    pub exact_assignment_limit: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 1000,
            damping: 0.1,
            far_threshold: 1e-2,
            exact_assignment_limit: 512,
        }
    }
}

impl ProjectionConfig {
    pub fn with_tolerance(mut self, eps: f64) -> Self {
        self.tolerance = eps;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_far_threshold(mut self, threshold: f64) -> Self {
        self.far_threshold = threshold;
        self
    }

    pub fn with_exact_assignment_limit(mut self, n: usize) -> Self {
        self.exact_assignment_limit = n;
        self
    }

    /// The Sinkhorn projector these settings describe.
    pub fn projector(&self) -> SinkhornProjector {
        SinkhornProjector::new(self.tolerance, self.max_iterations)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.tolerance > 0.0) {
            return Err("projection tolerance must be positive".into());
        }
        if self.max_iterations == 0 {
            return Err("projection max_iterations must be at least 1".into());
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(format!("damping must be in (0, 1], got {}", self.damping));
        }
        if !(self.far_threshold > 0.0) {
            return Err("far_threshold must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = ProjectionConfig::default();
        assert!((c.tolerance - 1e-6).abs() < 1e-18);
        assert_eq!(c.max_iterations, 1000);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_damping() {
        assert!(ProjectionConfig::default().with_damping(0.0).validate().is_err());
        assert!(ProjectionConfig::default().with_damping(1.5).validate().is_err());
    }

    #[test]
    fn test_validate_bad_tolerance() {
        assert!(ProjectionConfig::default().with_tolerance(-1.0).validate().is_err());
        assert!(ProjectionConfig::default().with_max_iterations(0).validate().is_err());
    }
}
