//! Laplace descent configuration.

use crate::error::{QapError, QapResult};
use crate::registry::{ParamSchema, ParamSpec, Params};

/// Configuration for [`FftLaplace`](super::FftLaplace).
///
/// # Examples
///
/// ```
/// use u_qap::novel::fft_laplace::LaplaceConfig;
///
/// let config = LaplaceConfig::default()
///     .with_learning_rate(0.3)
///     .with_tau(2.0)
///     .with_momentum(0.8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct LaplaceConfig {
    /// Step size before the `1/n` entry scaling.
    pub learning_rate: f64,

    /// Smoothing strength τ. Zero disables preconditioning.
    pub tau: f64,

    /// Heavy-ball momentum coefficient in `[0, 1)`.
    pub momentum: f64,
}

impl Default for LaplaceConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            tau: 1.0,
            momentum: 0.5,
        }
    }
}

impl LaplaceConfig {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.learning_rate > 0.0) {
            return Err("learning_rate must be positive".into());
        }
        if !(self.tau >= 0.0) {
            return Err("tau must be non-negative".into());
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(format!("momentum must be in [0, 1), got {}", self.momentum));
        }
        Ok(())
    }

    pub(crate) fn schema() -> ParamSchema {
        let d = Self::default();
        ParamSchema::new()
            .with(ParamSpec::float("learning_rate", d.learning_rate, "step size").range(1e-9, 1e3))
            .with(ParamSpec::float("tau", d.tau, "Laplacian smoothing strength").at_least(0.0))
            .with(ParamSpec::float("momentum", d.momentum, "heavy-ball coefficient").range(0.0, 0.999))
    }

    pub(crate) fn from_params(params: &Params) -> QapResult<Self> {
        let config = Self {
            learning_rate: params.float("learning_rate")?,
            tau: params.float("tau")?,
            momentum: params.float("momentum")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = LaplaceConfig::default();
        assert!((c.learning_rate - 0.5).abs() < 1e-12);
        assert!((c.tau - 1.0).abs() < 1e-12);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_momentum() {
        assert!(LaplaceConfig::default().with_momentum(1.0).validate().is_err());
        assert!(LaplaceConfig::default().with_momentum(-0.1).validate().is_err());
    }

    #[test]
    fn test_validate_bad_tau() {
        assert!(LaplaceConfig::default().with_tau(-1.0).validate().is_err());
    }

    #[test]
    fn test_from_params_uses_defaults() {
        let params = LaplaceConfig::schema().defaults().with("tau", 3.0);
        let c = LaplaceConfig::from_params(&params).unwrap();
        assert!((c.tau - 3.0).abs() < 1e-12);
        assert!((c.momentum - 0.5).abs() < 1e-12);
    }
}
