//! SA configuration and cooling schedules.

use crate::error::{QapError, QapResult};
use crate::registry::{ParamSchema, ParamSpec, Params};

/// Cooling schedule for temperature reduction.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k`.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// Linear cooling from `T_0` to `T_min` over `steps` cooling steps.
    Linear {
        steps: usize,
    },

    /// Lundy-Mees cooling: `T_{k+1} = T_k / (1 + beta * T_k)`.
    ///
    /// Cools fast at high T, slow at low T.
    LundyMees {
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.95 }
    }
}

impl CoolingSchedule {
    /// Temperature after cooling step `step` (0-based).
    pub fn next(self, temperature: f64, step: usize, initial: f64, min: f64) -> f64 {
        let t = match self {
            CoolingSchedule::Geometric { alpha } => temperature * alpha,
            CoolingSchedule::Linear { steps } => {
                if steps == 0 {
                    min
                } else {
                    initial - (step + 1) as f64 * (initial - min) / steps as f64
                }
            }
            CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
        };
        t.max(min)
    }

    /// Integer code used in the parameter table.
    fn code(self) -> i64 {
        match self {
            CoolingSchedule::Geometric { .. } => 0,
            CoolingSchedule::Linear { .. } => 1,
            CoolingSchedule::LundyMees { .. } => 2,
        }
    }
}

/// Configuration for [`SimulatedAnnealing`](super::SimulatedAnnealing).
///
/// # Examples
///
/// ```
/// use u_qap::baseline::sa::{CoolingSchedule, SaConfig};
///
/// let config = SaConfig::default()
///     .with_initial_temperature(100.0)
///     .with_min_temperature(0.001)
///     .with_cooling(CoolingSchedule::Geometric { alpha: 0.98 })
///     .with_moves_per_step(200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SaConfig {
    /// Initial temperature. `None` derives it from sampled swap deltas.
    pub initial_temperature: Option<f64>,

    /// Temperature floor; the search keeps running greedily once reached.
    pub min_temperature: f64,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Swap proposals per solver step (one cooling step per solver step).
    pub moves_per_step: usize,

    /// Random swaps sampled when deriving the initial temperature.
    pub calibration_samples: usize,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: None,
            min_temperature: 1e-3,
            cooling: CoolingSchedule::default(),
            moves_per_step: 100,
            calibration_samples: 100,
        }
    }
}

impl SaConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = Some(t);
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_moves_per_step(mut self, n: usize) -> Self {
        self.moves_per_step = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(t) = self.initial_temperature {
            if !(t > 0.0) {
                return Err("initial_temperature must be positive".into());
            }
            if self.min_temperature >= t {
                return Err("min_temperature must be less than initial_temperature".into());
            }
        }
        if !(self.min_temperature > 0.0) {
            return Err("min_temperature must be positive".into());
        }
        if self.moves_per_step == 0 {
            return Err("moves_per_step must be at least 1".into());
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return Err(format!("geometric alpha must be in (0, 1), got {alpha}"));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if !(beta > 0.0) {
                    return Err(format!("lundy-mees beta must be positive, got {beta}"));
                }
            }
            CoolingSchedule::Linear { .. } => {}
        }
        Ok(())
    }

    pub(crate) fn schema() -> ParamSchema {
        let d = Self::default();
        ParamSchema::new()
            .with(
                ParamSpec::float("initial_temperature", 0.0, "starting temperature (0 = auto)")
                    .at_least(0.0),
            )
            .with(ParamSpec::float("min_temperature", d.min_temperature, "temperature floor").at_least(1e-12))
            .with(
                ParamSpec::int("schedule", d.cooling.code(), "0 geometric, 1 linear, 2 lundy-mees")
                    .range(0.0, 2.0),
            )
            .with(ParamSpec::float("alpha", 0.95, "geometric cooling factor").range(1e-6, 0.999_999))
            .with(ParamSpec::int("linear_steps", 1000, "steps to reach the floor (linear)").at_least(1.0))
            .with(ParamSpec::float("beta", 1e-3, "lundy-mees parameter").at_least(1e-12))
            .with(ParamSpec::int("moves_per_step", d.moves_per_step as i64, "proposals per step").at_least(1.0))
    }

    pub(crate) fn from_params(params: &Params) -> QapResult<Self> {
        let cooling = match params.int("schedule")? {
            0 => CoolingSchedule::Geometric {
                alpha: params.float("alpha")?,
            },
            1 => CoolingSchedule::Linear {
                steps: params.usize("linear_steps")?,
            },
            _ => CoolingSchedule::LundyMees {
                beta: params.float("beta")?,
            },
        };
        let t0 = params.float("initial_temperature")?;
        let config = Self {
            initial_temperature: (t0 > 0.0).then_some(t0),
            min_temperature: params.float("min_temperature")?,
            cooling,
            moves_per_step: params.usize("moves_per_step")?,
            ..Self::default()
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(config)
    }
}
