//! Tabu Search over the swap neighbourhood.
//!
//! # Algorithm
//!
//! Each step scans all `n(n-1)/2` swaps and applies the best admissible
//! one. After swapping facilities `r` and `s`, moving either back to its
//! previous location is tabu for `tenure` steps. A tabu move is admissible
//! anyway if it yields a new global best (aspiration). If every move is
//! tabu, the least bad one is taken.
//!
//! # Reference
//!
//! - Glover, F. (1989). "Tabu Search—Part I", *ORSA Journal on Computing* 1(3), 190-206.
//! - Taillard, É. (1991). "Robust taboo search for the quadratic assignment
//!   problem", *Parallel Computing* 17, 443-455.

use rand::Rng;

use crate::error::{QapError, QapResult};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`TabuSearch`].
///
/// # Examples
///
/// ```
/// use u_qap::baseline::tabu::TabuConfig;
///
/// let config = TabuConfig::default()
///     .with_tenure(7)
///     .with_tenure_jitter(3)
///     .with_aspiration(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct TabuConfig {
    /// How many steps a reversed assignment stays tabu.
    pub tenure: usize,
    /// Uniform random extra tenure in `0..=tenure_jitter` per move.
    pub tenure_jitter: usize,
    /// Override tabu status when the move produces a new global best.
    pub aspiration: bool,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            tenure: 8,
            tenure_jitter: 4,
            aspiration: true,
        }
    }
}

impl TabuConfig {
    pub fn with_tenure(mut self, tenure: usize) -> Self {
        self.tenure = tenure;
        self
    }

    pub fn with_tenure_jitter(mut self, jitter: usize) -> Self {
        self.tenure_jitter = jitter;
        self
    }

    pub fn with_aspiration(mut self, aspiration: bool) -> Self {
        self.aspiration = aspiration;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tenure == 0 {
            return Err("tenure must be at least 1".into());
        }
        Ok(())
    }
}

/// Swap-based tabu search with aspiration.
#[derive(Debug)]
pub struct TabuSearch {
    config: TabuConfig,
    /// `tabu_until[i * n + l]`: step until which facility `i` may not
    /// return to location `l`.
    tabu_until: Vec<usize>,
    best_cost: f64,
}

impl TabuSearch {
    pub fn new(config: TabuConfig) -> Self {
        Self {
            config,
            tabu_until: Vec::new(),
            best_cost: f64::INFINITY,
        }
    }

    fn is_tabu(&self, n: usize, perm: &[usize], r: usize, s: usize, step: usize) -> bool {
        self.tabu_until[r * n + perm[s]] > step && self.tabu_until[s * n + perm[r]] > step
    }
}

impl SolverMethod for TabuSearch {
    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let problem = ctx.problem;
        let n = problem.size();
        if self.tabu_until.len() != n * n {
            self.tabu_until = vec![0; n * n];
        }
        let step = ctx.iteration;
        let current = state.objective;
        self.best_cost = self.best_cost.min(ctx.best_objective).min(current);
        let perm = state.permutation_mut()?;

        let mut admissible: Option<(usize, usize, f64)> = None;
        let mut fallback: Option<(usize, usize, f64)> = None;
        for r in 0..n {
            for s in (r + 1)..n {
                let d = problem.swap_delta(perm.as_slice(), r, s);
                if fallback.is_none_or(|(_, _, fd)| d < fd) {
                    fallback = Some((r, s, d));
                }
                let tabu = self.is_tabu(n, perm.as_slice(), r, s, step);
                let aspirates = self.config.aspiration && current + d < self.best_cost - 1e-9;
                if (!tabu || aspirates) && admissible.is_none_or(|(_, _, ad)| d < ad) {
                    admissible = Some((r, s, d));
                }
            }
        }

        let Some((r, s, d)) = admissible.or(fallback) else {
            return Ok(());
        };
        let extra = if self.config.tenure_jitter > 0 {
            ctx.rng.random_range(0..=self.config.tenure_jitter)
        } else {
            0
        };
        let until = step + self.config.tenure + extra;
        let (pr, ps) = (perm.as_slice()[r], perm.as_slice()[s]);
        self.tabu_until[r * n + pr] = until;
        self.tabu_until[s * n + ps] = until;
        perm.swap(r, s);

        state.objective = current + d;
        self.best_cost = self.best_cost.min(state.objective);
        Ok(())
    }
}

impl MethodSpec for TabuSearch {
    const NAME: &'static str = "tabu_search";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        let d = TabuConfig::default();
        ParamSchema::new()
            .with(ParamSpec::int("tenure", d.tenure as i64, "steps a reversal stays tabu").at_least(1.0))
            .with(ParamSpec::int("tenure_jitter", d.tenure_jitter as i64, "random extra tenure").at_least(0.0))
            .with(ParamSpec::bool("aspiration", d.aspiration, "allow tabu moves that beat the best"))
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = TabuConfig {
            tenure: params.usize("tenure")?,
            tenure_jitter: params.usize("tenure_jitter")?,
            aspiration: params.bool("aspiration")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}
