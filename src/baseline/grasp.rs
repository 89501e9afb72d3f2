//! Greedy Randomized Adaptive Search Procedure.
//!
//! One step builds a fresh assignment and polishes it:
//!
//! 1. Facilities are placed in decreasing order of total flow.
//! 2. For each facility, every free location is priced by the cost it adds
//!    against the facilities already placed.
//! 3. The restricted candidate list (RCL) keeps locations whose added cost
//!    is within `alpha` of the cheapest; one is drawn uniformly.
//! 4. Swap descent finishes the construction.
//!
//! `alpha = 0` is pure greedy; `alpha = 1` is uniform random construction.
//!
//! # Reference
//!
//! Li, Y., Pardalos, P. M. & Resende, M. G. C. (1994). "A greedy randomized
//! adaptive search procedure for the quadratic assignment problem",
//! *DIMACS Series* 16, 237-261.

use rand::Rng;

use crate::baseline::local_search::swap_descent;
use crate::baseline::publish;
use crate::error::{QapError, QapResult};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::problem::Problem;
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`Grasp`].
#[derive(Debug, Clone)]
pub struct GraspConfig {
    /// RCL greediness in `[0, 1]`.
    pub alpha: f64,
    /// Pass limit for the descent after construction.
    pub local_search_passes: usize,
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            local_search_passes: 50,
        }
    }
}

impl GraspConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(format!("alpha must be in [0, 1], got {}", self.alpha));
        }
        if self.local_search_passes == 0 {
            return Err("local_search_passes must be at least 1".into());
        }
        Ok(())
    }
}

/// GRASP with flow-ordered randomized greedy construction.
#[derive(Debug)]
pub struct Grasp {
    config: GraspConfig,
    order: Vec<usize>,
}

impl Grasp {
    pub fn new(config: GraspConfig) -> Self {
        Self {
            config,
            order: Vec::new(),
        }
    }
}

/// Facilities sorted by decreasing total in+out flow.
fn flow_order(problem: &Problem) -> Vec<usize> {
    let a = problem.flow();
    let n = problem.size();
    let weight: Vec<f64> = (0..n)
        .map(|i| (0..n).map(|j| a.get(i, j) + a.get(j, i)).sum())
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| weight[y].total_cmp(&weight[x]).then(x.cmp(&y)));
    order
}

/// Randomized greedy assignment following `order`.
fn construct<R: Rng>(problem: &Problem, order: &[usize], alpha: f64, rng: &mut R) -> Vec<usize> {
    let n = problem.size();
    let (a, b) = (problem.flow(), problem.distance());
    let mut perm = vec![usize::MAX; n];
    let mut used = vec![false; n];
    let mut placed: Vec<usize> = Vec::with_capacity(n);

    for &i in order {
        let priced: Vec<(usize, f64)> = (0..n)
            .filter(|&l| !used[l])
            .map(|l| {
                let added = a.get(i, i) * b.get(l, l)
                    + placed
                        .iter()
                        .map(|&j| {
                            let m = perm[j];
                            a.get(i, j) * b.get(l, m) + a.get(j, i) * b.get(m, l)
                        })
                        .sum::<f64>();
                (l, added)
            })
            .collect();
        let lo = priced.iter().map(|&(_, c)| c).fold(f64::INFINITY, f64::min);
        let hi = priced.iter().map(|&(_, c)| c).fold(f64::NEG_INFINITY, f64::max);
        let cutoff = lo + alpha * (hi - lo);
        let rcl: Vec<usize> = priced
            .iter()
            .filter(|&&(_, c)| c <= cutoff)
            .map(|&(l, _)| l)
            .collect();
        let l = rcl[rng.random_range(0..rcl.len())];
        perm[i] = l;
        used[l] = true;
        placed.push(i);
    }
    perm
}

impl SolverMethod for Grasp {
    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        if self.order.len() != ctx.problem.size() {
            self.order = flow_order(ctx.problem);
        }
        let mut perm = construct(ctx.problem, &self.order, self.config.alpha, ctx.rng);
        let mut cost = ctx.problem.permutation_cost(&perm);
        swap_descent(ctx.problem, &mut perm, &mut cost, self.config.local_search_passes);
        publish(state, &perm, cost);
        Ok(())
    }
}

impl MethodSpec for Grasp {
    const NAME: &'static str = "grasp";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        let d = GraspConfig::default();
        ParamSchema::new()
            .with(ParamSpec::float("alpha", d.alpha, "RCL greediness, 0 = greedy").range(0.0, 1.0))
            .with(
                ParamSpec::int("local_search_passes", d.local_search_passes as i64, "descent pass limit")
                    .at_least(1.0),
            )
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = GraspConfig {
            alpha: params.float("alpha")?,
            local_search_passes: params.usize("local_search_passes")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}
