//! Particle Swarm Optimization over random keys.
//!
//! Each particle is a vector of `n` real keys; decoding ranks the keys, so
//! facility `i` goes to the location equal to the rank of key `i`. The
//! swarm moves in key space with the standard inertia-weight update:
//!
//! ```text
//! v ← w·v + c1·r1·(pbest − x) + c2·r2·(gbest − x)
//! x ← x + v
//! ```
//!
//! Velocities are clamped to `[-v_max, v_max]`. The state iterate is the
//! decoded global best.
//!
//! # Reference
//!
//! - Kennedy, J. & Eberhart, R. (1995). "Particle swarm optimization",
//!   *Proc. ICNN'95* 4, 1942-1948.
//! - Bean, J. C. (1994). "Genetic algorithms and random keys for sequencing
//!   and optimization", *ORSA Journal on Computing* 6(2), 154-160.

use rand::Rng;

use crate::baseline::operators::{decode_keys, encode_keys};
use crate::baseline::{evaluate_all, publish};
use crate::error::{QapError, QapResult};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`ParticleSwarm`].
#[derive(Debug, Clone)]
pub struct PsoConfig {
    pub swarm_size: usize,
    /// Inertia weight `w`.
    pub inertia: f64,
    /// Pull toward the particle's own best, `c1`.
    pub cognitive: f64,
    /// Pull toward the swarm best, `c2`.
    pub social: f64,
    /// Velocity clamp per key.
    pub max_velocity: f64,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 20,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            max_velocity: 0.2,
        }
    }
}

impl PsoConfig {
    pub fn with_swarm_size(mut self, size: usize) -> Self {
        self.swarm_size = size;
        self
    }

    pub fn with_inertia(mut self, w: f64) -> Self {
        self.inertia = w;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.swarm_size < 2 {
            return Err("swarm_size must be at least 2".into());
        }
        if !(0.0..=1.0).contains(&self.inertia) {
            return Err(format!("inertia must be in [0, 1], got {}", self.inertia));
        }
        if self.cognitive < 0.0 || self.social < 0.0 {
            return Err("cognitive and social weights must be non-negative".into());
        }
        if self.max_velocity <= 0.0 {
            return Err("max_velocity must be positive".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Particle {
    keys: Vec<f64>,
    velocity: Vec<f64>,
    best_keys: Vec<f64>,
    best_cost: f64,
}

/// Random-key PSO with a global-best topology.
#[derive(Debug)]
pub struct ParticleSwarm {
    config: PsoConfig,
    swarm: Vec<Particle>,
    global_keys: Vec<f64>,
    global_cost: f64,
}

impl ParticleSwarm {
    pub fn new(config: PsoConfig) -> Self {
        Self {
            config,
            swarm: Vec::new(),
            global_keys: Vec::new(),
            global_cost: f64::INFINITY,
        }
    }

    fn absorb(&mut self, costs: &[f64]) {
        for (particle, &cost) in self.swarm.iter_mut().zip(costs) {
            if cost < particle.best_cost {
                particle.best_cost = cost;
                particle.best_keys.clone_from(&particle.keys);
            }
            if cost < self.global_cost {
                self.global_cost = cost;
                self.global_keys.clone_from(&particle.keys);
            }
        }
    }

    fn decoded(&self) -> Vec<Vec<usize>> {
        self.swarm.iter().map(|p| decode_keys(&p.keys)).collect()
    }
}

impl SolverMethod for ParticleSwarm {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let seed = encode_keys(state.permutation_mut()?.as_slice());
        let n = seed.len();
        let vmax = self.config.max_velocity;
        self.swarm = (0..self.config.swarm_size)
            .map(|k| {
                let keys = if k == 0 {
                    seed.clone()
                } else {
                    (0..n).map(|_| ctx.rng.random_range(0.0..1.0)).collect()
                };
                let velocity = (0..n).map(|_| ctx.rng.random_range(-vmax..=vmax)).collect();
                Particle {
                    best_keys: keys.clone(),
                    keys,
                    velocity,
                    best_cost: f64::INFINITY,
                }
            })
            .collect();
        self.global_cost = f64::INFINITY;
        let costs = evaluate_all(ctx.problem, &self.decoded());
        self.absorb(&costs);
        publish(state, &decode_keys(&self.global_keys), self.global_cost);
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        if self.swarm.is_empty() {
            self.initialize(ctx, state)?;
        }
        let PsoConfig {
            inertia,
            cognitive,
            social,
            max_velocity,
            ..
        } = self.config;
        for particle in &mut self.swarm {
            for d in 0..particle.keys.len() {
                let r1: f64 = ctx.rng.random_range(0.0..1.0);
                let r2: f64 = ctx.rng.random_range(0.0..1.0);
                let x = particle.keys[d];
                let v = inertia * particle.velocity[d]
                    + cognitive * r1 * (particle.best_keys[d] - x)
                    + social * r2 * (self.global_keys[d] - x);
                let v = v.clamp(-max_velocity, max_velocity);
                particle.velocity[d] = v;
                particle.keys[d] = x + v;
            }
        }
        let costs = evaluate_all(ctx.problem, &self.decoded());
        self.absorb(&costs);
        publish(state, &decode_keys(&self.global_keys), self.global_cost);
        Ok(())
    }
}

impl MethodSpec for ParticleSwarm {
    const NAME: &'static str = "particle_swarm";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        let d = PsoConfig::default();
        ParamSchema::new()
            .with(ParamSpec::int("swarm_size", d.swarm_size as i64, "number of particles").at_least(2.0))
            .with(ParamSpec::float("inertia", d.inertia, "inertia weight").range(0.0, 1.0))
            .with(ParamSpec::float("cognitive", d.cognitive, "pull toward personal best").at_least(0.0))
            .with(ParamSpec::float("social", d.social, "pull toward swarm best").at_least(0.0))
            .with(ParamSpec::float("max_velocity", d.max_velocity, "velocity clamp per key"))
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = PsoConfig {
            swarm_size: params.usize("swarm_size")?,
            inertia: params.float("inertia")?,
            cognitive: params.float("cognitive")?,
            social: params.float("social")?,
            max_velocity: params.float("max_velocity")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{solve, Iterate, SolveConfig};
    use crate::problem::generate;
    use crate::projection::ProjectionConfig;
    use crate::random::create_rng;
    use crate::registry::MethodRegistry;
    use crate::solution::Permutation;

    #[test]
    fn test_validate() {
        assert!(PsoConfig::default().validate().is_ok());
        assert!(PsoConfig::default().with_swarm_size(1).validate().is_err());
        assert!(PsoConfig::default().with_inertia(1.2).validate().is_err());
    }

    #[test]
    fn test_global_best_monotone_and_velocity_clamped() {
        let p = generate::random_uniform(8, 10, 21).unwrap();
        let projection = ProjectionConfig::default();
        let mut rng = create_rng(3);
        let start = Permutation::random(8, &mut rng);
        let start_cost = p.permutation_cost(start.as_slice());
        let mut state = SolverState::new(Iterate::Discrete(start), start_cost);
        let mut pso = ParticleSwarm::new(PsoConfig::default().with_swarm_size(6));
        let mut ctx = StepContext {
            problem: &p,
            rng: &mut rng,
            projection: &projection,
            iteration: 0,
            best_objective: f64::INFINITY,
        };
        pso.initialize(&mut ctx, &mut state).unwrap();
        assert!(state.objective <= start_cost);
        let mut previous = state.objective;
        for _ in 0..10 {
            pso.step(&mut ctx, &mut state).unwrap();
            assert!(state.objective <= previous);
            previous = state.objective;
            for particle in &pso.swarm {
                assert!(particle.velocity.iter().all(|v| v.abs() <= 0.2 + 1e-12));
            }
        }
    }

    #[test]
    fn test_solve() {
        let mut r = MethodRegistry::new();
        r.register_method::<ParticleSwarm>();
        let p = generate::random_uniform(9, 10, 17).unwrap();
        let config = SolveConfig::default().with_max_iterations(25).with_param("swarm_size", 10);
        let result = solve(&r, &p, "particle_swarm", &config).unwrap();
        assert!(result.objective_value <= result.trace[0].best_objective);
    }
}
