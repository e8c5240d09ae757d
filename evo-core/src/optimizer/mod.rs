use std::time::SystemTime;

use crate::error::Result;
use crate::restart::RESTART_COUNTER;
use crate::sampler::SeedStream;
use crate::state::{Params, State};
use crate::strategy::{Batch, Strategy, BEST_FITNESS, BEST_MEMBER};

/// Result of evaluating a batch of candidates
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Rollout {
    /// One fitness value per candidate, in batch order
    pub function_value: Vec<f32>,
}

/// Fitness function which evaluates a batch of candidates
pub trait Task: Send + Sync {
    /// Evaluates every row of `batch`.  Lower is better.  Deterministic
    /// tasks may ignore the seed.
    fn rollout(&self, seed: u64, batch: &[Vec<f32>]) -> Result<Rollout>;
}

/// The interface the run loop drives: a base strategy, optionally wrapped
/// with restart logic.
pub trait Optimizer {
    /// Default configuration
    fn default_params(&self) -> Params;

    /// Builds the initial state
    fn initialize(&self, seed: u64, params: &Params) -> Result<State>;

    /// Samples a batch of candidates
    fn ask(&self, seed: u64, state: State, params: &Params) -> Result<(Batch, State)>;

    /// Feeds back the fitness of the last batch
    fn tell(
        &self,
        seed: u64,
        candidates: &[Vec<f32>],
        fitness: &[f32],
        state: State,
        params: &Params,
    ) -> Result<State>;
}

/// Runs a base strategy on its own, without restarts
pub struct Standalone<S>(pub S);

impl<S: Strategy> Optimizer for Standalone<S> {
    fn default_params(&self) -> Params {
        self.0.default_params()
    }

    fn initialize(&self, seed: u64, params: &Params) -> Result<State> {
        self.0.initialize(seed, params)
    }

    fn ask(&self, seed: u64, state: State, params: &Params) -> Result<(Batch, State)> {
        self.0.ask(seed, state, params)
    }

    fn tell(
        &self,
        _seed: u64,
        candidates: &[Vec<f32>],
        fitness: &[f32],
        state: State,
        params: &Params,
    ) -> Result<State> {
        self.0.tell(candidates, fitness, state, params)
    }
}

/// Outcome of a run
#[derive(Serialize, Clone, Debug)]
pub struct Summary {
    /// Best fitness over the whole run
    pub best_fitness: f32,
    /// Member that achieved it
    pub best_member: Vec<f32>,
    /// Generations executed
    pub generations: usize,
    /// Candidates evaluated
    pub evaluations: usize,
    /// Restarts performed, zero for unwrapped strategies
    pub restarts: usize,
}

/// Settings for the ask/evaluate/tell loop
#[derive(Debug, Clone, PartialEq)]
pub struct Runner {
    /// Number of generations to run
    pub generations: usize,

    /// How often to report progress; zero disables reporting
    pub report_iter: usize,

    /// Master seed every per-call seed is derived from
    pub seed: u64,
}

impl Runner {
    /// Runs `optimizer` against `task` for the configured number of
    /// generations.  Every call receives its own seed.
    pub fn run<O, T>(&self, optimizer: &O, task: &T, params: &Params) -> Result<Summary>
    where
        O: Optimizer,
        T: Task,
    {
        let mut seeds = SeedStream::new(self.seed);
        let mut state = optimizer.initialize(seeds.next_seed(), params)?;
        let mut evaluations = 0;

        let now = SystemTime::now();
        for pass in 0..self.generations {
            let (candidates, asked) = optimizer.ask(seeds.next_seed(), state, params)?;
            let rollout = task.rollout(seeds.next_seed(), &candidates)?;
            evaluations += candidates.len();
            state = optimizer.tell(
                seeds.next_seed(),
                &candidates,
                &rollout.function_value,
                asked,
                params,
            )?;

            if self.report_iter > 0 && (pass + 1) % self.report_iter == 0 {
                let elapsed = now.elapsed().map(|e| e.as_secs_f64()).unwrap_or(0.);
                let n = rollout.function_value.len().max(1) as f32;
                let avg_fitness = rollout.function_value.iter().sum::<f32>() / n;
                info!(
                    elapsed = elapsed,
                    generation = pass + 1,
                    avg_fitness = f64::from(avg_fitness),
                    best_fitness = f64::from(state.get_f32(BEST_FITNESS)?),
                    restarts = restarts(&state)?,
                    "progress"
                );
            }
        }

        Ok(Summary {
            best_fitness: state.get_f32(BEST_FITNESS)?,
            best_member: state.get_vector(BEST_MEMBER)?.to_vec(),
            generations: self.generations,
            evaluations: evaluations,
            restarts: restarts(&state)?,
        })
    }
}

fn restarts(state: &State) -> Result<usize> {
    if state.contains_key(RESTART_COUNTER) {
        state.get_usize(RESTART_COUNTER)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::Canonical;
    use crate::error::EvoError;
    use crate::restart::{Reinitialize, RestartWrapper, SpreadCriterion, MIN_NUM_GENS};

    struct Sphere;

    impl Task for Sphere {
        fn rollout(&self, _seed: u64, batch: &[Vec<f32>]) -> Result<Rollout> {
            Ok(Rollout {
                function_value: batch
                    .iter()
                    .map(|r| r.iter().map(|v| v * v).sum())
                    .collect(),
            })
        }
    }

    struct Broken;

    impl Task for Broken {
        fn rollout(&self, _seed: u64, _batch: &[Vec<f32>]) -> Result<Rollout> {
            Ok(Rollout {
                function_value: vec![0.],
            })
        }
    }

    #[test]
    fn test_standalone_run() {
        let opt = Standalone(Canonical::new(3, 10).unwrap());
        let params = opt.default_params();
        let runner = Runner {
            generations: 20,
            report_iter: 5,
            seed: 3,
        };
        let summary = runner.run(&opt, &Sphere, &params).unwrap();
        assert_eq!(summary.generations, 20);
        assert_eq!(summary.evaluations, 200);
        assert_eq!(summary.restarts, 0);
        assert_eq!(summary.best_member.len(), 3);
        let recomputed: f32 = summary.best_member.iter().map(|v| v * v).sum();
        assert!((recomputed - summary.best_fitness).abs() < 1e-5);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let opt = RestartWrapper::with_policy(Canonical::new(2, 8).unwrap(), Reinitialize)
            .with_criterion(SpreadCriterion);
        let params = opt
            .default_params()
            .with(MIN_NUM_GENS, 5usize)
            .with("sigma_decay", 0.8f32)
            .with("sigma_limit", 1e-3f32)
            .with("min_fitness_spread", 1e-2f32);
        let runner = Runner {
            generations: 60,
            report_iter: 0,
            seed: 99,
        };
        let a = runner.run(&opt, &Sphere, &params).unwrap();
        let b = runner.run(&opt, &Sphere, &params).unwrap();
        assert_eq!(a.best_member, b.best_member);
        assert_eq!(a.restarts, b.restarts);
        assert!(a.restarts > 0);
    }

    #[test]
    fn test_task_shape_errors_propagate() {
        let opt = Standalone(Canonical::new(2, 4).unwrap());
        let params = opt.default_params();
        let runner = Runner {
            generations: 1,
            report_iter: 0,
            seed: 0,
        };
        match runner.run(&opt, &Broken, &params) {
            Err(EvoError::ShapeMismatch { .. }) => (),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
