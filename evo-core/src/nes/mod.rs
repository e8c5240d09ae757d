//! Optimizer for Natural Evolutionary Strategies
//!
//! Candidates are drawn as antithetic pairs `mean ± σz`.  On `tell` the
//! fitness values are turned into utilities, either through rank-based
//! fitness shaping (Wierstra et al.) or z-whitening, and the mean moves along
//! the utility-weighted sum of the noise vectors.  An optional momentum term
//! smooths consecutive steps.

use crate::error::{EvoError, Result};
use crate::sampler::{uniform_vec, NoiseSampler};
use crate::state::{Params, State};
use crate::strategy::*;

/// Momentum vector carried between generations
pub const VELOCITY: &str = "velocity";

/// Settings for Natural ES
#[derive(Debug, Clone, PartialEq)]
pub struct Natural {
    /// Number of dimensions of each candidate
    pub num_dims: usize,

    /// Number of candidates per generation.  Must be even, since every
    /// sampled direction is paired with its mirror image.
    pub popsize: usize,
}

impl Natural {
    /// Creates a new Natural ES
    pub fn new(num_dims: usize, popsize: usize) -> Result<Self> {
        if num_dims == 0 {
            return Err(EvoError::InvalidConfiguration(
                "natural ES needs at least one dimension".to_string(),
            ));
        }
        check_antithetic(popsize)?;
        Ok(Natural {
            num_dims: num_dims,
            popsize: popsize,
        })
    }
}

fn check_antithetic(popsize: usize) -> Result<()> {
    if popsize < 2 || popsize % 2 != 0 {
        Err(EvoError::InvalidConfiguration(format!(
            "natural ES needs an even population of at least 2, got {}",
            popsize
        )))
    } else {
        Ok(())
    }
}

// Takes a list of scores and, in effect, performs z-whitening, scaling
// the results by the learning rate.  alpha corresponds to the learning rate
fn normalize_weights(scores: &mut [f32], alpha: f32) -> () {
    let n_scores = scores.len() as f32;
    debug_assert!(n_scores > 1f32);

    let sum: f32 = scores.iter().sum();
    let mu = sum / n_scores;
    // Compute stdev
    let var: f32 = scores.iter().map(|v| (v - mu).powi(2)).sum::<f32>() / n_scores;
    let std = var.sqrt();

    // If everything is the same, nothing is preferred
    if std == 0f32 {
        for s in scores.iter_mut() {
            *s = 0f32;
        }
    } else {
        // We add an error epsilon (1e-6) to avoid the case where standard deviation
        // is close to zero, resulting in an overflow.
        let denom = std + 1e-6;
        for s in scores.iter_mut() {
            *s = alpha * (*s - mu) / denom;
        }
    }
}

// Replaces fitness values with rank-based utilities; the lowest fitness
// receives the largest utility.  Utilities sum to zero.
fn fitness_shape(fitness: &[f32]) -> Vec<f32> {
    let len = fitness.len();
    let log_len = (len as f32 / 2. + 1.).ln();
    let mut utilities = vec![0f32; len];
    let mut sum = 0.;
    for (rank, i) in rank_ascending(fitness).into_iter().enumerate() {
        let nom = (0f32).max(log_len - ((rank + 1) as f32).ln());
        utilities[i] = nom;
        sum += nom;
    }
    for u in utilities.iter_mut() {
        *u = *u / sum - 1. / len as f32;
    }
    utilities
}

impl Strategy for Natural {
    fn num_dims(&self) -> usize {
        self.num_dims
    }

    fn popsize(&self) -> usize {
        self.popsize
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("sigma_init", 0.1f32)
            .with("sigma_decay", 0.999f32)
            .with("sigma_limit", 0.01f32)
            .with("lrate", 1.0f32)
            .with("momentum", 0.0f32)
            .with("shape", true)
            .with("init_min", -2.0f32)
            .with("init_max", 2.0f32)
    }

    fn initialize(&self, seed: u64, params: &Params) -> Result<State> {
        let sigma = positive_param(params, "sigma_init")?;
        positive_param(params, "sigma_decay")?;
        positive_param(params, "lrate")?;
        params.get_f32("sigma_limit")?;
        params.get_bool("shape")?;
        let momentum = params.get_f32("momentum")?;
        if !(momentum >= 0. && momentum < 1.) {
            return Err(EvoError::InvalidConfiguration(format!(
                "'momentum' must be in [0, 1), got {}",
                momentum
            )));
        }

        let mean = uniform_vec(
            seed,
            self.num_dims,
            params.get_f32("init_min")?,
            params.get_f32("init_max")?,
        )?;
        Ok(base_state(mean, sigma, self.popsize).with(VELOCITY, vec![0f32; self.num_dims]))
    }

    fn ask(&self, seed: u64, state: State, _params: &Params) -> Result<(Batch, State)> {
        let popsize = state.get_usize(POPSIZE)?;
        check_antithetic(popsize)?;
        let sigma = state.get_f32(SIGMA)?;
        let mut ns = NoiseSampler::new(seed, 1.0)?;

        let mut candidates = Vec::with_capacity(popsize);
        {
            let mean = state.get_vector(MEAN)?;
            for _ in 0..(popsize / 2) {
                let z = ns.sample_vec(mean.len());
                // For the antithetic sample, we simply mirror it.
                let pos: Vec<f32> = mean.iter().zip(&z).map(|(m, e)| m + sigma * e).collect();
                let neg: Vec<f32> = mean.iter().zip(&z).map(|(m, e)| m - sigma * e).collect();
                candidates.push(pos);
                candidates.push(neg);
            }
        }
        Ok((candidates, state))
    }

    fn tell(
        &self,
        candidates: &[Vec<f32>],
        fitness: &[f32],
        mut state: State,
        params: &Params,
    ) -> Result<State> {
        let popsize = state.get_usize(POPSIZE)?;
        check_batch(candidates, fitness, popsize, self.num_dims)?;

        let sigma = state.get_f32(SIGMA)?;
        let lrate = params.get_f32("lrate")?;
        let mu = params.get_f32("momentum")?;

        // Shaped utilities are already scaled by the population size;
        // whitened scores are not.
        let (utilities, denom) = if params.get_bool("shape")? {
            (fitness_shape(fitness), 1f32)
        } else {
            let mut scores: Vec<f32> = fitness.iter().map(|f| -f).collect();
            normalize_weights(&mut scores, 1.0);
            (scores, popsize as f32)
        };

        let mut mean = state.get_vector(MEAN)?.to_vec();
        let mut velocity = state.get_vector(VELOCITY)?.to_vec();

        // Combine the noise directions to produce the actual step
        let mut step = vec![0f32; self.num_dims];
        for (u, x) in utilities.iter().zip(candidates) {
            for j in 0..self.num_dims {
                let z = if sigma > 0. { (x[j] - mean[j]) / sigma } else { 0. };
                step[j] += u * z;
            }
        }

        for j in 0..self.num_dims {
            velocity[j] = mu * velocity[j] + lrate * sigma * step[j] / denom;
            mean[j] += velocity[j];
        }

        let sigma = (sigma * params.get_f32("sigma_decay")?).max(params.get_f32("sigma_limit")?);

        state.insert(MEAN, mean);
        state.insert(VELOCITY, velocity);
        state.insert(SIGMA, sigma);
        update_best(&mut state, candidates, fitness)?;
        advance_generation(&mut state)?;
        Ok(state)
    }
}
