//! Canonical (μ/μ_w, λ) Evolutionary Strategy in ask/tell form

use crate::error::{EvoError, Result};
use crate::sampler::{uniform_vec, NoiseSampler};
use crate::state::{Params, State};
use crate::strategy::*;

// Precomputes the weights post fitness shaping
fn build_weights(size: usize) -> Vec<f32> {
    let fsize = size as f32;
    let noms: Vec<f32> = (1..(size + 1))
        .map(|i| (fsize + 0.5).ln() - (i as f32).ln())
        .collect();

    let denom: f32 = noms.iter().sum();
    noms.into_iter().map(|x| x / denom).collect()
}

/// Settings for canonical ES
#[derive(Debug, Clone, PartialEq)]
pub struct Canonical {
    /// Number of dimensions of each candidate
    pub num_dims: usize,

    /// Number of candidates to generate each generation
    pub popsize: usize,
}

impl Canonical {
    /// Creates a new canonical ES
    pub fn new(num_dims: usize, popsize: usize) -> Result<Self> {
        if num_dims == 0 || popsize == 0 {
            return Err(EvoError::InvalidConfiguration(format!(
                "canonical ES needs at least one dimension and one child, got {}x{}",
                popsize, num_dims
            )));
        }
        Ok(Canonical {
            num_dims: num_dims,
            popsize: popsize,
        })
    }

    // Number of top candidates to blend into the next mean
    fn parents(&self, popsize: usize, params: &Params) -> Result<usize> {
        let ratio = params.get_f32("elite_ratio")?;
        if !(ratio > 0. && ratio <= 1.) {
            return Err(EvoError::InvalidConfiguration(format!(
                "'elite_ratio' must be in (0, 1], got {}",
                ratio
            )));
        }
        Ok(((popsize as f32 * ratio).floor() as usize).max(1))
    }
}

impl Strategy for Canonical {
    fn num_dims(&self) -> usize {
        self.num_dims
    }

    fn popsize(&self) -> usize {
        self.popsize
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("sigma_init", 1.0f32)
            .with("sigma_decay", 0.999f32)
            .with("sigma_limit", 0.01f32)
            .with("elite_ratio", 0.5f32)
            .with("init_min", -2.0f32)
            .with("init_max", 2.0f32)
    }

    fn initialize(&self, seed: u64, params: &Params) -> Result<State> {
        let sigma = positive_param(params, "sigma_init")?;
        positive_param(params, "sigma_decay")?;
        params.get_f32("sigma_limit")?;
        self.parents(self.popsize, params)?;

        let mean = uniform_vec(
            seed,
            self.num_dims,
            params.get_f32("init_min")?,
            params.get_f32("init_max")?,
        )?;
        Ok(base_state(mean, sigma, self.popsize))
    }

    fn ask(&self, seed: u64, state: State, _params: &Params) -> Result<(Batch, State)> {
        let popsize = state.get_usize(POPSIZE)?;
        let sigma = state.get_f32(SIGMA)?;
        let mut ns = NoiseSampler::new(seed, 1.0)?;

        let candidates: Batch = {
            let mean = state.get_vector(MEAN)?;
            (0..popsize)
                .map(|_| {
                    let mut z = ns.sample_vec(mean.len());
                    for (zi, mi) in z.iter_mut().zip(mean) {
                        *zi = mi + sigma * *zi;
                    }
                    z
                })
                .collect()
        };
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

        // Recombinate the top candidates with log-rank weights
        let parents = self.parents(popsize, params)?;
        let weights = build_weights(parents);
        let order = rank_ascending(fitness);
        let mut new_mean = vec![0f32; self.num_dims];
        for (w, idx) in weights.iter().zip(order.iter()) {
            for (m, x) in new_mean.iter_mut().zip(candidates[*idx].iter()) {
                *m += w * x;
            }
        }

        let sigma = state.get_f32(SIGMA)? * params.get_f32("sigma_decay")?;
        let sigma = sigma.max(params.get_f32("sigma_limit")?);

        state.insert(MEAN, new_mean);
        state.insert(SIGMA, sigma);
        update_best(&mut state, candidates, fitness)?;
        advance_generation(&mut state)?;
        Ok(state)
    }
}
