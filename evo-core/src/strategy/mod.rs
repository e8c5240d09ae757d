//! The ask/tell interface every base strategy implements, plus the field
//! names and bookkeeping shared by the concrete strategies.

use std::f32;

use float_ord::FloatOrd;

use crate::error::{EvoError, Result};
use crate::state::{Params, State};

/// A population of candidates, one row per member
pub type Batch = Vec<Vec<f32>>;

/// Generations since the last (re)initialization
pub const GEN_COUNTER: &str = "gen_counter";
/// Best fitness seen over the whole run
pub const BEST_FITNESS: &str = "best_fitness";
/// Member that produced `best_fitness`
pub const BEST_MEMBER: &str = "best_member";
/// Center of the search distribution
pub const MEAN: &str = "mean";
/// Step size of the search distribution
pub const SIGMA: &str = "sigma";
/// Number of candidates produced by `ask`
pub const POPSIZE: &str = "popsize";

/// A base evolution strategy.  Implementations own the schema of their
/// `State`, but must maintain `gen_counter`, `best_fitness` and `best_member`
/// so that stopping criteria and restart controllers can rely on them.
///
/// Fitness is minimized.
pub trait Strategy: Send + Sync {
    /// Dimensionality of a candidate
    fn num_dims(&self) -> usize;

    /// Population size produced by a freshly initialized state
    fn popsize(&self) -> usize;

    /// Default configuration for this strategy
    fn default_params(&self) -> Params;

    /// Builds a new search state
    fn initialize(&self, seed: u64, params: &Params) -> Result<State>;

    /// Samples a new batch of candidates
    fn ask(&self, seed: u64, state: State, params: &Params) -> Result<(Batch, State)>;

    /// Updates the search state with the fitness of the last batch
    fn tell(
        &self,
        candidates: &[Vec<f32>],
        fitness: &[f32],
        state: State,
        params: &Params,
    ) -> Result<State>;
}

/// Fields every strategy starts with
pub fn base_state(mean: Vec<f32>, sigma: f32, popsize: usize) -> State {
    State::new()
        .with(GEN_COUNTER, 0usize)
        .with(BEST_FITNESS, f32::INFINITY)
        .with(BEST_MEMBER, mean.clone())
        .with(MEAN, mean)
        .with(SIGMA, sigma)
        .with(POPSIZE, popsize)
}

/// Validates that a batch matches the fitness vector and the expected width
pub fn check_batch(
    candidates: &[Vec<f32>],
    fitness: &[f32],
    popsize: usize,
    num_dims: usize,
) -> Result<()> {
    if candidates.len() != popsize {
        return Err(EvoError::ShapeMismatch {
            expected: popsize,
            got: candidates.len(),
        });
    }
    if fitness.len() != candidates.len() {
        return Err(EvoError::ShapeMismatch {
            expected: candidates.len(),
            got: fitness.len(),
        });
    }
    if let Some(row) = candidates.iter().find(|r| r.len() != num_dims) {
        return Err(EvoError::ShapeMismatch {
            expected: num_dims,
            got: row.len(),
        });
    }
    Ok(())
}

/// Index of the lowest fitness, ignoring NaN
pub fn argmin(fitness: &[f32]) -> Option<usize> {
    fitness
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_nan())
        .min_by_key(|(_, f)| FloatOrd(**f))
        .map(|(i, _)| i)
}

/// Member indices ordered from best to worst fitness; NaN ranks last
pub fn rank_ascending(fitness: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by_key(|i| {
        let f = fitness[*i];
        if f.is_nan() {
            (1, FloatOrd(0.))
        } else {
            (0, FloatOrd(f))
        }
    });
    order
}

/// Replaces `best_fitness`/`best_member` if this generation improved on them
pub fn update_best(state: &mut State, candidates: &[Vec<f32>], fitness: &[f32]) -> Result<()> {
    let best = state.get_f32(BEST_FITNESS)?;
    if let Some(idx) = argmin(fitness) {
        if fitness[idx] < best {
            state.insert(BEST_FITNESS, fitness[idx]);
            state.insert(BEST_MEMBER, candidates[idx].as_slice());
        }
    }
    Ok(())
}

/// Increments the generation counter
pub fn advance_generation(state: &mut State) -> Result<()> {
    let gen = state.get_usize(GEN_COUNTER)?;
    state.insert(GEN_COUNTER, gen + 1);
    Ok(())
}

/// Reads a finite, strictly positive scalar parameter
pub fn positive_param(params: &Params, key: &str) -> Result<f32> {
    let v = params.get_f32(key)?;
    if v > 0. && v.is_finite() {
        Ok(v)
    } else {
        Err(EvoError::InvalidConfiguration(format!(
            "'{}' must be positive and finite, got {}",
            key, v
        )))
    }
}
