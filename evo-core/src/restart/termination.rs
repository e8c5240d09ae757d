//! Stop criteria deciding when a run should be restarted.
//!
//! Each criterion returns an unsigned score; any non-zero score marks it as
//! triggered.  Scores are summed, so the aggregate trigger is the logical OR
//! of all criteria.  The aggregate is additionally gated by
//! [`min_gen_criterion`], which keeps freshly (re)started searches alive for
//! `min_num_gens` generations.

use crate::error::Result;
use crate::state::{Params, State};
use crate::strategy::{GEN_COUNTER, SIGMA};

/// Minimum number of generations between restarts
pub const MIN_NUM_GENS: &str = "min_num_gens";

/// A predicate over one generation's fitness and the advanced state
pub trait StopCriterion: Send + Sync {
    /// Name used in log events
    fn name(&self) -> &str {
        "custom"
    }

    /// Parameters this criterion reads, with their defaults
    fn default_params(&self) -> Params {
        Params::new()
    }

    /// Non-zero when the criterion is triggered
    fn score(&self, fitness: &[f32], state: &State, params: &Params) -> Result<u32>;
}

impl<F> StopCriterion for F
where
    F: Fn(&[f32], &State, &Params) -> u32 + Send + Sync,
{
    fn score(&self, fitness: &[f32], state: &State, params: &Params) -> Result<u32> {
        Ok(self(fitness, state, params))
    }
}

/// True once at least `min_num_gens` generations have passed since the last
/// (re)initialization
pub fn min_gen_criterion(state: &State, params: &Params) -> Result<bool> {
    Ok(state.get_usize(GEN_COUNTER)? >= params.get_usize(MIN_NUM_GENS)?)
}

/// Aggregates the criteria and applies the minimum-generation guard
pub fn should_stop(
    criteria: &[Box<dyn StopCriterion>],
    fitness: &[f32],
    state: &State,
    params: &Params,
) -> Result<bool> {
    let mut total = 0u32;
    for crit in criteria.iter() {
        let score = crit.score(fitness, state, params)?;
        if score > 0 {
            trace!(criterion = crit.name(), score = score, "stop criterion triggered");
        }
        total = total.saturating_add(score);
    }
    Ok(total > 0 && min_gen_criterion(state, params)?)
}

/// Triggers when the generation's fitness values have collapsed onto each
/// other: `max - min < min_fitness_spread`
pub struct SpreadCriterion;

impl StopCriterion for SpreadCriterion {
    fn name(&self) -> &str {
        "fitness_spread"
    }

    fn default_params(&self) -> Params {
        Params::new().with("min_fitness_spread", 1e-6f32)
    }

    fn score(&self, fitness: &[f32], _state: &State, params: &Params) -> Result<u32> {
        if fitness.is_empty() {
            return Ok(0);
        }
        let min_spread = params.get_f32("min_fitness_spread")?;
        let max = fitness.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min = fitness.iter().cloned().fold(f32::INFINITY, f32::min);
        Ok((max - min < min_spread) as u32)
    }
}

/// Triggers when the step size falls below `min_sigma`
pub struct SigmaCriterion;

impl StopCriterion for SigmaCriterion {
    fn name(&self) -> &str {
        "sigma"
    }

    fn default_params(&self) -> Params {
        Params::new().with("min_sigma", 1e-6f32)
    }

    fn score(&self, _fitness: &[f32], state: &State, params: &Params) -> Result<u32> {
        Ok((state.get_f32(SIGMA)? < params.get_f32("min_sigma")?) as u32)
    }
}

/// Triggers when any fitness value is NaN or infinite
pub struct NonFiniteCriterion;

impl StopCriterion for NonFiniteCriterion {
    fn name(&self) -> &str {
        "non_finite"
    }

    fn score(&self, fitness: &[f32], _state: &State, _params: &Params) -> Result<u32> {
        Ok(fitness.iter().filter(|f| !f.is_finite()).count() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(gen: usize) -> State {
        State::new().with(GEN_COUNTER, gen).with(SIGMA, 0.5f32)
    }

    fn params(min_gens: usize) -> Params {
        Params::new()
            .with(MIN_NUM_GENS, min_gens)
            .with("min_fitness_spread", 1e-3f32)
            .with("min_sigma", 1e-2f32)
    }

    #[test]
    fn test_guard() {
        let always: Vec<Box<dyn StopCriterion>> =
            vec![Box::new(|_f: &[f32], _s: &State, _p: &Params| 1u32)];
        assert!(!should_stop(&always, &[1.], &state_at(10), &params(50)).unwrap());
        assert!(should_stop(&always, &[1.], &state_at(50), &params(50)).unwrap());
        assert!(should_stop(&always, &[1.], &state_at(70), &params(50)).unwrap());
    }

    #[test]
    fn test_no_criteria_never_stops() {
        assert!(!should_stop(&[], &[1.], &state_at(100), &params(0)).unwrap());
    }

    #[test]
    fn test_any_criterion_triggers() {
        let criteria: Vec<Box<dyn StopCriterion>> =
            vec![Box::new(SigmaCriterion), Box::new(SpreadCriterion)];
        // sigma is fine, but the spread has collapsed
        assert!(should_stop(&criteria, &[1., 1.0001], &state_at(5), &params(0)).unwrap());
        assert!(!should_stop(&criteria, &[1., 2.], &state_at(5), &params(0)).unwrap());

        let state = state_at(5).with(SIGMA, 1e-3f32);
        assert!(should_stop(&criteria, &[1., 2.], &state, &params(0)).unwrap());
    }

    #[test]
    fn test_non_finite() {
        let p = params(0);
        let s = state_at(0);
        assert_eq!(NonFiniteCriterion.score(&[1., 2.], &s, &p).unwrap(), 0);
        assert_eq!(
            NonFiniteCriterion
                .score(&[f32::NAN, f32::INFINITY, 0.], &s, &p)
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_missing_parameter_surfaces() {
        let p = Params::new().with(MIN_NUM_GENS, 0usize);
        assert!(SpreadCriterion.score(&[1., 1.], &state_at(0), &p).is_err());
    }
}
