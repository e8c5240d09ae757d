//! Concrete restart policies

use crate::error::{EvoError, Result};
use crate::state::{Params, State};
use crate::strategy::{Strategy, MEAN, POPSIZE, SIGMA};

use super::RestartPolicy;

/// Starts over from a freshly initialized base state
#[derive(Debug, Clone, Copy, Default)]
pub struct Reinitialize;

impl<S: Strategy> RestartPolicy<S> for Reinitialize {
    fn restart_state(
        &self,
        base: &S,
        seed: u64,
        _fitness: &[f32],
        _state: &State,
        params: &Params,
    ) -> Result<State> {
        base.initialize(seed, params)
    }
}

/// Keeps searching around the current mean, but with the step size reset to
/// `sigma_init * sigma_reset_factor`
#[derive(Debug, Clone, Copy, Default)]
pub struct SigmaReset;

impl<S: Strategy> RestartPolicy<S> for SigmaReset {
    fn default_params(&self) -> Params {
        Params::new().with("sigma_reset_factor", 1.0f32)
    }

    fn validate(&self, params: &Params) -> Result<()> {
        let factor = params.get_f32("sigma_reset_factor")?;
        if !(factor > 0.) {
            return Err(EvoError::InvalidConfiguration(format!(
                "'sigma_reset_factor' must be positive, got {}",
                factor
            )));
        }
        Ok(())
    }

    fn restart_state(
        &self,
        base: &S,
        seed: u64,
        _fitness: &[f32],
        state: &State,
        params: &Params,
    ) -> Result<State> {
        let sigma = params.get_f32("sigma_init")? * params.get_f32("sigma_reset_factor")?;

        let mut fresh = base.initialize(seed, params)?;
        fresh.insert(MEAN, state.get_vector(MEAN)?);
        fresh.insert(SIGMA, sigma);
        fresh.insert(POPSIZE, state.get_usize(POPSIZE)?);
        Ok(fresh)
    }
}

/// IPOP-style restart: a fresh state whose population is `popsize_multiplier`
/// times larger than the one that stalled
#[derive(Debug, Clone, Copy, Default)]
pub struct PopulationResize;

impl<S: Strategy> RestartPolicy<S> for PopulationResize {
    fn default_params(&self) -> Params {
        Params::new().with("popsize_multiplier", 2usize)
    }

    fn validate(&self, params: &Params) -> Result<()> {
        if params.get_usize("popsize_multiplier")? == 0 {
            return Err(EvoError::InvalidConfiguration(
                "'popsize_multiplier' must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn restart_state(
        &self,
        base: &S,
        seed: u64,
        _fitness: &[f32],
        state: &State,
        params: &Params,
    ) -> Result<State> {
        let multiplier = params.get_usize("popsize_multiplier")?;
        let current = state.get_usize(POPSIZE)?;
        let popsize = current
            .checked_mul(multiplier)
            .filter(|p| *p <= i64::MAX as usize)
            .ok_or_else(|| {
                EvoError::InvalidConfiguration(format!(
                    "population of {} cannot grow {} times",
                    current, multiplier
                ))
            })?;

        let mut fresh = base.initialize(seed, params)?;
        fresh.insert(POPSIZE, popsize);
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nes::Natural;
    use crate::optimizer::Optimizer;
    use crate::restart::{RestartWrapper, MIN_NUM_GENS, RESTART_COUNTER};

    fn run<R: RestartPolicy<Natural>>(policy: R, extra: Params) -> Vec<State> {
        let always = |_f: &[f32], _s: &State, _p: &Params| 1u32;
        let wrapper = RestartWrapper::with_policy(Natural::new(2, 4).unwrap(), policy)
            .with_criterion(always);
        let mut params = wrapper.default_params().with(MIN_NUM_GENS, 2usize);
        params.update(extra);

        let mut state = wrapper.initialize(0, &params).unwrap();
        let mut history = Vec::new();
        for gen in 0..4u64 {
            let (x, s) = wrapper.ask(gen, state, &params).unwrap();
            let fitness: Vec<f32> = x.iter().map(|r| r[0].abs() + r[1].abs()).collect();
            state = wrapper.tell(gen + 50, &x, &fitness, s, &params).unwrap();
            history.push(state.clone());
        }
        history
    }

    #[test]
    fn test_population_doubles() {
        let history = run(PopulationResize, Params::new());
        let sizes: Vec<usize> = history
            .iter()
            .map(|s| s.get_usize(POPSIZE).unwrap())
            .collect();
        assert_eq!(sizes, vec![4, 8, 8, 16]);
        assert_eq!(history[3].get_usize(RESTART_COUNTER).unwrap(), 2);
    }

    #[test]
    fn test_sigma_reset_keeps_mean() {
        let extra = Params::new().with("sigma_reset_factor", 3.0f32);
        let history = run(SigmaReset, extra);
        // the second tell hits the guard and restarts
        let restarted = &history[1];
        assert!((restarted.get_f32(SIGMA).unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(restarted.get_usize(POPSIZE).unwrap(), 4);
    }

    #[test]
    fn test_bad_values_fail_at_initialize() {
        let always = |_f: &[f32], _s: &State, _p: &Params| 1u32;
        let ipop = RestartWrapper::with_policy(Natural::new(2, 4).unwrap(), PopulationResize)
            .with_criterion(always);
        let params = ipop.default_params().with("popsize_multiplier", 0usize);
        match ipop.initialize(0, &params) {
            Err(EvoError::InvalidConfiguration(_)) => {}
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }

        let reset = RestartWrapper::with_policy(Natural::new(2, 4).unwrap(), SigmaReset)
            .with_criterion(always);
        for factor in [-1f32, 0., std::f32::NAN].iter() {
            let params = reset.default_params().with("sigma_reset_factor", *factor);
            match reset.initialize(0, &params) {
                Err(EvoError::InvalidConfiguration(_)) => {}
                other => panic!("expected InvalidConfiguration, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_population_overflow_is_an_error() {
        let never = |_f: &[f32], _s: &State, _p: &Params| 0u32;
        let wrapper = RestartWrapper::with_policy(Natural::new(2, 4).unwrap(), PopulationResize)
            .with_criterion(never);
        let params = wrapper
            .default_params()
            .with("popsize_multiplier", i64::MAX as usize);
        let state = wrapper.initialize(0, &params).unwrap();
        let (x, state) = wrapper.ask(1, state, &params).unwrap();
        let fitness = vec![1f32; x.len()];
        match wrapper.tell(2, &x, &fitness, state, &params) {
            Err(EvoError::InvalidConfiguration(_)) => {}
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_reinitialize_is_deterministic_in_seed() {
        let es = Natural::new(3, 4).unwrap();
        let params = es.default_params();
        let state = es.initialize(9, &params).unwrap();
        let a = Reinitialize.restart_state(&es, 17, &[], &state, &params).unwrap();
        let b = Reinitialize.restart_state(&es, 17, &[], &state, &params).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.get_vector(MEAN).unwrap(), state.get_vector(MEAN).unwrap());
    }
}
