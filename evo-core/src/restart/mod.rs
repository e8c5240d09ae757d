//! Restart controller wrapping an arbitrary base strategy.
//!
//! `RestartWrapper` behaves like the strategy it wraps, but after every `tell`
//! it evaluates its stop criteria against the advanced state.  When they fire
//! (and at least `min_num_gens` generations have passed) the search state is
//! replaced by a fresh one built by the wrapper's [`RestartPolicy`], keeping
//! only the best solution found so far and the restart count.

mod policies;
pub mod termination;

pub use self::policies::{PopulationResize, Reinitialize, SigmaReset};
pub use self::termination::{
    min_gen_criterion, should_stop, NonFiniteCriterion, SigmaCriterion, SpreadCriterion,
    StopCriterion, MIN_NUM_GENS,
};

use crate::error::{EvoError, Result};
use crate::optimizer::Optimizer;
use crate::state::{Params, State};
use crate::strategy::{Batch, Strategy, BEST_FITNESS, BEST_MEMBER, GEN_COUNTER};

/// Number of restarts performed so far
pub const RESTART_COUNTER: &str = "restart_counter";
/// Whether the last `tell` restarted the search
pub const RESTARTED: &str = "restarted";

/// Builds the search state a restarted run continues from.
pub trait RestartPolicy<S: Strategy>: Send + Sync {
    /// Parameters this policy reads, with their defaults
    fn default_params(&self) -> Params {
        Params::new()
    }

    /// Rejects parameter values the policy cannot restart with
    fn validate(&self, _params: &Params) -> Result<()> {
        Ok(())
    }

    /// Constructs the fresh sub-state.  The controller overwrites the
    /// bookkeeping fields (`best_*`, counters, `restarted`) afterwards.
    fn restart_state(
        &self,
        base: &S,
        seed: u64,
        fitness: &[f32],
        state: &State,
        params: &Params,
    ) -> Result<State>;
}

/// Policy of a bare controller which has no way to rebuild its state
#[derive(Debug, Clone, Copy, Default)]
pub struct Unimplemented;

impl<S: Strategy> RestartPolicy<S> for Unimplemented {
    fn restart_state(
        &self,
        _base: &S,
        _seed: u64,
        _fitness: &[f32],
        _state: &State,
        _params: &Params,
    ) -> Result<State> {
        Err(EvoError::NotImplemented)
    }
}

/// Merges the restarted and the advanced state field by field, then forces
/// `restarted` to the decision actually taken.
pub fn merge_states(should_restart: bool, restart_state: State, advanced: State) -> Result<State> {
    let mut merged = State::select(should_restart, restart_state, advanced)?;
    merged.insert(RESTARTED, should_restart);
    Ok(merged)
}

/// Wraps a base strategy with stop criteria and a restart policy
pub struct RestartWrapper<S, R = Unimplemented> {
    base: S,
    policy: R,
    stop_criteria: Vec<Box<dyn StopCriterion>>,
}

impl<S: Strategy> RestartWrapper<S, Unimplemented> {
    /// A controller without a restart policy.  Any restart it decides on
    /// fails with `NotImplemented`.
    pub fn new(base: S) -> Self {
        RestartWrapper::with_policy(base, Unimplemented)
    }
}

impl<S: Strategy, R: RestartPolicy<S>> RestartWrapper<S, R> {
    /// Creates a controller restarting with `policy`
    pub fn with_policy(base: S, policy: R) -> Self {
        RestartWrapper {
            base: base,
            policy: policy,
            stop_criteria: Vec::new(),
        }
    }

    /// Adds a stop criterion
    pub fn with_criterion<C: StopCriterion + 'static>(mut self, criterion: C) -> Self {
        self.stop_criteria.push(Box::new(criterion));
        self
    }

    /// The wrapped strategy
    pub fn base(&self) -> &S {
        &self.base
    }

    /// Dimensionality of the base strategy
    pub fn num_dims(&self) -> usize {
        self.base.num_dims()
    }

    /// Initial population size of the base strategy
    pub fn popsize(&self) -> usize {
        self.base.popsize()
    }

    /// Defaults owned by the controller itself
    pub fn restart_params() -> Params {
        Params::new().with(MIN_NUM_GENS, 50usize)
    }

    // Every key the controller, its criteria and its policy rely on
    fn wrapper_params(&self) -> Params {
        let mut params = Params::new();
        for crit in self.stop_criteria.iter() {
            params.merge_defaults(crit.default_params(), crit.name());
        }
        params.merge_defaults(self.policy.default_params(), "restart policy");
        params.merge_defaults(Self::restart_params(), "restart");
        params
    }

    /// Checks all stop criteria and the minimum-generation guard
    pub fn stop(&self, fitness: &[f32], state: &State, params: &Params) -> Result<bool> {
        should_stop(&self.stop_criteria, fitness, state, params)
    }

    /// Builds the state for the next run, carrying over the best solution
    pub fn restart(
        &self,
        seed: u64,
        fitness: &[f32],
        state: &State,
        params: &Params,
    ) -> Result<State> {
        let mut new_state = self
            .policy
            .restart_state(&self.base, seed, fitness, state, params)?;
        new_state.insert(BEST_FITNESS, state.get_f32(BEST_FITNESS)?);
        new_state.insert(BEST_MEMBER, state.get_vector(BEST_MEMBER)?);
        new_state.insert(RESTART_COUNTER, state.get_usize(RESTART_COUNTER)? + 1);
        new_state.insert(GEN_COUNTER, 0usize);
        new_state.insert(RESTARTED, true);
        Ok(new_state)
    }
}

impl<S: Strategy, R: RestartPolicy<S>> Optimizer for RestartWrapper<S, R> {
    fn default_params(&self) -> Params {
        let mut params = self.base.default_params();
        params.merge_defaults(self.wrapper_params(), "restart wrapper");
        params
    }

    fn initialize(&self, seed: u64, params: &Params) -> Result<State> {
        for key in self.wrapper_params().keys() {
            params.require(key)?;
        }
        params.get_usize(MIN_NUM_GENS)?;
        self.policy.validate(params)?;

        let mut state = self.base.initialize(seed, params)?;
        for key in [GEN_COUNTER, BEST_FITNESS, BEST_MEMBER].iter() {
            if !state.contains_key(key) {
                return Err(EvoError::InvalidConfiguration(format!(
                    "base strategy state lacks '{}'",
                    key
                )));
            }
        }
        state.insert(RESTART_COUNTER, 0usize);
        state.insert(RESTARTED, false);
        Ok(state)
    }

    fn ask(&self, seed: u64, state: State, params: &Params) -> Result<(Batch, State)> {
        self.base.ask(seed, state, params)
    }

    fn tell(
        &self,
        seed: u64,
        candidates: &[Vec<f32>],
        fitness: &[f32],
        state: State,
        params: &Params,
    ) -> Result<State> {
        let advanced = self.base.tell(candidates, fitness, state, params)?;
        let should_restart = self.stop(fitness, &advanced, params)?;
        let restart_state = self.restart(seed, fitness, &advanced, params)?;
        let new_state = merge_states(should_restart, restart_state, advanced)?;

        if should_restart {
            debug!(
                restarts = new_state.get_usize(RESTART_COUNTER)?,
                best_fitness = f64::from(new_state.get_f32(BEST_FITNESS)?),
                "restarting search"
            );
        }
        Ok(new_state)
    }
}
