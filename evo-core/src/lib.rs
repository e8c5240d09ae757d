//! Evo-Core
//! ===
//!
//! This library contains the building blocks for black-box minimization with
//! Evolutionary Strategies in ask/tell form.  Every strategy is stateless: the
//! evolving quantities live in an explicit `State` which is passed in and
//! returned by each call, and every call that needs randomness receives its
//! own seed.
//!
//! Canonical Evolutionary Strategies
//! ---
//! This implements a (μ/μ_w, λ) Evolutionary Strategy, where λ children are
//! sampled around the mean and the top μ are blended with log-rank weights to
//! form the next mean.
//!
//! Natural Evolutionary Strategies
//! ---
//! This implements a variation on Natural Evolutionary Strategies where the
//! step is a weighted combination of antithetic noise directions.  It offers
//! optional Fitness Shaping (Wierstra et al.) and momentum.
//!
//! Restarts
//! ---
//! Any strategy can be wrapped in a `RestartWrapper`, which scores a set of
//! termination criteria after every generation and, once they fire, swaps the
//! strategy state for one built by a restart policy while carrying the best
//! solution found so far across.
//!

#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate tracing;

/// Error type shared by every fallible operation
pub mod error;

/// Keyed containers for strategy state and hyperparameters
pub mod state;

/// Seeded random sources
pub mod sampler;

/// Defines the ask/tell interface for base strategies
pub mod strategy;

/// Defines the Canonical ES optimizer
pub mod canonical;

/// Defines an optimizer based on a variation on Natural Evolutionary Strategies
pub mod nes;

/// Termination criteria and restart policies wrapping a base strategy
pub mod restart;

/// Defines interfaces for Tasks, Optimizers and the run loop
pub mod optimizer;

/// Defines the interfaces for Model types for use in neuro-evolution optimizers.
pub mod model;
