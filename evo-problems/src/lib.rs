//! Library of fitness tasks for benchmarking optimizers
#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate tracing;

/// Classic analytic benchmark functions
pub mod classic;
/// Fitting a model's parameters to a fixed dataset
pub mod regression;

pub use crate::classic::{ClassicFitness, Problem};
pub use crate::regression::ModelRegression;
