//! Evo
//!
//! Evo is a library and an executable to benchmark evolutionary strategies,
//! optionally wrapped with restarts, on classic test functions.
#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate clap;
#[macro_use]
extern crate tracing;

/// Tools for binaries
pub mod bin_utils;
