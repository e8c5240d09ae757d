//! Library defining different types of models
#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;

/// Splitting flat parameter vectors into named blocks
pub mod reshape;

/// Defines linear models
pub mod linear;
/// Defines multi-layer perceptrons
pub mod mlp;

/// Error conditions due to reading or writing model descriptions
#[derive(Debug, thiserror::Error)]
pub enum SerDeErr {
    /// Error when reading or writing the json
    #[error("model serialization failed: {0}")]
    SerDeError(#[from] serde_json::Error),

    /// The description parsed but does not describe a usable model
    #[error("invalid model description: {0}")]
    Invalid(String),
}

// Dense dot product; slices must be the same length
fn dot(v1: &[f32], v2: &[f32]) -> f32 {
    v1.iter().zip(v2).map(|(a, b)| a * b).sum()
}
