//! Interfaces for parameterized models whose flat weight vectors are the
//! candidates being optimized.

use std::io::{Read, Write};

use crate::error::Result;

/// Named parameter blocks with their shapes, in flattening order
pub type ParamShapes = Vec<(String, Vec<usize>)>;

/// A model evaluated from a flat parameter vector.  The optimizer only ever
/// sees flat vectors; splitting them into the blocks described by
/// `param_shapes` is the model's job.
pub trait Model: Send + Sync {
    /// Parameter blocks, in the order they appear in the flat vector
    fn param_shapes(&self) -> ParamShapes;

    /// Total length of the flat parameter vector
    fn num_params(&self) -> usize {
        self.param_shapes()
            .iter()
            .map(|(_, shape)| shape.iter().product::<usize>())
            .sum()
    }

    /// Applies the model with `params` to a single input
    fn forward(&self, params: &[f32], input: &[f32]) -> Result<Vec<f32>>;
}

/// Serialization for model descriptions
pub trait SerDe: Sized {
    /// Error conditions due to writing
    type Error;

    /// Writes out a model to writer
    fn save<A: Write>(&self, writer: &mut A) -> std::result::Result<(), Self::Error>;

    /// Loads a model from a reader.  All necessary metadata should be
    /// stored within the model
    fn load<A: Read>(reader: &mut A) -> std::result::Result<Self, Self::Error>;
}
