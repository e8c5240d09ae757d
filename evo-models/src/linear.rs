//! Defines an affine model `y = Wx + b`
use evo_core::error::{EvoError, Result};
use evo_core::model::{Model, ParamShapes};

use crate::reshape::unflatten;

use super::*;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// Affine map from `input_dims` to `output_dims`
pub struct Linear {
    /// Width of each input
    pub input_dims: usize,
    /// Width of each output
    pub output_dims: usize,
}

impl Linear {
    /// Creates a new linear model
    pub fn new(input_dims: usize, output_dims: usize) -> Self {
        Linear {
            input_dims: input_dims,
            output_dims: output_dims,
        }
    }
}

impl Model for Linear {
    fn param_shapes(&self) -> ParamShapes {
        vec![
            ("weights".to_string(), vec![self.output_dims, self.input_dims]),
            ("bias".to_string(), vec![self.output_dims]),
        ]
    }

    fn forward(&self, params: &[f32], input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.input_dims {
            return Err(EvoError::ShapeMismatch {
                expected: self.input_dims,
                got: input.len(),
            });
        }
        let blocks = unflatten(params, &self.param_shapes())?;
        let (w, bias) = (blocks[0], blocks[1]);
        Ok(bias
            .iter()
            .enumerate()
            .map(|(i, b)| dot(&w[i * self.input_dims..(i + 1) * self.input_dims], input) + b)
            .collect())
    }
}
