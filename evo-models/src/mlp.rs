//! Defines a fully connected neural network whose weights are supplied as a
//! flat vector on every call
use std::f32::consts::E;
use std::io::{Read, Write};

use evo_core::error::{EvoError, Result};
use evo_core::model::{Model, ParamShapes, SerDe};

use crate::reshape::unflatten;

use super::*;

#[derive(Serialize, Deserialize, Clone, Debug, Copy, PartialEq)]
/// Defines the different types of functions between layers
pub enum NonLinearity {
    /// ReLu
    ReLu,

    /// Tanh
    Tanh,

    /// Linear. Note this isn't non-linear
    Linear,

    /// Sigmoid
    Sigmoid,

    /// ELU
    ELU,
}

impl NonLinearity {
    #[inline]
    /// Applies the specified function
    fn eval(&self, f: f32) -> f32 {
        use self::NonLinearity::*;
        match self {
            &ReLu => f.max(0f32),
            &Tanh => f.tanh(),
            &Sigmoid => 1. / (1. + E.powf(-f)),
            &Linear => f,
            &ELU => {
                if f > 0. {
                    f
                } else {
                    f.exp() - 1.
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// Architecture of a multi-layer perceptron.  Hidden layers apply `nl`; the
/// output layer is linear.
pub struct Mlp {
    /// Size of the input dimensions
    input_dims: usize,
    /// Widths of every layer, the last one being the output
    sizes: Vec<usize>,
    /// Type of non-linearity to apply
    nl: NonLinearity,
}

impl Mlp {
    /// Creates a new network description
    pub fn new(input_dims: usize, sizes: &[usize], nl: NonLinearity) -> Result<Self> {
        if input_dims == 0 || sizes.is_empty() || sizes.iter().any(|s| *s == 0) {
            return Err(EvoError::InvalidConfiguration(format!(
                "an MLP needs non-zero input and layer sizes, got {} -> {:?}",
                input_dims, sizes
            )));
        }
        Ok(Mlp {
            input_dims: input_dims,
            sizes: sizes.to_vec(),
            nl: nl,
        })
    }

    /// Width of the output
    pub fn output_dims(&self) -> usize {
        self.sizes.last().cloned().unwrap_or(0)
    }

    // (input, output) width of every layer
    fn layer_dims(&self) -> Vec<(usize, usize)> {
        let mut input = self.input_dims;
        self.sizes
            .iter()
            .map(|&s| {
                let dims = (input, s);
                input = s;
                dims
            })
            .collect()
    }
}

impl Model for Mlp {
    fn param_shapes(&self) -> ParamShapes {
        let mut shapes = Vec::with_capacity(self.sizes.len() * 2);
        for (i, (input, output)) in self.layer_dims().into_iter().enumerate() {
            shapes.push((format!("layer{}.w", i), vec![output, input]));
            shapes.push((format!("layer{}.b", i), vec![output]));
        }
        shapes
    }

    fn forward(&self, params: &[f32], input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.input_dims {
            return Err(EvoError::ShapeMismatch {
                expected: self.input_dims,
                got: input.len(),
            });
        }
        let blocks = unflatten(params, &self.param_shapes())?;
        let dims = self.layer_dims();
        let last = dims.len() - 1;

        let mut payload = input.to_vec();
        for (i, ((in_dim, _), wb)) in dims.iter().zip(blocks.chunks(2)).enumerate() {
            let (w, bias) = (wb[0], wb[1]);
            let nl = if i == last { NonLinearity::Linear } else { self.nl };
            payload = bias
                .iter()
                .enumerate()
                .map(|(j, b)| nl.eval(dot(&w[j * in_dim..(j + 1) * in_dim], &payload) + b))
                .collect();
        }
        Ok(payload)
    }
}

impl SerDe for Mlp {
    type Error = SerDeErr;

    fn save<A: Write>(&self, writer: &mut A) -> std::result::Result<(), Self::Error> {
        serde_json::to_writer(writer, &self)?;
        Ok(())
    }

    fn load<A: Read>(reader: &mut A) -> std::result::Result<Self, Self::Error> {
        let mlp: Mlp = serde_json::from_reader(reader)?;
        Mlp::new(mlp.input_dims, &mlp.sizes, mlp.nl).map_err(|e| SerDeErr::Invalid(e.to_string()))
    }
}
