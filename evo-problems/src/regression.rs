use rayon::prelude::*;

use evo_core::error::{EvoError, Result};
use evo_core::model::Model;
use evo_core::optimizer::{Rollout, Task};

/// Scores parameter vectors by the mean squared error of a model over a
/// fixed set of examples
pub struct ModelRegression<M> {
    model: M,
    inputs: Vec<Vec<f32>>,
    targets: Vec<Vec<f32>>,
}

impl<M: Model> ModelRegression<M> {
    /// Creates a new regression task.  Inputs and targets are paired by
    /// position and there must be at least one pair.
    pub fn new(model: M, inputs: Vec<Vec<f32>>, targets: Vec<Vec<f32>>) -> Result<Self> {
        if inputs.is_empty() || inputs.len() != targets.len() {
            return Err(EvoError::InvalidConfiguration(format!(
                "regression needs matching, non-empty inputs and targets, got {} and {}",
                inputs.len(),
                targets.len()
            )));
        }
        Ok(ModelRegression {
            model: model,
            inputs: inputs,
            targets: targets,
        })
    }

    /// Model whose parameters are being fit
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Number of parameters each candidate must provide
    pub fn num_dims(&self) -> usize {
        self.model.num_params()
    }

    /// Mean squared error of the model under `params`, averaged over every
    /// example and output
    pub fn mse(&self, params: &[f32]) -> Result<f32> {
        let mut total = 0f32;
        let mut count = 0usize;
        for (x, y) in self.inputs.iter().zip(self.targets.iter()) {
            let out = self.model.forward(params, x)?;
            if out.len() != y.len() {
                return Err(EvoError::ShapeMismatch {
                    expected: y.len(),
                    got: out.len(),
                });
            }
            total += out.iter().zip(y).map(|(o, t)| (o - t).powi(2)).sum::<f32>();
            count += y.len();
        }
        Ok(total / count.max(1) as f32)
    }
}

impl<M: Model> Task for ModelRegression<M> {
    fn rollout(&self, _seed: u64, batch: &[Vec<f32>]) -> Result<Rollout> {
        let expected = self.num_dims();
        if let Some(row) = batch.iter().find(|r| r.len() != expected) {
            return Err(EvoError::ShapeMismatch {
                expected: expected,
                got: row.len(),
            });
        }
        let function_value = batch
            .par_iter()
            .map(|row| self.mse(row))
            .collect::<Result<Vec<f32>>>()?;
        Ok(Rollout {
            function_value: function_value,
        })
    }
}
