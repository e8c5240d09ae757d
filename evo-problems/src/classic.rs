//! Classic analytic benchmark functions
use std::f32::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use evo_core::error::{EvoError, Result};
use evo_core::optimizer::{Rollout, Task};

/// The registered benchmark functions
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Problem {
    /// Sum of squares
    Quadratic,
    /// Banana-shaped valley
    Rosenbrock,
    /// Nearly flat outer region with a deep central hole
    Ackley,
    /// Product of cosines on a wide bowl
    Griewank,
    /// Regular grid of local minima
    Rastrigin,
    /// Deceptive, the global minimum sits near the domain's edge
    Schwefel,
    /// Four equal minima, 2D only
    Himmelblau,
    /// Six-hump camel, 2D only
    SixHump,
}

impl Problem {
    /// Every registered problem
    pub const ALL: [Problem; 8] = [
        Problem::Quadratic,
        Problem::Rosenbrock,
        Problem::Ackley,
        Problem::Griewank,
        Problem::Rastrigin,
        Problem::Schwefel,
        Problem::Himmelblau,
        Problem::SixHump,
    ];

    /// Registered name, as accepted by `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            Problem::Quadratic => "quadratic",
            Problem::Rosenbrock => "rosenbrock",
            Problem::Ackley => "ackley",
            Problem::Griewank => "griewank",
            Problem::Rastrigin => "rastrigin",
            Problem::Schwefel => "schwefel",
            Problem::Himmelblau => "himmelblau",
            Problem::SixHump => "six-hump",
        }
    }

    /// Whether the function is only defined for two dimensions
    pub fn is_2d_only(&self) -> bool {
        match self {
            Problem::Himmelblau | Problem::SixHump => true,
            _ => false,
        }
    }

    /// Conventional search box, per coordinate
    pub fn domain(&self) -> (f32, f32) {
        match self {
            Problem::Quadratic => (-5., 5.),
            Problem::Rosenbrock => (-5., 10.),
            Problem::Ackley => (-32.768, 32.768),
            Problem::Griewank => (-600., 600.),
            Problem::Rastrigin => (-5.12, 5.12),
            Problem::Schwefel => (-500., 500.),
            Problem::Himmelblau => (-5., 5.),
            Problem::SixHump => (-3., 3.),
        }
    }

    /// One global minimizer and the optimal value for `num_dims` dimensions
    pub fn known_minimum(&self, num_dims: usize) -> (Vec<f32>, f32) {
        match self {
            Problem::Rosenbrock => (vec![1.; num_dims], 0.),
            Problem::Schwefel => (vec![420.9687; num_dims], 0.),
            Problem::Himmelblau => (vec![3., 2.], 0.),
            Problem::SixHump => (vec![0.0898, -0.7126], -1.0316),
            _ => (vec![0.; num_dims], 0.),
        }
    }

    /// Evaluates a single point.  2D-only problems return NaN when given
    /// fewer than two coordinates and ignore any beyond the second.
    pub fn evaluate(&self, x: &[f32]) -> f32 {
        match self {
            Problem::Quadratic => x.iter().map(|v| v * v).sum(),
            Problem::Rosenbrock => x
                .windows(2)
                .map(|w| (1. - w[0]).powi(2) + 100. * (w[1] - w[0] * w[0]).powi(2))
                .sum(),
            Problem::Ackley => {
                let n = x.len() as f32;
                let sq = x.iter().map(|v| v * v).sum::<f32>() / n;
                let cos = x.iter().map(|v| (2. * PI * v).cos()).sum::<f32>() / n;
                -20. * (-0.2 * sq.sqrt()).exp() - cos.exp() + 20. + E
            }
            Problem::Griewank => {
                let sum: f32 = x.iter().map(|v| v * v / 4000.).sum();
                let prod: f32 = x
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (v / ((i + 1) as f32).sqrt()).cos())
                    .product();
                sum - prod + 1.
            }
            Problem::Rastrigin => {
                let n = x.len() as f32;
                10. * n
                    + x.iter()
                        .map(|v| v * v - 10. * (2. * PI * v).cos())
                        .sum::<f32>()
            }
            Problem::Schwefel => {
                let n = x.len() as f32;
                418.9829 * n - x.iter().map(|v| v * v.abs().sqrt().sin()).sum::<f32>()
            }
            Problem::Himmelblau => match x {
                [x0, x1, ..] => (x0 * x0 + x1 - 11.).powi(2) + (x0 + x1 * x1 - 7.).powi(2),
                _ => std::f32::NAN,
            },
            Problem::SixHump => match x {
                [x0, x1, ..] => {
                    let x0s = x0 * x0;
                    let x1s = x1 * x1;
                    (4. - 2.1 * x0s + x0s * x0s / 3.) * x0s + x0 * x1 + (-4. + 4. * x1s) * x1s
                }
                _ => std::f32::NAN,
            },
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Problem {
    type Err = EvoError;

    fn from_str(s: &str) -> Result<Self> {
        Problem::ALL
            .iter()
            .find(|p| p.name() == s)
            .cloned()
            .ok_or_else(|| {
                let names: Vec<_> = Problem::ALL.iter().map(|p| p.name()).collect();
                EvoError::InvalidConfiguration(format!(
                    "unknown problem '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// A benchmark function bound to a dimensionality
#[derive(Debug, Clone, PartialEq)]
pub struct ClassicFitness {
    /// Function being minimized
    pub problem: Problem,

    /// Width every candidate row must have
    pub num_dims: usize,
}

impl ClassicFitness {
    /// Looks up `problem_name` and validates the dimensionality against it
    pub fn new(problem_name: &str, num_dims: usize) -> Result<Self> {
        let problem: Problem = problem_name.parse()?;
        if num_dims == 0 {
            return Err(EvoError::InvalidConfiguration(format!(
                "{} needs at least one dimension",
                problem
            )));
        }
        if problem.is_2d_only() && num_dims != 2 {
            return Err(EvoError::InvalidConfiguration(format!(
                "{} is only defined for 2 dimensions, got {}",
                problem, num_dims
            )));
        }
        debug!(problem = problem.name(), num_dims = num_dims, "objective ready");
        Ok(ClassicFitness {
            problem: problem,
            num_dims: num_dims,
        })
    }

    /// Evaluates every row independently; the output keeps row order
    pub fn evaluate_batch(&self, batch: &[Vec<f32>]) -> Vec<f32> {
        let problem = self.problem;
        batch.par_iter().map(|row| problem.evaluate(row)).collect()
    }

    /// Global minimizer and optimal value at this dimensionality
    pub fn known_minimum(&self) -> (Vec<f32>, f32) {
        self.problem.known_minimum(self.num_dims)
    }
}

impl Task for ClassicFitness {
    fn rollout(&self, _seed: u64, batch: &[Vec<f32>]) -> Result<Rollout> {
        if let Some(row) = batch.iter().find(|r| r.len() != self.num_dims) {
            return Err(EvoError::ShapeMismatch {
                expected: self.num_dims,
                got: row.len(),
            });
        }
        Ok(Rollout {
            function_value: self.evaluate_batch(batch),
        })
    }
}
