use evo_core::canonical::Canonical;
use evo_core::nes::Natural;
use evo_core::optimizer::{Optimizer, Runner, Standalone, Summary, Task};
use evo_core::restart::{
    NonFiniteCriterion, PopulationResize, Reinitialize, RestartPolicy, RestartWrapper,
    SigmaCriterion, SigmaReset, SpreadCriterion,
};
use evo_core::state::Params;
use evo_core::strategy::Strategy;
use evo_problems::ClassicFitness;

use super::args::{CriterionKind, ProblemMeta, RestartKind, RestartMeta, StrategyKind, StrategyMeta};
use super::loaders::load_params;
use super::BenchError;

/// What a benchmark run prints
#[derive(Serialize, Debug)]
pub struct Report {
    /// Objective name
    pub problem: String,
    /// Dimensionality
    pub num_dims: usize,
    /// Value at the objective's known global minimum
    pub known_minimum: f32,
    /// Distance between the best fitness found and `known_minimum`
    pub gap: f32,
    /// Outcome of the run
    pub summary: Summary,
}

/// A fully parsed benchmark invocation
#[derive(Debug, Clone)]
pub struct Bench {
    /// Objective and run loop settings
    pub problem: ProblemMeta,
    /// Base strategy settings
    pub strategy: StrategyMeta,
    /// Restart settings
    pub restart: RestartMeta,
}

impl Bench {
    /// Builds the objective and optimizer, then runs it.  Parameters are
    /// layered as: optimizer defaults, the objective's search box, the json
    /// file, command line flags.
    pub fn run(&self) -> Result<Report, BenchError> {
        let fitness = ClassicFitness::new(&self.problem.problem, self.problem.dims)?;
        let (low, high) = fitness.problem.domain();
        let mut overrides = Params::new()
            .with("init_min", low)
            .with("init_max", high);
        if let Some(path) = &self.problem.params_path {
            overrides.update(load_params(path)?);
        }
        overrides.update(self.strategy.overrides.clone());
        overrides.update(self.restart.overrides.clone());

        let dims = self.problem.dims;
        let popsize = self.strategy.popsize;
        let summary = match self.strategy.kind {
            StrategyKind::Canonical => {
                self.with_restarts(Canonical::new(dims, popsize)?, &fitness, overrides)?
            }
            StrategyKind::Natural => {
                self.with_restarts(Natural::new(dims, popsize)?, &fitness, overrides)?
            }
        };

        let (_, known_minimum) = fitness.known_minimum();
        Ok(Report {
            problem: fitness.problem.to_string(),
            num_dims: dims,
            known_minimum: known_minimum,
            gap: summary.best_fitness - known_minimum,
            summary: summary,
        })
    }

    fn with_restarts<S: Strategy, T: Task>(
        &self,
        base: S,
        task: &T,
        overrides: Params,
    ) -> Result<Summary, BenchError> {
        let runner = &self.problem.runner;
        let criteria = &self.restart.criteria;
        match self.restart.kind {
            RestartKind::Never => execute(&Standalone(base), task, runner, overrides),
            RestartKind::Reinitialize => {
                let opt = wrap(base, Reinitialize, criteria);
                execute(&opt, task, runner, overrides)
            }
            RestartKind::SigmaReset => {
                let opt = wrap(base, SigmaReset, criteria);
                execute(&opt, task, runner, overrides)
            }
            RestartKind::PopulationResize => {
                let opt = wrap(base, PopulationResize, criteria);
                execute(&opt, task, runner, overrides)
            }
        }
    }
}

fn wrap<S, R>(base: S, policy: R, criteria: &[CriterionKind]) -> RestartWrapper<S, R>
where
    S: Strategy,
    R: RestartPolicy<S>,
{
    let mut wrapper = RestartWrapper::with_policy(base, policy);
    for c in criteria {
        wrapper = match c {
            CriterionKind::Spread => wrapper.with_criterion(SpreadCriterion),
            CriterionKind::Sigma => wrapper.with_criterion(SigmaCriterion),
            CriterionKind::NonFinite => wrapper.with_criterion(NonFiniteCriterion),
        };
    }
    wrapper
}

fn execute<O: Optimizer, T: Task>(
    opt: &O,
    task: &T,
    runner: &Runner,
    overrides: Params,
) -> Result<Summary, BenchError> {
    let mut params = opt.default_params();
    params.update(overrides);
    debug!(params = ?params, "starting run");
    Ok(runner.run(opt, task, &params)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evo_core::error::EvoError;

    fn bench(problem: &str, dims: usize, kind: RestartKind) -> Bench {
        Bench {
            problem: ProblemMeta {
                problem: problem.to_string(),
                dims: dims,
                runner: Runner {
                    generations: 40,
                    report_iter: 0,
                    seed: 7,
                },
                params_path: None,
            },
            strategy: StrategyMeta {
                kind: StrategyKind::Canonical,
                popsize: 8,
                overrides: Params::new(),
            },
            restart: RestartMeta {
                kind: kind,
                criteria: vec![CriterionKind::Spread],
                overrides: Params::new().with("min_num_gens", 10usize),
            },
        }
    }

    #[test]
    fn test_report() {
        let report = bench("quadratic", 3, RestartKind::Never).run().unwrap();
        assert_eq!(report.problem, "quadratic");
        assert_eq!(report.summary.evaluations, 320);
        assert_eq!(report.summary.restarts, 0);
        assert!(report.gap >= 0.);
        assert!(report.gap < 75.);
    }

    #[test]
    fn test_every_policy_runs() {
        for &kind in [
            RestartKind::Reinitialize,
            RestartKind::SigmaReset,
            RestartKind::PopulationResize,
        ]
        .iter()
        {
            let report = bench("six-hump", 2, kind).run().unwrap();
            assert_eq!(report.summary.best_member.len(), 2);
            assert!(report.summary.best_fitness.is_finite());
        }
    }

    #[test]
    fn test_configuration_errors() {
        match bench("himmelblau", 3, RestartKind::Never).run() {
            Err(BenchError::Evo(EvoError::InvalidConfiguration(_))) => (),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
