use std::str::FromStr;

use clap::{App, Arg, ArgMatches, SubCommand};

use evo_core::optimizer::Runner;
use evo_core::restart::MIN_NUM_GENS;
use evo_core::state::Params;

use super::BenchError;

/// Trait to add new arguments to the current app
pub trait ArgAugmenter {
    /// Type of struct to output from this parser
    type Output;

    /// Specifies arguments to add
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b>;

    /// Parses the arguments
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Result<Self::Output, BenchError>;
}

// Parses an argument if it was provided
fn optional<'a, T: FromStr>(args: &ArgMatches<'a>, name: &str) -> Result<Option<T>, BenchError> {
    if !args.is_present(name) {
        return Ok(None);
    }
    value_t!(args, name, T)
        .map(Some)
        .map_err(|e| BenchError::Argument {
            name: name.to_string(),
            reason: e.message,
        })
}

// Copies a float argument into `params` under `key`, if provided
fn override_f32<'a>(
    args: &ArgMatches<'a>,
    name: &str,
    key: &str,
    params: &mut Params,
) -> Result<(), BenchError> {
    if let Some(v) = optional::<f32>(args, name)? {
        params.insert(key, v);
    }
    Ok(())
}

/// Which base strategy to run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrategyKind {
    /// canonical ES
    Canonical,
    /// natural ES
    Natural,
}

/// Base strategy selection plus the hyperparameters given on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMeta {
    /// Strategy to build
    pub kind: StrategyKind,
    /// Candidates per generation
    pub popsize: usize,
    /// Parameter overrides
    pub overrides: Params,
}

/// Struct defining the optimizer arguments using ArgAugmenter
pub struct StrategyArgs;

impl ArgAugmenter for StrategyArgs {
    type Output = StrategyMeta;

    /// Specifies arguments to add for the optimizer
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        let sigma = Arg::with_name("sigma_init")
            .long("sigma")
            .takes_value(true)
            .help("Initial step size");
        let decay = Arg::with_name("sigma_decay")
            .long("sigma-decay")
            .takes_value(true)
            .help("Multiplicative step size decay per generation");

        app
      .arg(Arg::with_name("popsize")
           .short("l")
           .long("popsize")
           .takes_value(true)
           .default_value("16")
           .help("Number of candidates per generation (λ)"))
      .subcommand(SubCommand::with_name("canonical")
          .about("(μ/μ_w, λ) ES recombining the elite with log-rank weights")
          .arg(sigma.clone())
          .arg(decay.clone())
          .arg(Arg::with_name("elite_ratio")
              .long("elite-ratio")
              .takes_value(true)
              .help("Fraction of the population recombined into the next mean")))
      .subcommand(SubCommand::with_name("natural")
          .about("Natural ES with antithetic sampling")
          .arg(sigma)
          .arg(decay)
          .arg(Arg::with_name("momentum")
               .long("momentum")
               .takes_value(true)
               .help("Gamma parameter for momentum"))
          .arg(Arg::with_name("no_shaping")
               .long("no-shaping")
               .help("Uses z-normalized fitness instead of rank-based fitness shaping"))
          .arg(Arg::with_name("alpha")
               .long("alpha")
               .takes_value(true)
               .help("Learning rate.  Defaults to 1.0")))
    }

    /// Parses the arguments for the optimizer
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Result<Self::Output, BenchError> {
        let popsize = optional::<usize>(args, "popsize")?.unwrap_or(16);
        let mut overrides = Params::new();

        let kind = if let Some(subargs) = args.subcommand_matches("canonical") {
            override_f32(subargs, "elite_ratio", "elite_ratio", &mut overrides)?;
            override_f32(subargs, "sigma_init", "sigma_init", &mut overrides)?;
            override_f32(subargs, "sigma_decay", "sigma_decay", &mut overrides)?;
            StrategyKind::Canonical
        } else if let Some(subargs) = args.subcommand_matches("natural") {
            override_f32(subargs, "momentum", "momentum", &mut overrides)?;
            override_f32(subargs, "alpha", "lrate", &mut overrides)?;
            override_f32(subargs, "sigma_init", "sigma_init", &mut overrides)?;
            override_f32(subargs, "sigma_decay", "sigma_decay", &mut overrides)?;
            if subargs.is_present("no_shaping") {
                overrides.insert("shape", false);
            }
            StrategyKind::Natural
        } else {
            return Err(BenchError::Argument {
                name: "strategy".to_string(),
                reason: "expected one of the subcommands 'canonical' or 'natural'".to_string(),
            });
        };

        Ok(StrategyMeta {
            kind: kind,
            popsize: popsize,
            overrides: overrides,
        })
    }
}

/// Restart policy selected on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestartKind {
    /// Run the base strategy as is
    Never,
    /// Start over from a fresh initialization
    Reinitialize,
    /// Keep the mean, reset the step size
    SigmaReset,
    /// Fresh initialization with a larger population
    PopulationResize,
}

/// Stop criteria selected on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CriterionKind {
    /// Collapsed fitness range
    Spread,
    /// Step size below a threshold
    Sigma,
    /// NaN or infinite fitness
    NonFinite,
}

/// Restart configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RestartMeta {
    /// Policy building the restarted state
    pub kind: RestartKind,
    /// Criteria deciding when to restart
    pub criteria: Vec<CriterionKind>,
    /// Parameter overrides
    pub overrides: Params,
}

/// Struct defining the restart arguments using ArgAugmenter
pub struct RestartArgs;

impl ArgAugmenter for RestartArgs {
    type Output = RestartMeta;

    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("restart")
                .long("restart")
                .takes_value(true)
                .possible_values(&["none", "reinit", "sigma", "ipop"])
                .default_value("none")
                .help("Restart policy applied once the stop criteria fire"),
        )
        .arg(
            Arg::with_name("min_gens")
                .long("min-gens")
                .takes_value(true)
                .help("Minimum number of generations between restarts.  Defaults to 50"),
        )
        .arg(
            Arg::with_name("stop_spread")
                .long("stop-spread")
                .takes_value(true)
                .help("Restarts when max - min fitness of a generation falls below this"),
        )
        .arg(
            Arg::with_name("stop_sigma")
                .long("stop-sigma")
                .takes_value(true)
                .help("Restarts when the step size falls below this"),
        )
        .arg(
            Arg::with_name("stop_nonfinite")
                .long("stop-nonfinite")
                .help("Restarts when any fitness is NaN or infinite"),
        )
        .arg(
            Arg::with_name("sigma_reset_factor")
                .long("sigma-reset-factor")
                .takes_value(true)
                .help("Multiple of the initial step size used by the 'sigma' policy"),
        )
        .arg(
            Arg::with_name("popsize_multiplier")
                .long("popsize-multiplier")
                .takes_value(true)
                .help("Population growth factor used by the 'ipop' policy"),
        )
    }

    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Result<Self::Output, BenchError> {
        let kind = match args.value_of("restart").unwrap_or("none") {
            "none" => RestartKind::Never,
            "reinit" => RestartKind::Reinitialize,
            "sigma" => RestartKind::SigmaReset,
            "ipop" => RestartKind::PopulationResize,
            other => {
                return Err(BenchError::Argument {
                    name: "restart".to_string(),
                    reason: format!("unknown policy '{}'", other),
                })
            }
        };

        let mut overrides = Params::new();
        let mut criteria = Vec::new();
        if let Some(spread) = optional::<f32>(args, "stop_spread")? {
            overrides.insert("min_fitness_spread", spread);
            criteria.push(CriterionKind::Spread);
        }
        if let Some(sigma) = optional::<f32>(args, "stop_sigma")? {
            overrides.insert("min_sigma", sigma);
            criteria.push(CriterionKind::Sigma);
        }
        if args.is_present("stop_nonfinite") {
            criteria.push(CriterionKind::NonFinite);
        }
        if kind == RestartKind::Never && !criteria.is_empty() {
            warn!(
                criteria = criteria.len(),
                "stop criteria given without a restart policy, they are ignored"
            );
        }
        if kind != RestartKind::Never && criteria.is_empty() {
            warn!("no stop criterion given, restarting on collapsed fitness spread");
            criteria.push(CriterionKind::Spread);
        }

        if let Some(gens) = optional::<usize>(args, "min_gens")? {
            overrides.insert(MIN_NUM_GENS, gens);
        }
        override_f32(args, "sigma_reset_factor", "sigma_reset_factor", &mut overrides)?;
        if let Some(m) = optional::<usize>(args, "popsize_multiplier")? {
            overrides.insert("popsize_multiplier", m);
        }

        Ok(RestartMeta {
            kind: kind,
            criteria: criteria,
            overrides: overrides,
        })
    }
}

/// Objective and run loop settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemMeta {
    /// Registered objective name
    pub problem: String,
    /// Dimensionality of the search space
    pub dims: usize,
    /// Run loop settings
    pub runner: Runner,
    /// Optional json file of parameter overrides
    pub params_path: Option<String>,
}

/// Struct defining the objective and run arguments using ArgAugmenter
pub struct ProblemArgs;

impl ArgAugmenter for ProblemArgs {
    type Output = ProblemMeta;

    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("problem")
                .short("p")
                .long("problem")
                .takes_value(true)
                .default_value("rosenbrock")
                .help("Objective to minimize"),
        )
        .arg(
            Arg::with_name("dims")
                .short("d")
                .long("dims")
                .takes_value(true)
                .default_value("2")
                .help("Number of dimensions of the search space"),
        )
        .arg(
            Arg::with_name("iters")
                .short("i")
                .long("generations")
                .takes_value(true)
                .default_value("100")
                .help("Number of generations to run before exiting"),
        )
        .arg(
            Arg::with_name("report_iters")
                .short("r")
                .long("report")
                .takes_value(true)
                .default_value("10")
                .help("How often to report progress.  0 disables reporting"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("2019")
                .help("Master seed every random draw is derived from"),
        )
        .arg(
            Arg::with_name("params")
                .long("params")
                .takes_value(true)
                .help("Json file with parameter overrides, applied before command line flags"),
        )
    }

    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Result<Self::Output, BenchError> {
        let problem = args.value_of("problem").unwrap_or("rosenbrock").to_string();
        let dims = optional::<usize>(args, "dims")?.unwrap_or(2);
        let runner = Runner {
            generations: optional::<usize>(args, "iters")?.unwrap_or(100),
            report_iter: optional::<usize>(args, "report_iters")?.unwrap_or(10),
            seed: optional::<u64>(args, "seed")?.unwrap_or(2019),
        };

        Ok(ProblemMeta {
            problem: problem,
            dims: dims,
            runner: runner,
            params_path: args.value_of("params").map(|p| p.to_string()),
        })
    }
}
