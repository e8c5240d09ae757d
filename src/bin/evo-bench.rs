use std::process;

use clap::App;
use tracing_subscriber::EnvFilter;

use evo::bin_utils::args::{ArgAugmenter, ProblemArgs, RestartArgs, StrategyArgs};
use evo::bin_utils::bench::Bench;
use evo::bin_utils::BenchError;

fn parse_args() -> Result<Bench, BenchError> {
    let app = App::new("evo-bench")
        .version("0.1.0")
        .about("Benchmarks evolutionary strategies, with optional restarts, on classic test functions");
    let app = ProblemArgs.add_args(app);
    let app = StrategyArgs.add_args(app);
    let app = RestartArgs.add_args(app);
    let args = app.get_matches();

    Ok(Bench {
        problem: ProblemArgs.load_from_args(&args)?,
        strategy: StrategyArgs.load_from_args(&args)?,
        restart: RestartArgs.load_from_args(&args)?,
    })
}

fn run() -> Result<String, BenchError> {
    let report = parse_args()?.run()?;
    serde_json::to_string_pretty(&report).map_err(|e| BenchError::Json {
        path: "<stdout>".to_string(),
        source: e,
    })
}

fn main() {
    // Progress goes to stderr so stdout carries only the json report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    match run() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!(error = %e, "benchmark failed");
            process::exit(1);
        }
    }
}
