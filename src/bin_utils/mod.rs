//! Defines methods shared by the benchmark binaries

use evo_core::error::EvoError;

/// Methods for reading arguments
pub mod args;
/// Wires arguments into a runnable benchmark
pub mod bench;
/// Methods for loading configuration files
pub mod loaders;

/// Failure modes of a benchmark invocation
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// A command line value could not be used
    #[error("invalid argument '{name}': {reason}")]
    Argument {
        /// Argument name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A file could not be read
    #[error("unable to read {path}: {source}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// A configuration file was not valid json
    #[error("unable to parse {path}: {source}")]
    Json {
        /// Offending path
        path: String,
        /// Underlying error
        source: serde_json::Error,
    },

    /// The optimizer or objective rejected the configuration or failed
    #[error(transparent)]
    Evo(#[from] EvoError),
}
