use std::fs::File;
use std::io::BufReader;

use evo_core::state::Params;

use super::BenchError;

/// Reads a json object of parameter overrides.  Integers stay integers and
/// decimals become floats; vectors and matrices are plain nested arrays.
pub fn load_params(path: &str) -> Result<Params, BenchError> {
    info!(path = path, "loading parameter overrides");
    let file = File::open(path).map_err(|e| BenchError::Io {
        path: path.to_string(),
        source: e,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| BenchError::Json {
        path: path.to_string(),
        source: e,
    })
}
