//! Named-field containers for optimizer state and configuration.
//!
//! Strategies own the schema of their `State`: every field is addressed by name
//! and holds one of a handful of value kinds.  Restart controllers never look
//! inside a strategy's fields beyond the few they document; they only merge
//! whole states field by field with [`State::select`].

use hashbrown::HashMap;

use crate::error::{EvoError, Result};

/// A single field value
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag
    Bool(bool),
    /// Signed integer, used for counters and sizes
    Int(i64),
    /// Scalar
    Float(f32),
    /// Dense vector
    Vector(Vec<f32>),
    /// Row-major matrix
    Matrix(Vec<Vec<f32>>),
}

impl Value {
    /// Name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Vector(_) => "vector",
            Value::Matrix(_) => "matrix",
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    // Integers are accepted where floats are expected so hand-written configs
    // can say `1` instead of `1.0`.
    fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    fn as_matrix(&self) -> Option<&[Vec<f32>]> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::Vector(v)
    }
}

impl From<&[f32]> for Value {
    fn from(v: &[f32]) -> Self {
        Value::Vector(v.to_vec())
    }
}

impl From<Vec<Vec<f32>>> for Value {
    fn from(m: Vec<Vec<f32>>) -> Self {
        Value::Matrix(m)
    }
}

// Shared typed lookup; `missing` decides which error an absent key becomes.
fn typed<'a, T, F>(
    fields: &'a HashMap<String, Value>,
    key: &str,
    missing: fn(String) -> EvoError,
    expected: &'static str,
    extract: F,
) -> Result<T>
where
    F: FnOnce(&'a Value) -> Option<T>,
{
    let value = fields.get(key).ok_or_else(|| missing(key.to_string()))?;
    extract(value).ok_or_else(|| EvoError::TypeMismatch {
        key: key.to_string(),
        expected: expected,
        found: value.kind(),
    })
}

fn non_negative(key: &str, i: i64) -> Result<usize> {
    if i < 0 {
        Err(EvoError::InvalidConfiguration(format!(
            "'{}' must be non-negative, got {}",
            key, i
        )))
    } else {
        Ok(i as usize)
    }
}

macro_rules! field_accessors {
    ($missing:expr) => {
        /// Reads a boolean field
        pub fn get_bool(&self, key: &str) -> Result<bool> {
            typed(&self.fields, key, $missing, "bool", |v| v.as_bool())
        }

        /// Reads an integer field
        pub fn get_int(&self, key: &str) -> Result<i64> {
            typed(&self.fields, key, $missing, "int", |v| v.as_int())
        }

        /// Reads a non-negative integer field
        pub fn get_usize(&self, key: &str) -> Result<usize> {
            non_negative(key, self.get_int(key)?)
        }

        /// Reads a scalar field
        pub fn get_f32(&self, key: &str) -> Result<f32> {
            typed(&self.fields, key, $missing, "float", |v| v.as_f32())
        }

        /// Reads a vector field
        pub fn get_vector(&self, key: &str) -> Result<&[f32]> {
            typed(&self.fields, key, $missing, "vector", |v| v.as_vector())
        }

        /// Reads a matrix field
        pub fn get_matrix(&self, key: &str) -> Result<&[Vec<f32>]> {
            typed(&self.fields, key, $missing, "matrix", |v| v.as_matrix())
        }

        /// Raw access to a field
        pub fn get(&self, key: &str) -> Option<&Value> {
            self.fields.get(key)
        }

        /// Returns true if the field exists
        pub fn contains_key(&self, key: &str) -> bool {
            self.fields.contains_key(key)
        }

        /// Sets a field, returning the previous value if there was one
        pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) -> Option<Value> {
            self.fields.insert(key.to_string(), value.into())
        }

        /// Builder form of `insert`
        pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
            self.insert(key, value);
            self
        }

        /// Iterates over the field names, in no particular order
        pub fn keys(&self) -> impl Iterator<Item = &String> {
            self.fields.keys()
        }

        /// Iterates over all fields
        pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
            self.fields.iter()
        }

        /// Number of fields
        pub fn len(&self) -> usize {
            self.fields.len()
        }

        /// True when there are no fields
        pub fn is_empty(&self) -> bool {
            self.fields.is_empty()
        }
    };
}

/// Mutable search state of an optimizer, passed by value between calls
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct State {
    fields: HashMap<String, Value>,
}

impl State {
    /// Returns an empty state
    pub fn new() -> Self {
        State {
            fields: HashMap::new(),
        }
    }

    field_accessors!(EvoError::MissingField);

    /// Field-wise select between two states sharing a schema: every field is
    /// taken from `on_true` when `pred` holds and from `on_false` otherwise.
    ///
    /// Both states must carry exactly the same field names.
    pub fn select(pred: bool, on_true: State, on_false: State) -> Result<State> {
        let mut on_true = on_true.fields;
        let mut fields = HashMap::with_capacity(on_false.fields.len());
        for (key, f_value) in on_false.fields.into_iter() {
            let t_value = match on_true.remove(&key) {
                Some(v) => v,
                None => return Err(EvoError::SchemaMismatch(key)),
            };
            fields.insert(key, if pred { t_value } else { f_value });
        }

        // Anything left only exists in `on_true`
        if let Some(key) = on_true.keys().next() {
            return Err(EvoError::SchemaMismatch(key.clone()));
        }
        Ok(State { fields: fields })
    }
}

/// Immutable optimizer configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Params {
    fields: HashMap<String, Value>,
}

impl Params {
    /// Returns an empty set of parameters
    pub fn new() -> Self {
        Params {
            fields: HashMap::new(),
        }
    }

    field_accessors!(EvoError::MissingParameter);

    /// Fails with `MissingParameter` if `key` is absent
    pub fn require(&self, key: &str) -> Result<()> {
        if self.contains_key(key) {
            Ok(())
        } else {
            Err(EvoError::MissingParameter(key.to_string()))
        }
    }

    /// Layers another component's defaults on top of these.  Keys from
    /// `other` win; every key that shadows an existing one is reported.
    pub fn merge_defaults(&mut self, other: Params, source: &str) {
        for (key, value) in other.fields.into_iter() {
            if let Some(previous) = self.fields.get(&key) {
                if *previous != value {
                    warn!(
                        key = key.as_str(),
                        source = source,
                        "parameter default overrides an existing default"
                    );
                }
            }
            self.fields.insert(key, value);
        }
    }

    /// Applies user overrides.  Unlike `merge_defaults`, replacing an existing
    /// key is the expected case; unknown keys are kept but reported.
    pub fn update(&mut self, overrides: Params) {
        for (key, value) in overrides.fields.into_iter() {
            if !self.fields.contains_key(&key) {
                debug!(key = key.as_str(), "override introduces an unknown parameter");
            }
            self.fields.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(flag: bool, sigma: f32) -> State {
        State::new()
            .with("sigma", sigma)
            .with("mean", vec![sigma; 3])
            .with("restarted", flag)
            .with("gen_counter", 3usize)
    }

    #[test]
    fn test_select_picks_branch_per_field() {
        let chosen = State::select(true, sample(true, 1.0), sample(false, 2.0)).unwrap();
        assert_eq!(chosen.get_f32("sigma").unwrap(), 1.0);
        assert_eq!(chosen.get_vector("mean").unwrap(), &[1.0, 1.0, 1.0]);
        assert!(chosen.get_bool("restarted").unwrap());

        let chosen = State::select(false, sample(true, 1.0), sample(false, 2.0)).unwrap();
        assert_eq!(chosen.get_f32("sigma").unwrap(), 2.0);
        assert!(!chosen.get_bool("restarted").unwrap());
    }

    #[test]
    fn test_select_rejects_schema_mismatch() {
        let extra = sample(true, 1.0).with("velocity", vec![0f32; 3]);
        let res = State::select(true, extra, sample(false, 2.0));
        assert_eq!(res, Err(EvoError::SchemaMismatch("velocity".to_string())));
    }

    #[test]
    fn test_typed_access() {
        let state = sample(false, 0.5);
        assert_eq!(state.get_usize("gen_counter").unwrap(), 3);
        assert_eq!(
            state.get_f32("missing"),
            Err(EvoError::MissingField("missing".to_string()))
        );
        match state.get_vector("sigma") {
            Err(EvoError::TypeMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, "vector");
                assert_eq!(found, "float");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let state = State::new().with("gen_counter", -1i64);
        assert!(state.get_usize("gen_counter").is_err());
    }

    #[test]
    fn test_params_missing_and_coercion() {
        let params = Params::new().with("min_num_gens", 50usize);
        assert_eq!(params.get_f32("min_num_gens").unwrap(), 50.0);
        assert_eq!(
            params.require("sigma_init"),
            Err(EvoError::MissingParameter("sigma_init".to_string()))
        );
    }

    #[test]
    fn test_params_merge_and_update() {
        let mut params = Params::new().with("sigma_init", 1.0f32).with("popsize", 8usize);
        params.merge_defaults(Params::new().with("min_num_gens", 50usize), "restart");
        params.update(Params::new().with("sigma_init", 0.5f32));
        assert_eq!(params.get_f32("sigma_init").unwrap(), 0.5);
        assert_eq!(params.get_usize("min_num_gens").unwrap(), 50);
        assert_eq!(params.len(), 3);
    }
}
