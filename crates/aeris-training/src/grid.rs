//! Hyperparameter grid and candidate enumeration.

use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

/// A single hyperparameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(v) => v.fmt(f),
            ParamValue::Float(v) => v.fmt(f),
        }
    }
}

/// One concrete configuration: ordered name/value pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamSet(pub Vec<(String, ParamValue)>);

impl ParamSet {
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn get_int(&self, name: &str) -> TrainingResult<i64> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Ok(v),
            Some(other) => Err(TrainingError::InvalidParams(format!(
                "{name} must be an integer, got {other}"
            ))),
            None => Err(TrainingError::InvalidParams(format!("missing parameter: {name}"))),
        }
    }
}

impl std::fmt::Display for ParamSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(n, v)| format!("{n}={v}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Ordered mapping from parameter name to a finite set of candidate values.
/// Fixed at job-construction time; never mutated during search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HyperparameterGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl HyperparameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ints(mut self, name: &str, values: impl IntoIterator<Item = i64>) -> Self {
        self.entries
            .push((name.to_string(), values.into_iter().map(ParamValue::Int).collect()));
        self
    }

    pub fn with_floats(mut self, name: &str, values: impl IntoIterator<Item = f64>) -> Self {
        self.entries
            .push((name.to_string(), values.into_iter().map(ParamValue::Float).collect()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cartesian product of the value sets, in a fixed enumeration order:
    /// the last-declared parameter varies fastest. The order is what breaks
    /// score ties, so it must stay stable across runs.
    pub fn candidates(&self) -> TrainingResult<Vec<ParamSet>> {
        if self.entries.is_empty() {
            return Err(TrainingError::InvalidParams("empty hyperparameter grid".to_string()));
        }
        for (name, values) in &self.entries {
            if values.is_empty() {
                return Err(TrainingError::InvalidParams(format!(
                    "parameter {name} has no candidate values"
                )));
            }
        }

        let mut out: Vec<ParamSet> = vec![ParamSet::default()];
        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(out.len() * values.len());
            for prefix in &out {
                for value in values {
                    let mut set = prefix.clone();
                    set.0.push((name.clone(), *value));
                    next.push(set);
                }
            }
            out = next;
        }
        Ok(out)
    }
}
