//! Named configuration values exchanged between factories and the host

use crate::error::ExchangeResult;
use serde::{Deserialize, Serialize};

/// Typed argument values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl ArgumentValue {
    /// Numeric view; integers widen to f64
    pub fn as_real(&self) -> Option<f64> {
        match self {
            ArgumentValue::Real(v) => Some(*v),
            ArgumentValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgumentValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A named, described configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub key: String,
    pub value: ArgumentValue,
    #[serde(default)]
    pub description: String,
}

impl Argument {
    pub fn new(key: impl Into<String>, value: ArgumentValue) -> Self {
        Self {
            key: key.into(),
            value,
            description: String::new(),
        }
    }

    pub fn real(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, ArgumentValue::Real(value))
    }

    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, ArgumentValue::Text(value.into()))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parse an ordered argument list from host configuration JSON
    pub fn list_from_json(json: &str) -> ExchangeResult<Vec<Argument>> {
        Ok(serde_json::from_str(json)?)
    }
}
