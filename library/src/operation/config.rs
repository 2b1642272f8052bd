//! Typed configuration values passed to operations.
//!
//! A closed key→variant map replaces stringly-typed runtime property
//! reflection: operations declare the keys they understand
//! ([`crate::operation::Operation::config_keys`]) and read values through
//! the typed accessors here.

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(OrderedFloat<f64>),
    Integer(i64),
    Text(String),
    Boolean(bool),
}

impl ConfigValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(n.into_inner()),
            ConfigValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Number(OrderedFloat(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => ConfigValue::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Integer(i)
                } else {
                    ConfigValue::Number(OrderedFloat(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::String(s) => ConfigValue::Text(s),
            other => ConfigValue::Text(other.to_string()),
        }
    }
}

/// Opaque key→value configuration handed to `prepare`/`compute`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config(HashMap<String, ConfigValue>);

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Numeric value for `key`, falling back to `default` when absent or of
    /// another type.
    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(ConfigValue::as_number).unwrap_or(default)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_text)
    }

    /// Parse a `{"key": value, ...}` JSON object into a config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let map: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self(
            map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        ))
    }
}
