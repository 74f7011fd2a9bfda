//! Component configuration.
//!
//! Deliberately a typed scalar bag, not a board-description parser: reading
//! and validating a board JSON/TOML file and turning it into a tree of
//! [`ComponentConfig`]s is out of scope for this crate.

use std::collections::HashMap;

use crate::error::{Result, SimError};

/// A single configuration scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Signed integer, wide enough for any register width or clock divider
    /// this crate models.
    Int(i64),
    /// String scalar (component names, file paths supplied by a caller).
    Str(String),
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v as i64)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Str(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Str(v)
    }
}

/// A component's configuration: a flat map of key to scalar, handed to a
/// component's `build` constructor. Unrelated to any on-disk format; callers
/// assemble one however they like (hardcoded in a test, read out of their
/// own board file, generated).
#[derive(Debug, Clone, Default)]
pub struct ComponentConfig {
    values: HashMap<String, ConfigValue>,
}

impl ComponentConfig {
    /// An empty configuration.
    pub fn new() -> Self {
        ComponentConfig { values: HashMap::new() }
    }

    /// Builder-style insertion, for assembling a config inline.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Inserts or replaces a key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Reads a required integer key. `component` is only used to attribute
    /// the error message.
    pub fn get_int(&self, component: &str, key: &str) -> Result<i64> {
        match self.values.get(key) {
            Some(ConfigValue::Int(v)) => Ok(*v),
            Some(_) => Err(SimError::Config {
                component: component.to_string(),
                reason: format!("key `{key}` is not an integer"),
            }),
            None => Err(SimError::Config {
                component: component.to_string(),
                reason: format!("missing required key `{key}`"),
            }),
        }
    }

    /// Reads an integer key, falling back to `default` when absent.
    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(ConfigValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Reads a required string key.
    pub fn get_str<'a>(&'a self, component: &str, key: &str) -> Result<&'a str> {
        match self.values.get(key) {
            Some(ConfigValue::Str(v)) => Ok(v.as_str()),
            Some(_) => Err(SimError::Config {
                component: component.to_string(),
                reason: format!("key `{key}` is not a string"),
            }),
            None => Err(SimError::Config {
                component: component.to_string(),
                reason: format!("missing required key `{key}`"),
            }),
        }
    }
}
