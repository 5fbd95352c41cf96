use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::units::{parse_quantity, unit, Dimension};

/// Top-level configuration as read by the command line tool
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub topology: Properties,
    #[serde(default)]
    pub cuts: Properties,
}

/// A single configuration value
///
/// Reals with an explicit unit are written as text, e.g. `"30 degree"`.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    List(Vec<String>),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<S: Into<String>> From<Vec<S>> for Value {
    fn from(v: Vec<S>) -> Self {
        Value::List(v.into_iter().map(|s| s.into()).collect())
    }
}

/// Flat key-value configuration with dotted keys
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.store(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether `key` is a boolean set to true
    pub fn has_flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }

    fn get(&self, key: &str) -> Result<&Value> {
        self.0
            .get(key)
            .ok_or_else(|| Error::MissingProperty(key.to_owned()))
    }

    fn type_error(key: &str, expected: &'static str) -> Error {
        Error::PropertyType {
            key: key.to_owned(),
            expected,
        }
    }

    pub fn fetch_bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(Self::type_error(key, "boolean")),
        }
    }

    pub fn fetch_integer(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            Value::Integer(i) => Ok(*i),
            _ => Err(Self::type_error(key, "integer")),
        }
    }

    pub fn fetch_string(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            Value::Text(s) => Ok(s),
            _ => Err(Self::type_error(key, "string")),
        }
    }

    pub fn fetch_strings(&self, key: &str) -> Result<&[String]> {
        match self.get(key)? {
            Value::List(l) => Ok(l),
            _ => Err(Self::type_error(key, "string list")),
        }
    }

    /// A real number together with its explicit unit, if any
    pub fn fetch_real(&self, key: &str) -> Result<(f64, Option<&str>)> {
        match self.get(key)? {
            Value::Real(x) => Ok((*x, None)),
            Value::Integer(i) => Ok((*i as f64, None)),
            Value::Text(s) => parse_quantity(s),
            _ => Err(Self::type_error(key, "real")),
        }
    }

    pub fn has_explicit_unit(&self, key: &str) -> bool {
        matches!(self.fetch_real(key), Ok((_, Some(_))))
    }

    /// A real number converted to internal units
    ///
    /// Without an explicit unit the value is taken in `default_unit`.
    pub fn fetch_quantity(
        &self,
        key: &str,
        dimension: Dimension,
        default_unit: f64,
    ) -> Result<f64> {
        let (value, symbol) = self.fetch_real(key)?;
        let Some(symbol) = symbol else {
            return Ok(value * default_unit);
        };
        let (dim, scale) = unit(symbol)?;
        if dim != dimension {
            return Err(Error::UnitDimension {
                key: key.to_owned(),
                unit: symbol.to_owned(),
            });
        }
        Ok(value * scale)
    }

    /// All properties below `prefix.`, with the prefix removed
    pub fn sub(&self, prefix: &str) -> Properties {
        let prefix = format!("{prefix}.");
        Properties(
            self.0
                .iter()
                .filter_map(|(k, v)| {
                    k.strip_prefix(&prefix).map(|k| (k.to_owned(), v.clone()))
                })
                .collect(),
        )
    }
}
