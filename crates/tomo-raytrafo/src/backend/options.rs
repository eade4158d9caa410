//! Extra keyword options forwarded to projection kernels

use crate::error::{RayTrafoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dynamically typed option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Backend options by name, retained verbatim for adjoints and replicas
pub type BackendOptions = BTreeMap<String, OptionValue>;

impl OptionValue {
    /// Name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "int",
            OptionValue::Float(_) => "float",
            OptionValue::Str(_) => "str",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value; integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(f) => Some(*f),
            OptionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        OptionValue::Int(v.into())
    }
}

impl From<usize> for OptionValue {
    fn from(v: usize) -> Self {
        OptionValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

/// Non-negative integer option, `None` when absent.
pub(crate) fn get_usize(options: &BackendOptions, key: &str) -> Result<Option<usize>> {
    let Some(value) = options.get(key) else {
        return Ok(None);
    };
    let int = value
        .as_int()
        .ok_or_else(|| RayTrafoError::type_mismatch(key, "an int", value.kind()))?;
    usize::try_from(int)
        .map(Some)
        .map_err(|_| RayTrafoError::invalid_value(key, format!("must be >= 0, got {int}")))
}

/// Boolean option, `None` when absent.
pub(crate) fn get_bool(options: &BackendOptions, key: &str) -> Result<Option<bool>> {
    options
        .get(key)
        .map(|value| {
            value
                .as_bool()
                .ok_or_else(|| RayTrafoError::type_mismatch(key, "a bool", value.kind()))
        })
        .transpose()
}

/// String option, `None` when absent.
pub(crate) fn get_str<'a>(options: &'a BackendOptions, key: &str) -> Result<Option<&'a str>> {
    options
        .get(key)
        .map(|value| {
            value
                .as_str()
                .ok_or_else(|| RayTrafoError::type_mismatch(key, "a str", value.kind()))
        })
        .transpose()
}
