//! Method parameter schemas and values.
//!
//! Every registered method declares a [`ParamSchema`]: the names, types,
//! defaults, and admissible ranges of its tuning knobs. User overrides are
//! merged over the defaults with [`ParamSchema::merge`], which rejects
//! unknown names, wrong types, and out-of-range values before a run starts.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{QapError, QapResult};

/// A single parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// The declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
        }
    }

    fn numeric(&self) -> Option<f64> {
        match *self {
            ParamValue::Int(v) => Some(v as f64),
            ParamValue::Float(v) => Some(v),
            ParamValue::Bool(_) => None,
        }
    }

    /// Converts to the declared kind. Integers widen to floats; floats
    /// narrow to integers only when integral.
    fn coerce(self, kind: ParamKind) -> Option<ParamValue> {
        match (self, kind) {
            (v, k) if v.kind() == k => Some(v),
            (ParamValue::Int(v), ParamKind::Float) => Some(ParamValue::Float(v as f64)),
            (ParamValue::Float(v), ParamKind::Int) if v.fract() == 0.0 && v.is_finite() => {
                Some(ParamValue::Int(v as i64))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// Declaration of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub default: ParamValue,
    /// Inclusive numeric lower bound.
    pub min: Option<f64>,
    /// Inclusive numeric upper bound.
    pub max: Option<f64>,
}

impl ParamSpec {
    fn new(name: &str, default: ParamValue, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            default,
            min: None,
            max: None,
        }
    }

    pub fn float(name: &str, default: f64, description: &str) -> Self {
        Self::new(name, ParamValue::Float(default), description)
    }

    pub fn int(name: &str, default: i64, description: &str) -> Self {
        Self::new(name, ParamValue::Int(default), description)
    }

    pub fn bool(name: &str, default: bool, description: &str) -> Self {
        Self::new(name, ParamValue::Bool(default), description)
    }

    /// Sets an inclusive numeric range.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Sets an inclusive lower bound only.
    pub fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn kind(&self) -> ParamKind {
        self.default.kind()
    }

    fn check(&self, value: ParamValue) -> QapResult<ParamValue> {
        let value = value.coerce(self.kind()).ok_or_else(|| {
            QapError::InvalidConfig(format!(
                "parameter '{}' expects {:?}, got {value}",
                self.name,
                self.kind()
            ))
        })?;
        if let Some(v) = value.numeric() {
            if !v.is_finite() {
                return Err(QapError::InvalidConfig(format!(
                    "parameter '{}' must be finite, got {v}",
                    self.name
                )));
            }
            if self.min.is_some_and(|m| v < m) || self.max.is_some_and(|m| v > m) {
                return Err(QapError::InvalidConfig(format!(
                    "parameter '{}' = {v} outside [{}, {}]",
                    self.name,
                    self.min.map_or("-inf".to_string(), |m| m.to_string()),
                    self.max.map_or("inf".to_string(), |m| m.to_string()),
                )));
            }
        }
        Ok(value)
    }
}

/// Ordered list of parameter declarations for one method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    specs: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration (builder style).
    pub fn with(mut self, spec: ParamSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// The default value of every declared parameter.
    pub fn defaults(&self) -> Params {
        let mut params = Params::new();
        for spec in &self.specs {
            params.set(&spec.name, spec.default);
        }
        params
    }

    /// Overlays `overrides` on the defaults.
    ///
    /// Fails with [`QapError::InvalidConfig`] on unknown names, type
    /// mismatches, or values outside the declared range.
    pub fn merge(&self, overrides: &Params) -> QapResult<Params> {
        let mut merged = self.defaults();
        for (name, &value) in overrides.iter() {
            let spec = self.get(name).ok_or_else(|| {
                QapError::InvalidConfig(format!("unknown parameter '{name}'"))
            })?;
            merged.set(name, spec.check(value)?);
        }
        Ok(merged)
    }
}

/// A resolved set of named parameter values.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    fn require(&self, name: &str) -> QapResult<ParamValue> {
        self.get(name)
            .ok_or_else(|| QapError::InvalidConfig(format!("missing parameter '{name}'")))
    }

    pub fn float(&self, name: &str) -> QapResult<f64> {
        self.require(name)?
            .numeric()
            .ok_or_else(|| QapError::InvalidConfig(format!("parameter '{name}' is not numeric")))
    }

    pub fn int(&self, name: &str) -> QapResult<i64> {
        match self.require(name)? {
            ParamValue::Int(v) => Ok(v),
            other => Err(QapError::InvalidConfig(format!(
                "parameter '{name}' expects an integer, got {other}"
            ))),
        }
    }

    pub fn usize(&self, name: &str) -> QapResult<usize> {
        let v = self.int(name)?;
        usize::try_from(v).map_err(|_| {
            QapError::InvalidConfig(format!("parameter '{name}' must be non-negative, got {v}"))
        })
    }

    pub fn bool(&self, name: &str) -> QapResult<bool> {
        match self.require(name)? {
            ParamValue::Bool(v) => Ok(v),
            other => Err(QapError::InvalidConfig(format!(
                "parameter '{name}' expects a bool, got {other}"
            ))),
        }
    }
}
