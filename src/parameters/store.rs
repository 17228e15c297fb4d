// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parameter registry access.
//!
//! The registry is a directory tree of keyed values. [`ParameterStore`] is
//! the seam to whatever holds it; [`RegistryTree`] is an in-memory tree
//! loaded from YAML, e.g.
//!
//! ```yaml
//! Stats: 1200
//! q0:
//!   Pulse 1:
//!     Frequency: 6.52 GHz
//!   Settling:
//!     Rate: [0.02 GHz, 0.005 GHz]
//!   Bell Violation:
//!     Pi Pulse Amplitude: 480 mV
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::units::{Quantity, Unit};
use crate::error::{HardwareError, ParameterError, Result};

/// A raw registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryValue {
    Flag(bool),
    /// Bare number, taken to be in whatever unit the reader asks for.
    Number(f64),
    /// Quantity with unit, e.g. `"16 ns"`.
    Text(String),
    List(Vec<RegistryValue>),
}

impl RegistryValue {
    /// Read as a scalar in `unit`.
    pub fn to_scalar(&self, name: &str, unit: Unit) -> std::result::Result<f64, ParameterError> {
        match self {
            RegistryValue::Number(n) => Ok(*n),
            RegistryValue::Text(text) => {
                let quantity: Quantity =
                    text.parse()
                        .map_err(|message| ParameterError::InvalidValue {
                            name: name.to_string(),
                            message,
                        })?;
                if quantity.unit == Unit::Dimensionless {
                    return Ok(quantity.value);
                }
                quantity
                    .convert_to(unit)
                    .ok_or_else(|| ParameterError::UnitMismatch {
                        name: name.to_string(),
                        expected: unit.to_string(),
                        actual: quantity.unit.to_string(),
                    })
            }
            RegistryValue::Flag(_) => Err(ParameterError::InvalidValue {
                name: name.to_string(),
                message: "expected a number, found a boolean".into(),
            }),
            RegistryValue::List(_) => Err(ParameterError::InvalidValue {
                name: name.to_string(),
                message: "expected a number, found a list".into(),
            }),
        }
    }

    /// Read as a list in `unit`. A scalar reads as a one-element list.
    pub fn to_list(&self, name: &str, unit: Unit) -> std::result::Result<Vec<f64>, ParameterError> {
        match self {
            RegistryValue::List(items) => items.iter().map(|v| v.to_scalar(name, unit)).collect(),
            scalar => Ok(vec![scalar.to_scalar(name, unit)?]),
        }
    }

    /// Read as a boolean. Numbers are true when non-zero.
    pub fn to_flag(&self, name: &str) -> std::result::Result<bool, ParameterError> {
        match self {
            RegistryValue::Flag(b) => Ok(*b),
            RegistryValue::Number(n) => Ok(*n != 0.0),
            _ => Err(ParameterError::InvalidValue {
                name: name.to_string(),
                message: "expected a boolean".into(),
            }),
        }
    }
}

/// One lookup: a directory path and a key inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryQuery {
    pub path: Vec<String>,
    pub key: String,
}

impl RegistryQuery {
    pub fn new(path: Vec<String>, key: impl Into<String>) -> Self {
        Self {
            path,
            key: key.into(),
        }
    }
}

/// Access to the parameter registry.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Look up a batch of entries in one round trip.
    ///
    /// The result has one slot per query, `None` for entries that do not exist.
    async fn get_many(
        &self,
        queries: &[RegistryQuery],
    ) -> std::result::Result<Vec<Option<RegistryValue>>, HardwareError>;
}

/// A registry directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryNode {
    Value(RegistryValue),
    Directory(BTreeMap<String, RegistryNode>),
}

/// In-memory registry tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryTree {
    root: BTreeMap<String, RegistryNode>,
}

impl RegistryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a tree from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let tree = Self::from_yaml(&content)?;
        debug!(path = %path.display(), "Loaded parameter registry");
        Ok(tree)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Look up `key` inside the directory `path`.
    pub fn get<S: AsRef<str>>(&self, path: &[S], key: &str) -> Option<&RegistryValue> {
        let mut dir = &self.root;
        for segment in path {
            match dir.get(segment.as_ref())? {
                RegistryNode::Directory(sub) => dir = sub,
                RegistryNode::Value(_) => return None,
            }
        }
        match dir.get(key)? {
            RegistryNode::Value(value) => Some(value),
            RegistryNode::Directory(_) => None,
        }
    }

    /// Store `value` under `key` in `path`, creating directories as needed.
    ///
    /// A value sitting where a directory is needed is replaced.
    pub fn set<S: AsRef<str>>(&mut self, path: &[S], key: &str, value: RegistryValue) -> &mut Self {
        let mut dir = &mut self.root;
        for segment in path {
            let node = dir
                .entry(segment.as_ref().to_string())
                .or_insert_with(|| RegistryNode::Directory(BTreeMap::new()));
            if let RegistryNode::Value(_) = node {
                *node = RegistryNode::Directory(BTreeMap::new());
            }
            dir = match node {
                RegistryNode::Directory(sub) => sub,
                RegistryNode::Value(_) => unreachable!("value nodes were replaced above"),
            };
        }
        dir.insert(key.to_string(), RegistryNode::Value(value));
        self
    }
}

#[async_trait]
impl ParameterStore for RegistryTree {
    async fn get_many(
        &self,
        queries: &[RegistryQuery],
    ) -> std::result::Result<Vec<Option<RegistryValue>>, HardwareError> {
        Ok(queries
            .iter()
            .map(|q| self.get(&q.path, &q.key).cloned())
            .collect())
    }
}
