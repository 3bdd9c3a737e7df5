// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-operation cost tables.
//!
//! A cost table maps a node name (or, as a fallback, an op type) to the time
//! in microseconds one full replica takes. The cost is either one number for
//! every device or a list with one entry per device:
//!
//! ```json
//! { "dense/MatMul": 120.5, "loss/Mean": [3, 3, 4, 4] }
//! ```
//!
//! Tables are read from `<folder>/cost.json` or, failing that, from
//! `<folder>/cost.bin` (bincode of `name → [costs]`, a single-element list
//! meaning "same on every device").

use crate::CostTableError;
use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// JSON cost table filename.
pub const COST_JSON_FILE: &str = "cost.json";

/// Binary cost table filename.
pub const COST_BIN_FILE: &str = "cost.bin";

/// Execution cost of one operation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Cost {
    /// Same cost on every device.
    Uniform(f64),
    /// One cost per device, by device index.
    PerDevice(Vec<f64>),
}

impl Cost {
    /// Returns the cost on `device`. A per-device list shorter than the
    /// device count repeats its last entry.
    pub fn on_device(&self, device: usize) -> f64 {
        match self {
            Cost::Uniform(c) => *c,
            Cost::PerDevice(list) => list
                .get(device)
                .or_else(|| list.last())
                .copied()
                .unwrap_or(0.0),
        }
    }

    fn to_list(&self) -> Vec<f64> {
        match self {
            Cost::Uniform(c) => vec![*c],
            Cost::PerDevice(list) => list.clone(),
        }
    }

    fn from_list(mut list: Vec<f64>) -> Self {
        if list.len() == 1 {
            Cost::Uniform(list.remove(0))
        } else {
            Cost::PerDevice(list)
        }
    }
}

/// Read-only lookup of operation costs.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CostTable {
    entries: BTreeMap<String, Cost>,
}

impl CostTable {
    /// Creates an empty table (every op costs 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl Into<String>, cost: Cost) {
        self.entries.insert(name.into(), cost);
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `name` has an entry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the cost entry for `name`.
    pub fn get(&self, name: &str) -> Option<&Cost> {
        self.entries.get(name)
    }

    /// Cost of node `name` (op type `op`) on `device`: the node entry if
    /// present, else the op entry, else 0.
    pub fn cost_of(&self, name: &str, op: &str, device: usize) -> f64 {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(op))
            .map_or(0.0, |c| c.on_device(device))
    }

    /// Loads `<folder>/cost.json`, falling back to `<folder>/cost.bin`.
    pub fn load_dir(folder: &Path) -> Result<Self, CostTableError> {
        let json = folder.join(COST_JSON_FILE);
        if json.is_file() {
            return Self::from_json_file(&json);
        }
        let bin = folder.join(COST_BIN_FILE);
        if bin.is_file() {
            return Self::from_bincode_file(&bin);
        }
        Err(CostTableError::NotFound {
            folder: folder.to_path_buf(),
        })
    }

    /// Reads a JSON cost table.
    pub fn from_json_file(path: &Path) -> Result<Self, CostTableError> {
        let text = std::fs::read_to_string(path).map_err(|source| CostTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table: Self = serde_json::from_str(&text).map_err(|source| CostTableError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), entries = table.len(), "cost table loaded");
        Ok(table)
    }

    /// Reads a bincode cost table.
    pub fn from_bincode_file(path: &Path) -> Result<Self, CostTableError> {
        let file = std::fs::File::open(path).map_err(|source| CostTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: BTreeMap<String, Vec<f64>> = bincode::deserialize_from(BufReader::new(file))
            .map_err(|source| CostTableError::Bincode {
                path: path.to_path_buf(),
                source,
            })?;
        let table = Self {
            entries: raw.into_iter().map(|(k, v)| (k, Cost::from_list(v))).collect(),
        };
        tracing::info!(path = %path.display(), entries = table.len(), "cost table loaded");
        Ok(table)
    }

    /// Writes the table in the bincode layout read by [`Self::from_bincode_file`].
    pub fn save_bincode(&self, path: &Path) -> Result<(), CostTableError> {
        let write_err = |source| CostTableError::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::create(path).map_err(write_err)?;
        let raw: BTreeMap<&str, Vec<f64>> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_list()))
            .collect();
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &raw).map_err(|source| CostTableError::Bincode {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(write_err)
    }
}

impl FromIterator<(String, f64)> for CostTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k, Cost::Uniform(v))).collect(),
        }
    }
}
