// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Baseline strategies and descriptor substitutions.
//!
//! A [`BestRecord`] (`best_time.log`) holds the best strategy a search has
//! found. A [`ModificationPlan`] (`modify_test_config.json`) lists
//! `{old, new}` substitutions to apply to it before re-scoring, which makes
//! it cheap to ask "what if every node on device 2 moved to device 3?".

use crate::{DenseStrategy, Descriptor, StrategyError, StrategyMap};
use std::path::Path;

/// Default best-strategy record filename inside a dataset folder.
pub const BEST_RECORD_FILE: &str = "best_time.log";

/// Default modification plan filename.
pub const MODIFY_CONFIG_FILE: &str = "modify_test_config.json";

/// The best strategy found so far and its measured time.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BestRecord {
    /// Time reported when the record was written.
    pub time: f64,
    /// The strategy itself.
    pub strategy: StrategyMap,
}

impl BestRecord {
    /// Reads a record from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, StrategyError> {
        let text = std::fs::read_to_string(path).map_err(|e| StrategyError::read(path, e))?;
        serde_json::from_str(&text).map_err(|e| StrategyError::json(path, e))
    }

    /// Reads `<folder>/best_time.log`.
    pub fn from_dir(folder: &Path) -> Result<Self, StrategyError> {
        Self::from_file(&folder.join(BEST_RECORD_FILE))
    }
}

/// One substitution: every descriptor equal to `old` becomes `new`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Change {
    pub old: Descriptor,
    pub new: Descriptor,
}

/// An ordered list of substitutions.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModificationPlan {
    pub changes: Vec<Change>,
}

impl ModificationPlan {
    /// Reads a plan from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, StrategyError> {
        let text = std::fs::read_to_string(path).map_err(|e| StrategyError::read(path, e))?;
        serde_json::from_str(&text).map_err(|e| StrategyError::json(path, e))
    }

    /// Applies the changes in order to a name-keyed strategy.
    ///
    /// Later changes see the result of earlier ones. Returns the modified
    /// map and the total number of replacements.
    pub fn apply(&self, strategy: &StrategyMap) -> (StrategyMap, usize) {
        let mut out = strategy.clone();
        let count = self.substitute(out.descriptors_mut());
        (out, count)
    }

    /// Applies the changes in order to a dense strategy.
    pub fn apply_dense(&self, strategy: &DenseStrategy) -> (DenseStrategy, usize) {
        let mut out = strategy.clone();
        let count = self.substitute(out.as_mut_slice().iter_mut());
        (out, count)
    }

    fn substitute<'a>(&self, descriptors: impl Iterator<Item = &'a mut Descriptor>) -> usize {
        let mut slots: Vec<&mut Descriptor> = descriptors.collect();
        let mut count = 0;
        for change in &self.changes {
            for slot in slots.iter_mut() {
                if **slot == change.old {
                    **slot = change.new.clone();
                    count += 1;
                }
            }
        }
        tracing::debug!(changes = self.changes.len(), replaced = count, "modification plan applied");
        count
    }
}
