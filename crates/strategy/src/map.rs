// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sparse and dense strategy representations.
//!
//! ```text
//! DenseStrategy  [d0, d1, d2, ..]         position i = node index i
//!       │  IndexTable::translate
//!       ▼
//! StrategyMap    {"name": d, ..}          keyed by node name
//! ```
//!
//! Search loops work on dense sequences; evaluators consume name-keyed maps.

use crate::{Descriptor, Form, StrategyError, StrategyKey};
use graph_ir::{graph::Validated, ComputationGraph};
use std::collections::BTreeMap;
use std::path::Path;

// ── StrategyMap ────────────────────────────────────────────────────

/// A name → descriptor mapping. Nodes absent from the map run as a single
/// replica on device 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StrategyMap {
    entries: BTreeMap<String, Descriptor>,
}

impl StrategyMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the descriptor of `node`, returning the previous one.
    pub fn insert(&mut self, node: impl Into<String>, descriptor: Descriptor) -> Option<Descriptor> {
        self.entries.insert(node.into(), descriptor)
    }

    /// Returns the descriptor of `node`, if set.
    pub fn get(&self, node: &str) -> Option<&Descriptor> {
        self.entries.get(node)
    }

    /// Returns the number of explicitly placed nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no node is explicitly placed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, descriptor)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable access to every descriptor.
    pub fn descriptors_mut(&mut self) -> impl Iterator<Item = &mut Descriptor> {
        self.entries.values_mut()
    }

    /// Returns the expanded form of `node`'s descriptor, or a single replica
    /// on device 0 if the node is not in the map.
    pub fn form_for(&self, node: &str, num_devices: usize) -> Result<Form, StrategyError> {
        match self.entries.get(node) {
            Some(d) => d.to_form(node, num_devices),
            None => Ok(Form::single(0)),
        }
    }

    /// Checks that every entry names a node of `graph` and fits the device
    /// count.
    pub fn validate(
        &self,
        graph: &ComputationGraph<Validated>,
        num_devices: usize,
    ) -> Result<(), StrategyError> {
        for (name, descriptor) in &self.entries {
            if !graph.contains(name) {
                return Err(StrategyError::UnknownNode(name.clone()));
            }
            descriptor.to_form(name, num_devices)?;
        }
        Ok(())
    }

    /// Projects the map onto `table` order; unplaced nodes get the default
    /// descriptor.
    pub fn to_dense(&self, table: &IndexTable) -> DenseStrategy {
        DenseStrategy::new(
            table
                .iter()
                .map(|(_, name)| self.entries.get(name).cloned().unwrap_or_default())
                .collect(),
        )
    }

    /// Reads a JSON object of `name: descriptor` pairs.
    pub fn from_file(path: &Path) -> Result<Self, StrategyError> {
        let text = std::fs::read_to_string(path).map_err(|e| StrategyError::read(path, e))?;
        serde_json::from_str(&text).map_err(|e| StrategyError::json(path, e))
    }
}

impl FromIterator<(String, Descriptor)> for StrategyMap {
    fn from_iter<I: IntoIterator<Item = (String, Descriptor)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ── DenseStrategy ──────────────────────────────────────────────────

/// An ordered sequence of descriptors, one per node index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DenseStrategy(Vec<Descriptor>);

impl DenseStrategy {
    /// Wraps a descriptor sequence.
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        Self(descriptors)
    }

    /// A dense strategy of single-device placements.
    pub fn from_devices(devices: &[u32]) -> Self {
        Self(devices.iter().copied().map(Descriptor::Device).collect())
    }

    /// Returns the descriptors.
    pub fn as_slice(&self) -> &[Descriptor] {
        &self.0
    }

    /// Mutable access to the descriptors.
    pub fn as_mut_slice(&mut self) -> &mut [Descriptor] {
        &mut self.0
    }

    /// Returns the number of positions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the strategy has no positions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the canonical cache key.
    pub fn key(&self) -> StrategyKey {
        StrategyKey::of(&self.0)
    }
}

impl From<Vec<Descriptor>> for DenseStrategy {
    fn from(v: Vec<Descriptor>) -> Self {
        Self(v)
    }
}

// ── IndexTable ─────────────────────────────────────────────────────

/// Maps dense strategy positions to node names.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct IndexTable {
    names: BTreeMap<usize, String>,
}

impl IndexTable {
    /// Positions follow the graph's topological order.
    pub fn from_graph(graph: &ComputationGraph<Validated>) -> Self {
        graph.iter_nodes().map(|n| n.name.clone()).collect()
    }

    /// Reads a JSON object of `"index": "name"` pairs.
    pub fn from_file(path: &Path) -> Result<Self, StrategyError> {
        let text = std::fs::read_to_string(path).map_err(|e| StrategyError::read(path, e))?;
        serde_json::from_str(&text).map_err(|e| StrategyError::json(path, e))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the node name at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(&index).map(String::as_str)
    }

    /// Iterates over `(index, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(|(i, n)| (*i, n.as_str()))
    }

    /// Translates a dense strategy into a name-keyed map.
    ///
    /// Every position must have an entry in the table.
    pub fn translate(&self, dense: &DenseStrategy) -> Result<StrategyMap, StrategyError> {
        dense
            .as_slice()
            .iter()
            .enumerate()
            .map(|(index, descriptor)| -> Result<(String, Descriptor), StrategyError> {
                let name = self.name(index).ok_or(StrategyError::IndexOutOfRange {
                    index,
                    len: self.names.len(),
                })?;
                Ok((name.to_string(), descriptor.clone()))
            })
            .collect()
    }
}

impl FromIterator<String> for IndexTable {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().enumerate().collect(),
        }
    }
}

impl FromIterator<(usize, String)> for IndexTable {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
