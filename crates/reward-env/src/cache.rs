// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Strategy memoization.
//!
//! The cache maps a [`StrategyKey`] to the *raw* [`Evaluation`] the
//! evaluator returned for it. Normalisation and the memory penalty are
//! applied by the environment on every lookup, so a hit always yields the
//! same reward as the miss that filled it.
//!
//! Without a capacity the cache grows without bound. With one, the least
//! recently used entry is evicted on overflow.

use simulator::Evaluation;
use std::collections::HashMap;
use strategy::StrategyKey;

/// Memo of raw evaluations keyed by canonical strategy.
#[derive(Debug, Clone, Default)]
pub struct RewardCache {
    capacity: Option<usize>,
    entries: HashMap<StrategyKey, (Evaluation, u64)>,
    clock: u64,
}

impl RewardCache {
    /// Creates a cache; `None` means unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            clock: 0,
        }
    }

    /// Creates an unbounded cache.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Looks up `key`, marking it as recently used.
    pub fn get(&mut self, key: &StrategyKey) -> Option<Evaluation> {
        let (evaluation, last_used) = self.entries.get_mut(key)?;
        self.clock += 1;
        *last_used = self.clock;
        Some(evaluation.clone())
    }

    /// Stores `evaluation` under `key`, evicting the least recently used
    /// entry if the cache is full.
    pub fn insert(&mut self, key: StrategyKey, evaluation: Evaluation) {
        self.clock += 1;
        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity && !self.entries.contains_key(&key) {
                if let Some(oldest) = self.least_recent() {
                    tracing::trace!(key = %oldest, "evicting cached evaluation");
                    self.entries.remove(&oldest);
                }
            }
        }
        self.entries.insert(key, (evaluation, self.clock));
    }

    fn least_recent(&self) -> Option<StrategyKey> {
        self.entries
            .iter()
            .min_by_key(|(_, (_, last_used))| *last_used)
            .map(|(key, _)| key.clone())
    }

    /// Returns the number of cached strategies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured bound.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.clock = 0;
    }
}
