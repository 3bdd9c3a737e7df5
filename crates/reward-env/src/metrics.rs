// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reward environment statistics.
//!
//! [`RewardStats`] counts evaluator calls, cache hits and memory-budget
//! penalties, and accumulates the wall time spent inside the evaluator.

use std::time::Duration;

/// Counters for one [`crate::Environment`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RewardStats {
    /// Calls made to the evaluator.
    pub evaluations: usize,
    /// Rewards served from the cache.
    pub cache_hits: usize,
    /// Rewards that carried the memory penalty (hits included).
    pub penalised: usize,
    /// Wall time spent inside the evaluator.
    pub evaluator_time: Duration,
}

impl RewardStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one evaluator call.
    pub fn record_evaluation(&mut self, elapsed: Duration) {
        self.evaluations += 1;
        self.evaluator_time += elapsed;
    }

    /// Records one cache hit.
    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    /// Records one penalised reward.
    pub fn record_penalty(&mut self) {
        self.penalised += 1;
    }

    /// Total rewards served.
    pub fn rewards(&self) -> usize {
        self.evaluations + self.cache_hits
    }

    /// Fraction of rewards served from the cache.
    pub fn hit_rate(&self) -> f64 {
        match self.rewards() {
            0 => 0.0,
            n => self.cache_hits as f64 / n as f64,
        }
    }

    /// Mean evaluator wall time per call.
    pub fn mean_evaluation_time(&self) -> Duration {
        match u32::try_from(self.evaluations) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.evaluator_time / n,
        }
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Rewards: {} served, {} evaluated ({:.2}ms mean), {} cache hits ({:.0}%), {} penalised",
            self.rewards(),
            self.evaluations,
            self.mean_evaluation_time().as_secs_f64() * 1000.0,
            self.cache_hits,
            self.hit_rate() * 100.0,
            self.penalised,
        )
    }
}
