// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The reward environment.
//!
//! ```text
//!   DenseStrategy ──key──▶ RewardCache ──hit──────────────┐
//!        │                     │ miss                     │
//!        ▼                     ▼                          ▼
//!   IndexTable ──▶ StrategyMap ──▶ StrategyEvaluator ──▶ raw Evaluation
//!                                                         │
//!                                      time / divisor, × penalty if any
//!                                      device exceeds its budget
//!                                                         ▼
//!                                                       reward
//! ```
//!
//! | Entry point            | Divisor | Penalty | Cached | Diagnostic file          |
//! |------------------------|---------|---------|--------|--------------------------|
//! | `get_reward`           | 10³     | ×10     | yes    | `modified_strategy.json` |
//! | `directly_get_reward`  | 10⁶     | ×10 000 | no     | `best_strategy.json`     |
//!
//! An environment is single-threaded: every call takes `&mut self`. Run
//! independent environments to search in parallel.

use crate::{ConstructionError, EnvConfig, EnvError, RewardCache, RewardStats};
use cluster::{Bandwidth, DeviceList, MemoryBudget};
use graph_ir::{graph::Validated, ComputationGraph, GraphLoader};
use simulator::{CostTable, Evaluation, EvaluationError, EvaluationRequest, ListSimulator, StrategyEvaluator};
use std::path::{Path, PathBuf};
use std::time::Instant;
use strategy::{DenseStrategy, IndexTable, StrategyError, StrategyMap};

/// Diagnostic dump written by the search entry points.
pub const MODIFIED_STRATEGY_FILE: &str = "modified_strategy.json";

/// Diagnostic dump written by the direct entry points.
pub const BEST_STRATEGY_FILE: &str = "best_strategy.json";

/// How a raw evaluation becomes a reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardScale {
    /// Raw time (µs) is divided by this.
    pub divisor: f64,
    /// Multiplier applied when any device exceeds its budget.
    pub penalty: f64,
}

impl RewardScale {
    /// Used by the memoized search path: milliseconds, ×10.
    pub const SEARCH: Self = Self {
        divisor: 1e3,
        penalty: 10.0,
    };

    /// Used for one-off scoring of a reference strategy: seconds, ×10 000.
    pub const DIRECT: Self = Self {
        divisor: 1e6,
        penalty: 10_000.0,
    };
}

/// Scores placement strategies for one graph.
pub struct Environment<E = ListSimulator> {
    folder: PathBuf,
    graph: ComputationGraph<Validated>,
    devices: DeviceList,
    budgets: Vec<MemoryBudget>,
    bandwidth: Bandwidth,
    sinks: Vec<String>,
    cost_table: CostTable,
    cache: RewardCache,
    stats: RewardStats,
    evaluator: E,
}

// ── Construction ───────────────────────────────────────────────────

impl<E: StrategyEvaluator> Environment<E> {
    /// Loads `<folder>/graph.pbtxt` and the folder's cost table.
    ///
    /// Steps:
    /// 1. Validate the configuration (devices, budgets, bandwidth).
    /// 2. Load and validate the graph.
    /// 3. Load the cost table.
    /// 4. Resolve the sinks for this dataset.
    pub fn new(folder: &Path, config: EnvConfig, evaluator: E) -> Result<Self, EnvError> {
        config.validate()?;
        let graph = GraphLoader::load_dir(folder).map_err(ConstructionError::from)?;
        tracing::info!("{}", graph.summary());
        let cost_table = CostTable::load_dir(folder).map_err(ConstructionError::from)?;
        Self::from_parts(folder, graph, cost_table, config, evaluator)
    }

    /// Builds an environment from in-memory parts.
    ///
    /// Diagnostic dumps are written under `folder`.
    pub fn from_parts(
        folder: &Path,
        graph: ComputationGraph<Validated>,
        cost_table: CostTable,
        config: EnvConfig,
        evaluator: E,
    ) -> Result<Self, EnvError> {
        let devices = config.validate()?;
        let sinks = config.sinks_for(folder);
        let bandwidth = config.resolve_bandwidth();

        tracing::info!(
            evaluator = evaluator.name(),
            devices = devices.len(),
            tasks = devices.num_tasks(),
            %bandwidth,
            sinks = ?sinks,
            "reward environment ready"
        );

        Ok(Self {
            folder: folder.to_path_buf(),
            graph,
            devices,
            budgets: config.device_mems,
            bandwidth,
            sinks,
            cost_table,
            cache: RewardCache::new(config.cache_capacity),
            stats: RewardStats::new(),
            evaluator,
        })
    }

    // ── Rewards ────────────────────────────────────────────────────

    /// Memoized reward of a dense strategy.
    ///
    /// Positions are named through `table`. The raw evaluation is cached
    /// under the strategy's canonical key; a repeat call scores the cached
    /// evaluation without invoking the evaluator.
    pub fn get_reward(&mut self, dense: &DenseStrategy, table: &IndexTable) -> Result<f64, EnvError> {
        let key = dense.key();
        if let Some(raw) = self.cache.get(&key) {
            self.stats.record_hit();
            tracing::debug!(%key, "reward cache hit");
            return Ok(self.score(&raw, RewardScale::SEARCH));
        }

        let strategy = self.translate(dense, table)?;
        let raw = self.evaluate(&strategy, self.bandwidth, MODIFIED_STRATEGY_FILE)?;
        let reward = self.score(&raw, RewardScale::SEARCH);
        self.cache.insert(key, raw);
        Ok(reward)
    }

    /// [`Self::get_reward`] under a one-off bandwidth. Never cached.
    pub fn get_reward_with_bandwidth(
        &mut self,
        dense: &DenseStrategy,
        table: &IndexTable,
        bandwidth: Bandwidth,
    ) -> Result<f64, EnvError> {
        let strategy = self.translate(dense, table)?;
        let raw = self.evaluate(&strategy, bandwidth, MODIFIED_STRATEGY_FILE)?;
        Ok(self.score(&raw, RewardScale::SEARCH))
    }

    /// Reward of a name-keyed strategy. Never cached.
    pub fn directly_get_reward(&mut self, strategy: &StrategyMap) -> Result<f64, EnvError> {
        self.directly_get_reward_with_bandwidth(strategy, self.bandwidth)
    }

    /// [`Self::directly_get_reward`] under a one-off bandwidth.
    pub fn directly_get_reward_with_bandwidth(
        &mut self,
        strategy: &StrategyMap,
        bandwidth: Bandwidth,
    ) -> Result<f64, EnvError> {
        let raw = self.evaluate(strategy, bandwidth, BEST_STRATEGY_FILE)?;
        Ok(self.score(&raw, RewardScale::DIRECT))
    }

    /// Runs the evaluator on a disposable copy of the graph.
    pub fn evaluate(
        &mut self,
        strategy: &StrategyMap,
        bandwidth: Bandwidth,
        diagnostic_file: &str,
    ) -> Result<Evaluation, EnvError> {
        let diagnostic_path = self.folder.join(diagnostic_file);
        let request = EvaluationRequest {
            graph: self.graph.clone(),
            devices: &self.devices,
            strategy,
            sinks: &self.sinks,
            bandwidth,
            cost_table: &self.cost_table,
            diagnostic_path: Some(&diagnostic_path),
        };

        let started = Instant::now();
        let raw = self.evaluator.evaluate(request)?;
        let elapsed = started.elapsed();

        if raw.peak_memory.len() != self.budgets.len() {
            return Err(EvaluationError::MemoryReport {
                expected: self.budgets.len(),
                reported: raw.peak_memory.len(),
            }
            .into());
        }
        self.stats.record_evaluation(elapsed);
        tracing::debug!(
            evaluator = self.evaluator.name(),
            time_us = raw.time,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "strategy evaluated"
        );
        Ok(raw)
    }

    /// Turns a raw evaluation into a reward under `scale`, applying the
    /// memory penalty when any device exceeds its budget.
    pub fn score(&mut self, raw: &Evaluation, scale: RewardScale) -> f64 {
        let time = raw.time as f64 / scale.divisor;
        let over: Vec<usize> = self
            .budgets
            .iter()
            .zip(&raw.peak_memory)
            .enumerate()
            .filter(|(_, (budget, used))| budget.is_exceeded_by(**used))
            .map(|(device, _)| device)
            .collect();
        if over.is_empty() {
            return time;
        }
        self.stats.record_penalty();
        tracing::warn!(devices = ?over, penalty = scale.penalty, "memory budget exceeded");
        time * scale.penalty
    }

    /// Names the positions of `dense`, rejecting names the graph lacks.
    fn translate(&self, dense: &DenseStrategy, table: &IndexTable) -> Result<StrategyMap, EnvError> {
        let strategy = table.translate(dense)?;
        if let Some((missing, _)) = strategy.iter().find(|(name, _)| !self.graph.contains(name)) {
            return Err(StrategyError::UnknownNode(missing.to_string()).into());
        }
        Ok(strategy)
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// Index table following the graph's topological order.
    pub fn index_table(&self) -> IndexTable {
        IndexTable::from_graph(&self.graph)
    }

    /// Clears the reward cache.
    pub fn reset_cache(&mut self) {
        tracing::debug!(entries = self.cache.len(), "reward cache cleared");
        self.cache.clear();
    }

    /// Number of cached strategies.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> &RewardStats {
        &self.stats
    }

    pub fn graph(&self) -> &ComputationGraph<Validated> {
        &self.graph
    }

    pub fn devices(&self) -> &DeviceList {
        &self.devices
    }

    pub fn budgets(&self) -> &[MemoryBudget] {
        &self.budgets
    }

    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    pub fn sinks(&self) -> &[String] {
        &self.sinks
    }

    pub fn cost_table(&self) -> &CostTable {
        &self.cost_table
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }
}

impl<E: StrategyEvaluator> std::fmt::Debug for Environment<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("folder", &self.folder)
            .field("graph", &self.graph.name)
            .field("devices", &self.devices.len())
            .field("bandwidth", &self.bandwidth)
            .field("sinks", &self.sinks)
            .field("evaluator", &self.evaluator.name())
            .field("cached", &self.cache.len())
            .field("cache_capacity", &self.cache.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_ir::OpNode;
    use proptest::prelude::*;
    use strategy::Descriptor;

    /// Returns a fixed evaluation.
    struct Fixed(Evaluation);

    impl StrategyEvaluator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn evaluate(&self, _request: EvaluationRequest<'_>) -> Result<Evaluation, EvaluationError> {
            Ok(self.0.clone())
        }
    }

    fn graph() -> ComputationGraph<Validated> {
        ComputationGraph::new(
            "abc",
            vec![
                OpNode::new("A", "Const"),
                OpNode::new("B", "Relu").with_input("A"),
                OpNode::new("C", "Identity").with_input("B"),
            ],
        )
        .validate()
        .unwrap()
    }

    fn env<E: StrategyEvaluator>(evaluator: E) -> (tempfile::TempDir, Environment<E>) {
        let dir = tempfile::tempdir().unwrap();
        let config = EnvConfig {
            devices: vec!["dev0".into(), "dev1".into()],
            device_mems: vec![MemoryBudget::from_bytes(100); 2],
            sinks: Some(vec!["C".into()]),
            ..Default::default()
        };
        let env = Environment::from_parts(dir.path(), graph(), CostTable::new(), config, evaluator).unwrap();
        (dir, env)
    }

    fn fixed(time: u64, memory: &[u64]) -> Fixed {
        Fixed(Evaluation {
            time,
            peak_memory: memory.to_vec(),
        })
    }

    #[test]
    fn test_scales() {
        let (_dir, mut e) = env(fixed(5000, &[50, 50]));
        let table = e.index_table();
        assert_eq!(e.get_reward(&DenseStrategy::from_devices(&[0, 0, 0]), &table).unwrap(), 5.0);
        assert_eq!(e.directly_get_reward(&StrategyMap::new()).unwrap(), 0.005);
    }

    #[test]
    fn test_penalty_reapplied_on_hit() {
        let (_dir, mut e) = env(fixed(3000, &[150, 50]));
        let table = e.index_table();
        let dense = DenseStrategy::from_devices(&[0, 1, 0]);
        assert_eq!(e.get_reward(&dense, &table).unwrap(), 30.0);
        assert_eq!(e.get_reward(&dense, &table).unwrap(), 30.0);
        assert_eq!(e.stats().evaluations, 1);
        assert_eq!(e.stats().cache_hits, 1);
        assert_eq!(e.stats().penalised, 2);
    }

    #[test]
    fn test_budget_boundary_not_penalised() {
        let (_dir, mut e) = env(fixed(1000, &[100, 100]));
        assert_eq!(e.directly_get_reward(&StrategyMap::new()).unwrap(), 0.001);
    }

    #[test]
    fn test_memory_report_mismatch() {
        let (_dir, mut e) = env(fixed(1000, &[1, 2, 3]));
        let err = e.directly_get_reward(&StrategyMap::new()).unwrap_err();
        assert!(matches!(
            err,
            EnvError::Evaluation(EvaluationError::MemoryReport { expected: 2, reported: 3 })
        ));
    }

    #[test]
    fn test_translate_rejects_unknown_names() {
        let (_dir, mut e) = env(fixed(1, &[0, 0]));
        let table: IndexTable = vec!["A".to_string(), "Z".to_string()].into_iter().collect();
        let err = e.get_reward(&DenseStrategy::from_devices(&[0, 0]), &table).unwrap_err();
        assert!(matches!(
            err,
            EnvError::Evaluation(EvaluationError::Strategy(StrategyError::UnknownNode(ref n))) if n == "Z"
        ));
        assert_eq!(e.cache_len(), 0);
    }

    #[test]
    fn test_dense_longer_than_table() {
        let (_dir, mut e) = env(fixed(1, &[0, 0]));
        let table: IndexTable = vec!["A".to_string()].into_iter().collect();
        let dense = DenseStrategy::new(vec![Descriptor::Device(0), Descriptor::Device(1)]);
        let err = e.get_reward(&dense, &table).unwrap_err();
        assert!(matches!(
            err,
            EnvError::Evaluation(EvaluationError::Strategy(StrategyError::IndexOutOfRange { index: 1, len: 1 }))
        ));
    }

    #[test]
    fn test_reset_cache() {
        let (_dir, mut e) = env(fixed(1000, &[0, 0]));
        let table = e.index_table();
        e.get_reward(&DenseStrategy::from_devices(&[0, 0, 0]), &table).unwrap();
        assert_eq!(e.cache_len(), 1);
        e.reset_cache();
        assert_eq!(e.cache_len(), 0);
    }

    #[test]
    fn test_with_list_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let costs: CostTable = vec![("A".to_string(), 1000.0), ("B".to_string(), 2000.0), ("C".to_string(), 3000.0)]
            .into_iter()
            .collect();
        let config = EnvConfig {
            sinks: Some(vec!["C".into()]),
            ..Default::default()
        };
        let mut e = Environment::from_parts(dir.path(), graph(), costs, config, ListSimulator::new()).unwrap();
        let table = e.index_table();
        assert_eq!(e.get_reward(&DenseStrategy::from_devices(&[0, 0, 0]), &table).unwrap(), 6.0);
        assert!(dir.path().join(MODIFIED_STRATEGY_FILE).exists());
    }

    #[test]
    fn test_debug_summary() {
        let (_dir, e) = env(fixed(1, &[0, 0]));
        let shown = format!("{e:?}");
        assert!(shown.contains("evaluator: \"fixed\""));
        assert!(shown.contains("cache_capacity: None"));
    }

    proptest! {
        #[test]
        fn prop_cache_hit_matches_miss(devices in prop::collection::vec(0u32..2, 3)) {
            let (_dir, mut e) = env(ListSimulator::new());
            let table = e.index_table();
            let dense = DenseStrategy::from_devices(&devices);
            let miss = e.get_reward(&dense, &table).unwrap();
            let hit = e.get_reward(&dense, &table).unwrap();
            prop_assert_eq!(miss, hit);
            prop_assert_eq!(e.stats().evaluations, 1);
            prop_assert_eq!(e.stats().cache_hits, 1);
        }

        #[test]
        fn prop_penalty_survives_cache(time in 0u64..1_000_000_000, a in 0u64..200, b in 0u64..200) {
            let (_dir, mut e) = env(fixed(time, &[a, b]));
            let table = e.index_table();
            let dense = DenseStrategy::from_devices(&[0, 1, 0]);
            let miss = e.get_reward(&dense, &table).unwrap();
            let hit = e.get_reward(&dense, &table).unwrap();
            let factor = if a > 100 || b > 100 { 10.0 } else { 1.0 };
            prop_assert_eq!(miss, hit);
            prop_assert_eq!(miss, time as f64 / 1e3 * factor);
        }
    }
}
