// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # reward-env
//!
//! The reward environment ties together a graph, its cost table, a device
//! list with memory budgets, a bandwidth pair and a
//! [`simulator::StrategyEvaluator`], and turns placement strategies into
//! scalar rewards (lower is better).
//!
//! - [`Environment`] — `get_reward` (memoized, dense strategies) and
//!   `directly_get_reward` (one-off, name-keyed strategies).
//! - [`EnvConfig`] — devices, budgets, bandwidth, sinks and cache bound,
//!   from `config.txt` (JSON) or TOML.
//! - [`RewardCache`] — canonical-key memo of raw evaluations.
//! - [`RewardStats`] — evaluator calls, cache hits and penalties.
//!
//! # Example
//! ```no_run
//! use reward_env::{EnvConfig, Environment};
//! use simulator::ListSimulator;
//! use std::path::Path;
//! use strategy::DenseStrategy;
//!
//! # fn example() -> Result<(), reward_env::EnvError> {
//! let mut env = Environment::new(Path::new("./data/graph1"), EnvConfig::default(), ListSimulator::new())?;
//! let table = env.index_table();
//! let dense = DenseStrategy::from_devices(&vec![0; table.len()]);
//! println!("reward = {}", env.get_reward(&dense, &table)?);
//! println!("{}", env.stats().summary());
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod environment;
mod error;
mod metrics;

pub use cache::RewardCache;
pub use config::{EnvConfig, CONFIG_FILE, DEFAULT_DEVICE_MEM, DEFAULT_SINK};
pub use environment::{Environment, RewardScale, BEST_STRATEGY_FILE, MODIFIED_STRATEGY_FILE};
pub use error::{ConstructionError, EnvError};
pub use metrics::RewardStats;
