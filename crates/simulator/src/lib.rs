// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # simulator
//!
//! Scoring a placement strategy.
//!
//! - [`StrategyEvaluator`] — the boundary every evaluator implements: graph,
//!   devices, strategy, sinks, bandwidth and cost table in; estimated time
//!   and per-device peak memory out.
//! - [`CostTable`] — per-op execution costs loaded from `cost.json` or
//!   `cost.bin`.
//! - [`ListSimulator`] — the reference evaluator, a list scheduler over
//!   computation and transfer tasks.
//! - [`DiagnosticReport`] — the optional JSON dump of a simulated schedule.
//!
//! # Example
//! ```no_run
//! use cluster::{Bandwidth, DeviceList};
//! use graph_ir::GraphLoader;
//! use simulator::{CostTable, EvaluationRequest, ListSimulator, StrategyEvaluator};
//! use std::path::Path;
//! use strategy::StrategyMap;
//!
//! let folder = Path::new("./data/graph1");
//! let graph = GraphLoader::load_dir(folder).unwrap();
//! let devices = DeviceList::new(&cluster::default_device_names()).unwrap();
//! let costs = CostTable::load_dir(folder).unwrap();
//! let strategy = StrategyMap::new();
//! let sinks = vec!["GradientDescent".to_string()];
//!
//! let result = ListSimulator::new()
//!     .evaluate(EvaluationRequest {
//!         graph,
//!         devices: &devices,
//!         strategy: &strategy,
//!         sinks: &sinks,
//!         bandwidth: Bandwidth::default(),
//!         cost_table: &costs,
//!         diagnostic_path: None,
//!     })
//!     .unwrap();
//! println!("{} µs, peak {:?}", result.time, result.peak_memory);
//! ```

mod cost;
mod error;
mod evaluator;
mod list;
mod trace;

pub use cost::{Cost, CostTable, COST_BIN_FILE, COST_JSON_FILE};
pub use error::{CostTableError, EvaluationError};
pub use evaluator::{Evaluation, EvaluationRequest, StrategyEvaluator};
pub use list::{ListSimulator, Schedule, TRANSFER_LATENCY_US};
pub use trace::{DiagnosticReport, TraceCategory, TraceEvent};
