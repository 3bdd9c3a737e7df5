// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # strategy
//!
//! Placement strategies for a computation graph.
//!
//! - [`Descriptor`] / [`Form`] — one node's placement and its expansion into
//!   replica locations.
//! - [`StrategyMap`] — name-keyed strategy consumed by evaluators.
//! - [`DenseStrategy`] + [`IndexTable`] — positional strategy produced by
//!   search loops, and the table that names each position.
//! - [`StrategyKey`] — canonical, collision-free identity of a dense
//!   strategy, used as the memoization key.
//! - [`BestRecord`] / [`ModificationPlan`] — baseline strategies and
//!   `{old, new}` substitutions for what-if scoring.
//!
//! # Example
//! ```
//! use strategy::{DenseStrategy, IndexTable, Descriptor};
//!
//! let table: IndexTable = vec!["A".to_string(), "B".to_string()].into_iter().collect();
//! let map = table.translate(&DenseStrategy::from_devices(&[3, 7])).unwrap();
//! assert_eq!(map.get("B"), Some(&Descriptor::Device(7)));
//! ```

mod descriptor;
mod error;
mod key;
mod map;
mod modify;

pub use descriptor::{Descriptor, Form, Mode, MAX_REPLICAS};
pub use error::StrategyError;
pub use key::StrategyKey;
pub use map::{DenseStrategy, IndexTable, StrategyMap};
pub use modify::{BestRecord, Change, ModificationPlan, BEST_RECORD_FILE, MODIFY_CONFIG_FILE};
