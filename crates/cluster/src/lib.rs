// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # cluster
//!
//! Static description of the machines a graph is placed on.
//!
//! - [`DeviceList`] — ordered device addresses grouped into tasks (hosts).
//! - [`MemoryBudget`] — per-device capacity with human-readable parsing
//!   (`"16G"`, `1.6e11`).
//! - [`Bandwidth`] — the (intra, inter) throughput pair, defaulting to
//!   5000 / 1250.
//! - [`LinkTopology`] — dedicated intra-task links and shared inter-task
//!   links derived from the two above.
//!
//! # Example
//! ```
//! use cluster::{Bandwidth, DeviceList, LinkTopology};
//!
//! let devices = DeviceList::new(&cluster::default_device_names()).unwrap();
//! let topo = LinkTopology::new(&devices, Bandwidth::resolve(None));
//! assert_eq!(devices.num_tasks(), 2);
//! assert!(topo.link_between(0, 3).is_some());
//! ```

mod bandwidth;
mod budget;
mod device;
mod error;

pub use bandwidth::{
    Bandwidth, Link, LinkKind, LinkTopology, DEFAULT_INTER_BANDWIDTH, DEFAULT_INTRA_BANDWIDTH,
};
pub use budget::MemoryBudget;
pub use device::{default_device_names, DeviceAddress, DeviceList};
pub use error::ClusterError;
