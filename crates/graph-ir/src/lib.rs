// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-ir
//!
//! An in-memory representation of a dataflow computation graph, as exported
//! by TensorFlow in protobuf text format (`graph.pbtxt`).
//!
//! - [`OpNode`] — one operation: name, op type, inputs and output tensor
//!   shapes.
//! - [`InputRef`] — a reference to a producer output (`name`, `name:k`) or a
//!   control dependency (`^name`).
//! - [`ComputationGraph`] — the full graph, with a **type-state pattern**
//!   (`Loaded` → `Validated`). Validated graphs are topologically ordered
//!   and every input reference is resolved to a node index.
//! - [`GraphLoader`] — reads and validates a `graph.pbtxt` file.
//! - [`tf`] — the TensorFlow `GraphDef` message types, generated from
//!   `proto/` at build time and parsed with the `protobuf` text format.
//!
//! # Example
//! ```no_run
//! use graph_ir::GraphLoader;
//! use std::path::Path;
//!
//! let graph = GraphLoader::load(Path::new("./data/graph7/graph.pbtxt")).unwrap();
//! println!("{}", graph.summary());
//! ```

mod error;
pub mod graph;
mod loader;
mod node;

/// TensorFlow framework messages (`GraphDef`, `NodeDef`, `AttrValue`, ...).
pub mod tf {
    include!(concat!(env!("OUT_DIR"), "/tf/mod.rs"));
}

pub use error::GraphError;
pub use graph::{ComputationGraph, Edge};
pub use loader::{GraphLoader, GRAPH_FILE};
pub use node::{DataType, InputRef, OpNode};
