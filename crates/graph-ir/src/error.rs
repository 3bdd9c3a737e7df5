// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph loading and IR construction.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a computation graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The graph definition file could not be read.
    #[error("failed to read graph definition '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is not a well-formed `GraphDef` in protobuf text format.
    #[error("failed to parse GraphDef: {0}")]
    Parse(String),

    /// A node definition is missing a required field or is malformed.
    #[error("invalid node '{node}': {detail}")]
    InvalidNode { node: String, detail: String },

    /// A node consumes the output of a node that does not exist.
    #[error("node '{node}' references unknown input '{input}'")]
    UnknownInput { node: String, input: String },

    /// The graph as a whole is malformed (empty, cyclic, duplicate names).
    #[error("invalid computation graph: {0}")]
    InvalidGraph(String),
}
