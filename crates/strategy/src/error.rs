// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for strategy handling.

use std::path::PathBuf;

/// Errors raised while reading, translating or validating strategies.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// A descriptor does not fit the device list.
    #[error("invalid descriptor for '{node}': {detail}")]
    InvalidDescriptor { node: String, detail: String },

    /// A dense strategy position has no entry in the index table.
    #[error("strategy position {index} has no node in the index table ({len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A strategy names a node the graph does not contain.
    #[error("strategy references unknown node '{0}'")]
    UnknownNode(String),

    /// A strategy-related file could not be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A strategy-related file is not valid JSON of the expected shape.
    #[error("malformed JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StrategyError {
    pub(crate) fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &std::path::Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}
