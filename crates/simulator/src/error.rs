// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for cost tables and strategy evaluation.

use std::path::PathBuf;

/// Errors raised while loading a cost table.
#[derive(Debug, thiserror::Error)]
pub enum CostTableError {
    /// Neither `cost.json` nor `cost.bin` exists in the folder.
    #[error("no cost table found in '{folder}' (expected cost.json or cost.bin)")]
    NotFound { folder: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read cost table '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table could not be written.
    #[error("failed to write cost table '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `cost.json` is not a name → cost object.
    #[error("malformed JSON cost table '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `cost.bin` could not be decoded.
    #[error("malformed binary cost table '{path}': {source}")]
    Bincode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
}

/// Errors raised by a [`crate::StrategyEvaluator`].
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// The strategy does not fit the graph or the device list.
    #[error("strategy rejected: {0}")]
    Strategy(#[from] strategy::StrategyError),

    /// A sink names a node the graph does not contain.
    #[error("sink node '{0}' is not in the graph")]
    UnknownSink(String),

    /// The per-device memory report does not line up with the budgets.
    #[error("evaluator reported memory for {reported} devices, expected {expected}")]
    MemoryReport { expected: usize, reported: usize },

    /// The schedule could not make progress (dependency bookkeeping bug).
    #[error("schedule stalled after {finished} of {total} tasks")]
    Stalled { finished: usize, total: usize },

    /// Any other failure inside an evaluator implementation.
    #[error("evaluator '{evaluator}' failed: {detail}")]
    Backend { evaluator: String, detail: String },
}
