// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the reward environment.

use simulator::EvaluationError;
use std::path::PathBuf;

/// Failures while setting up an [`crate::Environment`]. All are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The graph definition is missing, unreadable or malformed.
    #[error("graph: {0}")]
    Graph(#[from] graph_ir::GraphError),

    /// The cost table is missing or unreadable.
    #[error("cost table: {0}")]
    CostTable(#[from] simulator::CostTableError),

    /// Devices, budgets or bandwidth are invalid.
    #[error("cluster: {0}")]
    Cluster(#[from] cluster::ClusterError),

    /// The configuration file could not be read.
    #[error("cannot read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed or is inconsistent.
    #[error("configuration: {0}")]
    Config(String),
}

/// Errors surfaced by the reward environment.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// The environment could not be built.
    #[error("environment construction failed: {0}")]
    Construction(#[from] ConstructionError),

    /// The evaluator rejected the strategy or failed.
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
}

impl From<strategy::StrategyError> for EnvError {
    fn from(e: strategy::StrategyError) -> Self {
        Self::Evaluation(EvaluationError::Strategy(e))
    }
}

impl From<cluster::ClusterError> for EnvError {
    fn from(e: cluster::ClusterError) -> Self {
        Self::Construction(ConstructionError::Cluster(e))
    }
}
