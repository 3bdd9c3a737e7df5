// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`StrategyEvaluator`] trait: the single call a reward environment
//! makes to score a strategy.

use crate::{CostTable, EvaluationError};
use cluster::{Bandwidth, DeviceList};
use graph_ir::{graph::Validated, ComputationGraph};
use std::path::Path;
use strategy::StrategyMap;

/// Everything an evaluator needs for one call.
///
/// The graph is passed **by value**: it is a disposable copy the evaluator
/// may annotate or rewrite freely. Everything else is borrowed read-only.
#[derive(Debug)]
pub struct EvaluationRequest<'a> {
    pub graph: ComputationGraph<Validated>,
    pub devices: &'a DeviceList,
    pub strategy: &'a StrategyMap,
    /// Synchronisation nodes that terminate cost accounting.
    pub sinks: &'a [String],
    pub bandwidth: Bandwidth,
    pub cost_table: &'a CostTable,
    /// Where to write a diagnostic dump, if anywhere.
    pub diagnostic_path: Option<&'a Path>,
}

/// Raw evaluator output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Evaluation {
    /// Estimated execution time in microseconds.
    pub time: u64,
    /// Peak memory per device in bytes, aligned with the device list.
    pub peak_memory: Vec<u64>,
}

/// Scores a strategy: estimated time plus per-device peak memory.
///
/// Implementations must be deterministic for identical requests; callers
/// memoize on that assumption. Side effects are limited to the optional
/// diagnostic dump.
pub trait StrategyEvaluator: Send + Sync {
    /// Human-readable name of this evaluator.
    fn name(&self) -> &str;

    /// Evaluates one strategy.
    fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<Evaluation, EvaluationError>;
}

impl<E: StrategyEvaluator + ?Sized> StrategyEvaluator for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<Evaluation, EvaluationError> {
        (**self).evaluate(request)
    }
}

impl<E: StrategyEvaluator + ?Sized> StrategyEvaluator for std::sync::Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<Evaluation, EvaluationError> {
        (**self).evaluate(request)
    }
}
