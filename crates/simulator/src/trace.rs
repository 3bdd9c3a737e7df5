// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Diagnostic dumps of a simulated schedule.
//!
//! A [`DiagnosticReport`] records the strategy that was scored, the
//! resulting makespan and peak memory, and one [`TraceEvent`] per task that
//! occupied a device or link. Writing it is best-effort: failures are
//! logged and never affect the evaluation result.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use strategy::StrategyMap;

/// What a timeline entry occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceCategory {
    Computation,
    Transfer,
}

/// One busy interval on a device or link.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TraceEvent {
    /// Node name (computation) or `producer->consumer` (transfer).
    pub name: String,
    pub category: TraceCategory,
    /// Device index (computation) or link index (transfer).
    pub lane: usize,
    /// Start time in microseconds.
    pub start: u64,
    /// End time in microseconds.
    pub end: u64,
}

/// The full diagnostic dump.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiagnosticReport<'a> {
    pub strategy: &'a StrategyMap,
    pub makespan: u64,
    pub peak_memory: &'a [u64],
    pub timeline: &'a [TraceEvent],
}

impl DiagnosticReport<'_> {
    /// Writes the report as pretty JSON to `path`.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()
    }

    /// Writes the report, logging instead of failing.
    pub fn write_best_effort(&self, path: &Path) {
        match self.write_to(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "diagnostic report written"),
            Err(e) => tracing::warn!(path = %path.display(), "failed to write diagnostic report: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strategy::Descriptor;

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modified_strategy.json");
        let mut map = StrategyMap::new();
        map.insert("a", Descriptor::Device(1));
        let timeline = vec![TraceEvent {
            name: "a".into(),
            category: TraceCategory::Computation,
            lane: 1,
            start: 0,
            end: 10,
        }];
        let report = DiagnosticReport {
            strategy: &map,
            makespan: 10,
            peak_memory: &[0, 4],
            timeline: &timeline,
        };
        report.write_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["makespan"], 10);
        assert_eq!(value["strategy"]["a"], 1);
        assert_eq!(value["timeline"][0]["category"], "computation");
    }

    #[test]
    fn test_best_effort_ignores_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let map = StrategyMap::new();
        let report = DiagnosticReport {
            strategy: &map,
            makespan: 0,
            peak_memory: &[],
            timeline: &[],
        };
        report.write_best_effort(&dir.path().join("missing").join("out.json"));
    }
}
