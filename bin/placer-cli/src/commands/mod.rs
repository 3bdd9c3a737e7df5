// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod evaluate;
pub mod inspect;
pub mod modify;
pub mod sweep;

use std::path::Path;
use strategy::{BestRecord, StrategyMap};
use tracing_subscriber::EnvFilter;

/// Installs the log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Prints a boxed command title.
pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", title);
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}

/// The strategy to score: `path` when given, else the dataset's best
/// record. Returns the recorded time alongside when there is one.
pub fn load_strategy(data: &Path, path: Option<&Path>) -> anyhow::Result<(StrategyMap, Option<f64>)> {
    match path {
        Some(p) => {
            let strategy = StrategyMap::from_file(p)
                .map_err(|e| anyhow::anyhow!("cannot load strategy '{}': {e}", p.display()))?;
            Ok((strategy, None))
        }
        None => {
            let record = BestRecord::from_dir(data)
                .map_err(|e| anyhow::anyhow!("cannot load best strategy record: {e}"))?;
            Ok((record.strategy, Some(record.time)))
        }
    }
}
