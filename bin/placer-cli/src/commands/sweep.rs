// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `placer sweep` command: score one strategy under several bandwidths.
//!
//! Environments are single-threaded, so every bandwidth pair gets its own
//! environment on a blocking worker and the pairs run in parallel. Each
//! worker dumps its diagnostics to `best_strategy_<intra>_<inter>.json`.
//! The command fails if any pair fails.

use cluster::Bandwidth;
use reward_env::{EnvConfig, Environment, RewardScale};
use simulator::ListSimulator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use strategy::StrategyMap;

pub async fn execute(
    data: PathBuf,
    bandwidths: String,
    strategy: Option<PathBuf>,
    config: EnvConfig,
) -> anyhow::Result<()> {
    super::banner("placer · Bandwidth Sweep");

    let pairs = parse_pairs(&bandwidths)?;
    let (strategy, _) = super::load_strategy(&data, strategy.as_deref())?;

    println!("  Dataset:  {}", data.display());
    println!("  Pairs:    {}", pairs.len());
    println!();

    let strategy = Arc::new(strategy);
    let data = Arc::new(data);
    let mut handles = Vec::with_capacity(pairs.len());
    for bandwidth in pairs {
        let config = EnvConfig {
            bandwidth: Some(bandwidth),
            ..config.clone()
        };
        let strategy = Arc::clone(&strategy);
        let data = Arc::clone(&data);
        let handle = tokio::task::spawn_blocking(move || run_single(&data, config, &strategy, bandwidth));
        handles.push((bandwidth, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (bandwidth, handle) in handles {
        outcomes.push((bandwidth, handle.await?));
    }
    let results = report(outcomes)?;

    if let Some(best) = results.iter().min_by(|a, b| a.reward.total_cmp(&b.reward)) {
        println!("  Best: {} ({:.6} s)", best.bandwidth, best.reward);
        println!();
    }

    Ok(())
}

#[derive(Debug)]
struct SweepResult {
    bandwidth: Bandwidth,
    reward: f64,
    wall_ms: f64,
}

/// Parses `intra:inter` pairs, dropping repeats so that no two workers
/// share a diagnostics file.
fn parse_pairs(list: &str) -> anyhow::Result<Vec<Bandwidth>> {
    let mut pairs: Vec<Bandwidth> = Vec::new();
    for s in list.split(',').map(str::trim) {
        let pair = Bandwidth::parse_pair(s).map_err(|e| anyhow::anyhow!("invalid bandwidth pair '{s}': {e}"))?;
        if pairs.contains(&pair) {
            tracing::warn!(%pair, "duplicate bandwidth pair skipped");
        } else {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

/// Diagnostics file for one sweep point.
fn diagnostic_file(bandwidth: Bandwidth) -> String {
    format!("best_strategy_{}_{}.json", bandwidth.intra, bandwidth.inter)
}

/// Prints the results table and returns the successful points, or the
/// first failure once every row has been printed.
fn report(outcomes: Vec<(Bandwidth, anyhow::Result<SweepResult>)>) -> anyhow::Result<Vec<SweepResult>> {
    println!("  {:<24} {:>14} {:>12}", "Bandwidth", "Reward (s)", "Wall (ms)");
    println!("  {}", "-".repeat(52));

    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_failure = None;
    for (bandwidth, outcome) in outcomes {
        match outcome {
            Ok(r) => {
                println!("  {:<24} {:>14.6} {:>12.2}", r.bandwidth.to_string(), r.reward, r.wall_ms);
                results.push(r);
            }
            Err(e) => {
                println!("  {:<24} FAILED: {e}", bandwidth.to_string());
                first_failure.get_or_insert((bandwidth, e));
            }
        }
    }
    println!();

    match first_failure {
        Some((bandwidth, e)) => Err(e.context(format!("sweep point {bandwidth} failed"))),
        None => Ok(results),
    }
}

/// Builds an environment for one bandwidth pair and scores the strategy.
fn run_single(
    data: &Path,
    config: EnvConfig,
    strategy: &StrategyMap,
    bandwidth: Bandwidth,
) -> anyhow::Result<SweepResult> {
    let started = Instant::now();
    let mut env = Environment::new(data, config, ListSimulator::new())?;
    let raw = env.evaluate(strategy, bandwidth, &diagnostic_file(bandwidth))?;
    let reward = env.score(&raw, RewardScale::DIRECT);
    tracing::info!(%bandwidth, reward, "sweep point scored");
    Ok(SweepResult {
        bandwidth,
        reward,
        wall_ms: started.elapsed().as_secs_f64() * 1000.0,
    })
}
