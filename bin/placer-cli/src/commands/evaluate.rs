// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `placer evaluate` command: score one strategy with the direct reward.
//!
//! The strategy is simulated once, converted to seconds and penalised
//! ×10 000 if any device exceeds its memory budget. A diagnostic dump is
//! written to `<data>/best_strategy.json`.

use reward_env::{EnvConfig, Environment, BEST_STRATEGY_FILE};
use simulator::ListSimulator;
use std::path::PathBuf;

pub async fn execute(data: PathBuf, strategy: Option<PathBuf>, config: EnvConfig) -> anyhow::Result<()> {
    super::banner("placer · Strategy Evaluation");

    let (strategy, recorded) = super::load_strategy(&data, strategy.as_deref())?;
    let mut env = Environment::new(&data, config, ListSimulator::new())?;

    println!("  Graph:     {}", env.graph().summary());
    println!("  Devices:   {}", env.devices().len());
    println!("  Bandwidth: {}", env.bandwidth());
    println!("  Sinks:     {:?}", env.sinks());
    println!("  Placed:    {} of {} nodes", strategy.len(), env.graph().num_nodes());
    println!();

    let reward = env.directly_get_reward(&strategy)?;

    println!("  Results:");
    println!("   Reward:   {reward:.6} s");
    if let Some(time) = recorded {
        println!("   Recorded: {time}");
    }
    println!("   {}", env.stats().summary());
    println!("   Timeline: {}", data.join(BEST_STRATEGY_FILE).display());
    println!();

    Ok(())
}
