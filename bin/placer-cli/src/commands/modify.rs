// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `placer modify` command: what-if scoring of descriptor substitutions.
//!
//! ```text
//! best_time.log ──directly_get_reward──▶ before
//!      │
//!      └─ apply {old, new} changes ─▶ dense form ──get_reward──▶ after
//! ```

use reward_env::{EnvConfig, Environment};
use simulator::ListSimulator;
use std::path::PathBuf;
use strategy::{ModificationPlan, MODIFY_CONFIG_FILE};

pub async fn execute(data: PathBuf, changes: Option<PathBuf>, config: EnvConfig) -> anyhow::Result<()> {
    super::banner("placer · Strategy Modification");

    let plan_path = changes.unwrap_or_else(|| PathBuf::from(MODIFY_CONFIG_FILE));
    let plan = ModificationPlan::from_file(&plan_path)
        .map_err(|e| anyhow::anyhow!("cannot load modification plan: {e}"))?;
    let (baseline, recorded) = super::load_strategy(&data, None)?;
    let mut env = Environment::new(&data, config, ListSimulator::new())?;

    println!("  Plan:     {} ({} changes)", plan_path.display(), plan.changes.len());
    for change in &plan.changes {
        println!("   {} → {}", change.old, change.new);
    }
    println!();

    let before = env.directly_get_reward(&baseline)?;

    let (modified, replaced) = plan.apply(&baseline);
    let table = env.index_table();
    let dense = modified.to_dense(&table);
    let after = env.get_reward(&dense, &table)?;

    println!("  Results:");
    if let Some(time) = recorded {
        println!("   Recorded time:   {time}");
    }
    println!("   Before (direct): {before:.6} s");
    println!("   After (search):  {after:.3} ms  ({replaced} descriptors replaced)");
    println!("   {}", env.stats().summary());
    println!();

    Ok(())
}
