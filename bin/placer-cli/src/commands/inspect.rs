// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `placer inspect` command: display a dataset and the cluster it runs on.

use cluster::{DeviceList, LinkTopology};
use graph_ir::GraphLoader;
use reward_env::EnvConfig;
use simulator::CostTable;
use std::path::PathBuf;

pub async fn execute(data: PathBuf, config: EnvConfig) -> anyhow::Result<()> {
    super::banner("placer · Dataset Inspector");

    let graph = GraphLoader::load_dir(&data)
        .map_err(|e| anyhow::anyhow!("failed to load graph from '{}': {e}", data.display()))?;
    let costs = CostTable::load_dir(&data)?;
    let devices: DeviceList = config.validate()?;
    let bandwidth = config.resolve_bandwidth();
    let topology = LinkTopology::new(&devices, bandwidth);

    // ── Graph ──────────────────────────────────────────────────
    println!("  Graph: {}", graph.summary());
    println!();
    println!("  {:<28} {:>8}", "Op", "Count");
    println!("  {}", "-".repeat(38));
    let mut ops: Vec<_> = graph.op_histogram().into_iter().collect();
    ops.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (op, count) in ops.iter().take(15) {
        println!("  {:<28} {:>8}", truncate(op, 28), count);
    }
    if ops.len() > 15 {
        println!("  … {} more op types", ops.len() - 15);
    }
    println!();

    // ── Cost coverage ──────────────────────────────────────────
    let covered = graph
        .iter_nodes()
        .filter(|n| costs.contains(&n.name) || costs.contains(&n.op))
        .count();
    println!(
        "  Cost table: {} entries, {} of {} nodes covered ({:.0}%)",
        costs.len(),
        covered,
        graph.num_nodes(),
        covered as f64 * 100.0 / graph.num_nodes().max(1) as f64,
    );
    let sinks = config.sinks_for(&data);
    let missing: Vec<&String> = sinks.iter().filter(|s| !graph.contains(s)).collect();
    println!("  Sinks:      {:?}", sinks);
    if !missing.is_empty() {
        println!("  WARNING: sinks not in graph: {:?}", missing);
    }
    println!();

    // ── Cluster ────────────────────────────────────────────────
    println!("  {:<4} {:<48} {:>6} {:>12}", "Idx", "Device", "Task", "Budget");
    println!("  {}", "-".repeat(74));
    for (i, (device, budget)) in devices.iter().zip(&config.device_mems).enumerate() {
        println!(
            "  {:<4} {:<48} {:>6} {:>12}",
            i,
            truncate(device.as_str(), 48),
            devices.task_of(i).unwrap_or_default(),
            budget.to_string(),
        );
    }
    println!();
    println!("  Bandwidth: {bandwidth}");
    println!("  Links:     {}", topology.num_links());
    for (i, link) in topology.links().iter().enumerate() {
        println!(
            "   #{i:<3} {:?} {} → {} @ {}",
            link.kind, link.from, link.to, link.bandwidth
        );
    }
    println!();

    Ok(())
}

/// Truncates a string to `max_len` with ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}
