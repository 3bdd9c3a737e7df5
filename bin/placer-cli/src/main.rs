// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # placer
//!
//! Command-line interface for the strategy reward environment.
//!
//! ## Usage
//! ```bash
//! # Score the best recorded strategy of a dataset
//! placer evaluate --data ./data/graph1
//!
//! # Re-score it after descriptor substitutions
//! placer modify --data ./data/graph1 --changes modify_test_config.json
//!
//! # Inspect graph, cost coverage and cluster topology
//! placer inspect --data ./data/graph1
//!
//! # Score under several bandwidth pairs in parallel
//! placer sweep --data ./data/graph1 --bandwidths 5000:1250,10000:2500
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "placer",
    about = "Scores device placement strategies for computation graphs",
    version,
    author
)]
struct Cli {
    /// Environment configuration (JSON, or TOML for *.toml). Defaults to
    /// ./config.txt when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a strategy once with the direct (uncached) reward.
    Evaluate {
        /// Dataset folder holding graph.pbtxt and the cost table.
        #[arg(short, long)]
        data: PathBuf,

        /// Strategy JSON (name → descriptor). Defaults to <data>/best_time.log.
        #[arg(short, long)]
        strategy: Option<PathBuf>,
    },

    /// Apply {old, new} substitutions to the best strategy and re-score it.
    Modify {
        /// Dataset folder.
        #[arg(short, long)]
        data: PathBuf,

        /// Modification plan. Defaults to ./modify_test_config.json.
        #[arg(long)]
        changes: Option<PathBuf>,
    },

    /// Print graph, cost-table coverage, devices, links and budgets.
    Inspect {
        /// Dataset folder.
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Score one strategy under several bandwidth pairs.
    Sweep {
        /// Dataset folder.
        #[arg(short, long)]
        data: PathBuf,

        /// Comma-separated intra:inter pairs.
        #[arg(long, default_value = "5000:1250,10000:2500,20000:5000")]
        bandwidths: String,

        /// Strategy JSON. Defaults to <data>/best_time.log.
        #[arg(short, long)]
        strategy: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = reward_env::EnvConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Evaluate { data, strategy } => commands::evaluate::execute(data, strategy, config).await,
        Commands::Modify { data, changes } => commands::modify::execute(data, changes, config).await,
        Commands::Inspect { data } => commands::inspect::execute(data, config).await,
        Commands::Sweep {
            data,
            bandwidths,
            strategy,
        } => commands::sweep::execute(data, bandwidths, strategy, config).await,
    }
}
