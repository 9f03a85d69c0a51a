//! Deadlock Kernel v1: command-line harness.
//!
//! `analyze` prints the DetectionResult of a snapshot file as JSON,
//! `graphs` prints its RAG/WFG models, `check` replays scenario fixtures
//! twice each and compares verdicts and hashes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use deadlock_kernel::config::EngineConfig;
use deadlock_kernel::domain::{ResourceInfo, SystemSnapshot};
use deadlock_kernel::engine::DeadlockEngine;
use deadlock_kernel::fixtures::{load_fixtures, run_fixture};
use deadlock_kernel::hashing::canonical_hash;
use deadlock_kernel::state::SystemState;

#[derive(Parser)]
#[command(name = "deadlock-kernel")]
#[command(about = "Banker's-algorithm deadlock analysis", long_about = None)]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the safe-sequence enumeration cap
    #[arg(long, global = true)]
    max_sequences: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a snapshot and print the result as JSON
    Analyze {
        snapshot: PathBuf,
        /// Print only the canonical result hash
        #[arg(long)]
        hash: bool,
    },
    /// Print the RAG and WFG models of a snapshot as JSON
    Graphs { snapshot: PathBuf },
    /// Replay scenario fixtures and compare against expectations
    Check {
        #[arg(default_value = "tests/golden/scenarios.json")]
        fixtures: PathBuf,
    },
}

fn load_snapshot(path: &Path) -> Result<SystemSnapshot> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(max) = cli.max_sequences {
        config = config.with_max_safe_sequences(max);
    }
    let engine = DeadlockEngine::new(config);

    match cli.command {
        Commands::Analyze { snapshot, hash } => {
            let snap = load_snapshot(&snapshot)?;
            let result = engine.detect(&snap);
            if hash {
                println!("{}", canonical_hash(&result)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Commands::Graphs { snapshot } => {
            let snap = load_snapshot(&snapshot)?;
            let state = SystemState::from_snapshot(&snap);
            let resources: Vec<ResourceInfo> = state
                .total_instances()
                .iter()
                .enumerate()
                .map(|(r, total)| ResourceInfo {
                    name: format!("R{}", r),
                    total_instances: u32::try_from(*total).unwrap_or(u32::MAX),
                })
                .collect();
            let graphs = engine.graphs(state.process_count(), &resources, state.allocation(), state.need());
            println!("{}", serde_json::to_string_pretty(&graphs)?);
        }
        Commands::Check { fixtures } => {
            let loaded = load_fixtures(&fixtures)
                .with_context(|| format!("loading fixtures {}", fixtures.display()))?;
            info!(count = loaded.len(), path = %fixtures.display(), "loaded fixtures");

            let mut passed = 0;
            for fixture in &loaded {
                let report = run_fixture(&engine, fixture)?;
                if report.passed() {
                    passed += 1;
                    println!("[PASS] {}: hash={}", report.name, report.hash);
                } else {
                    println!("[FAIL] {}:", report.name);
                    for m in &report.mismatches {
                        println!("  {}", m);
                    }
                }
            }

            println!("\n===========================================");
            println!("Results: {}/{} passed", passed, loaded.len());
            if passed != loaded.len() {
                println!("[FAIL] Some checks failed.");
                std::process::exit(1);
            }
            println!("[OK] All scenario checks PASSED.");
        }
    }

    Ok(())
}
