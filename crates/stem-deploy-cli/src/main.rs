//! Stem Deploy CLI
//!
//! The `stem-deploy` command inspects and rehearses a rootchain bring-up
//! described by a TOML manifest.
//!
//! ## Commands
//!
//! - `plan`: Print the resolved deployment order
//! - `validate`: Check every initialization target against the thresholds
//! - `link`: Link one bytecode file against a JSON address table
//! - `simulate`: Run the whole bring-up against an in-memory ledger
//! - `commitment-root`: Compute a binary Merkle root from leaf hashes

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, Level};

use alloy_primitives::{hex, B256};
use stem_deploy_core::{
    binary_merkle_root, link, load_plan, AddressBook, BringUpPlan, DeploymentReport, InitValidator,
    MemoryLedger, Orchestrator, Unit,
};

#[derive(Parser)]
#[command(name = "stem-deploy")]
#[command(version = stem_deploy_core::VERSION)]
#[command(about = "Dependency-ordered Stem rootchain bring-up", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the order units will be deployed in
    Plan {
        /// Path to the deployment manifest
        manifest: PathBuf,

        /// Group units into levels that only depend on earlier levels
        #[arg(long)]
        levels: bool,
    },

    /// Validate every initialization target without deploying anything
    Validate {
        /// Path to the deployment manifest
        manifest: PathBuf,
    },

    /// Link a bytecode file against a table of deployed addresses
    Link {
        /// File containing hex creation bytecode
        bytecode: PathBuf,

        /// JSON object mapping unit names to addresses
        #[arg(short, long)]
        addresses: PathBuf,

        /// Libraries the bytecode links against
        #[arg(short, long = "depends-on")]
        depends_on: Vec<String>,

        /// Name reported in errors
        #[arg(long, default_value = "unit")]
        name: String,
    },

    /// Rehearse the full bring-up against an in-memory ledger
    Simulate {
        /// Path to the deployment manifest
        manifest: PathBuf,

        /// Write the deployment report as JSON to this path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Compute a binary keccak256 Merkle root
    CommitmentRoot {
        /// 32-byte hex leaves, in order
        leaves: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    stem_deploy_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Plan { manifest, levels } => cmd_plan(&manifest, levels),
        Commands::Validate { manifest } => cmd_validate(&manifest),
        Commands::Link {
            bytecode,
            addresses,
            depends_on,
            name,
        } => cmd_link(&bytecode, &addresses, &depends_on, &name),
        Commands::Simulate { manifest, out } => cmd_simulate(&manifest, out.as_deref()).await,
        Commands::CommitmentRoot { leaves } => cmd_commitment_root(&leaves),
    }
}

fn load(manifest: &Path) -> Result<BringUpPlan> {
    load_plan(manifest).with_context(|| format!("Failed to load manifest {:?}", manifest))
}

/// Print the resolved order, or the dependency levels
fn cmd_plan(manifest: &Path, levels: bool) -> Result<()> {
    let plan = load(manifest)?;
    let graph = plan.graph().context("Invalid link graph")?;

    if levels {
        for (i, level) in graph.levels().context("Failed to resolve order")?.iter().enumerate() {
            let names: Vec<&str> = level.iter().map(|u| u.name.as_str()).collect();
            println!("{}: {}", i, names.join(", "));
        }
    } else {
        for (i, unit) in graph.resolve_order().context("Failed to resolve order")?.iter().enumerate() {
            if unit.depends_on.is_empty() {
                println!("{:>3}. {}", i + 1, unit.name);
            } else {
                println!("{:>3}. {} <- {}", i + 1, unit.name, unit.depends_on.join(", "));
            }
        }
    }
    Ok(())
}

fn cmd_validate(manifest: &Path) -> Result<()> {
    let plan = load(manifest)?;
    if plan.init_targets.is_empty() {
        println!("No initialization targets declared.");
        return Ok(());
    }

    let validator = InitValidator::new(plan.thresholds.clone());
    for target in &plan.init_targets {
        validator
            .validate(&target.params)
            .with_context(|| format!("Initialization rejected for {}", target.unit))?;
        println!(
            "{}: ok ({} operators, value {})",
            target.unit,
            target.params.operators.len(),
            target.params.value
        );
    }
    Ok(())
}

fn cmd_link(bytecode: &Path, addresses: &Path, depends_on: &[String], name: &str) -> Result<()> {
    let code = std::fs::read_to_string(bytecode)
        .with_context(|| format!("Failed to read bytecode {:?}", bytecode))?;
    let table = std::fs::read_to_string(addresses)
        .with_context(|| format!("Failed to read address table {:?}", addresses))?;
    let book: AddressBook = serde_json::from_str(&table)
        .with_context(|| format!("Address table is not valid JSON: {:?}", addresses))?;

    let mut unit = Unit::new(name, code);
    let dependencies: Vec<Unit> = depends_on.iter().map(|d| Unit::new(d.as_str(), "")).collect();
    for dependency in &dependencies {
        unit = unit.with_dependency(dependency.name.as_str());
    }
    let refs: Vec<&Unit> = dependencies.iter().collect();

    let linked = link(&unit, &refs, &book).context("Linking failed")?;
    println!("{}", hex::encode_prefixed(&linked.bytecode));
    info!(unit = %name, digest = %linked.digest, "linked bytecode");
    Ok(())
}

async fn cmd_simulate(manifest: &Path, out: Option<&Path>) -> Result<()> {
    let plan = load(manifest)?;
    let report = simulate(&plan).await?;

    for receipt in &report.receipts {
        let marker = if receipt.initialized { " (initialized)" } else { "" };
        println!("{} -> {}{}", receipt.unit, receipt.address, marker);
    }

    if let Some(path) = out {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        println!("Report written to {:?}", path);
    }
    Ok(())
}

async fn simulate(plan: &BringUpPlan) -> Result<DeploymentReport> {
    let ledger = Arc::new(MemoryLedger::new());
    Orchestrator::new(ledger)
        .run(plan)
        .await
        .context("Simulated bring-up failed")
}

fn cmd_commitment_root(leaves: &[String]) -> Result<()> {
    println!("{}", commitment_root(leaves)?);
    Ok(())
}

fn commitment_root(leaves: &[String]) -> Result<B256> {
    let parsed = leaves
        .iter()
        .enumerate()
        .map(|(i, leaf)| {
            B256::from_str(leaf.trim()).with_context(|| format!("Leaf {} is not a 32-byte hex value", i))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(binary_merkle_root(&parsed))
}
