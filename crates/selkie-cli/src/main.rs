//! Selkie CLI
//!
//! TigerStyle: Command-line tools for Selkie with explicit error handling.
//!
//! Inspect, export, and import the persisted memory of an agent namespace.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use selkie_core::config::{SelkieConfig, ENV_AGENT_ID, ENV_PERSIST_DIR};
use selkie_core::AgentId;
use selkie_memory::{ImportMode, MemoryStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Selkie CLI
#[derive(Parser, Debug)]
#[command(name = "selkie")]
#[command(about = "Tiered agent memory: inspect, export, and import")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Agent namespace to operate on
    #[arg(short, long, env = ENV_AGENT_ID, global = true)]
    agent_id: Option<String>,

    /// Directory holding the persisted memory
    #[arg(short, long, env = ENV_PERSIST_DIR, global = true)]
    persist_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show stats and the most recent episodic records
    Inspect {
        /// How many recent records to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Output raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Dump episodic memory as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load records from a JSON dump
    Import {
        /// The dump file to read
        file: PathBuf,

        /// Append to existing records instead of replacing them
        #[arg(long)]
        merge: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    let agent_id = cli
        .agent_id
        .context("no agent id: pass --agent-id or set SELKIE_AGENT_ID")?;
    let agent_id = AgentId::new(&agent_id)
        .with_context(|| format!("invalid agent id {:?}", agent_id))?;

    let config = match cli.persist_dir {
        Some(dir) => SelkieConfig::with_persist_dir(dir),
        None => SelkieConfig::from_env(),
    };

    let store = MemoryStore::open(agent_id, config)
        .await
        .context("failed to open memory store")?;

    match cli.command {
        Commands::Inspect { limit, json } => cmd_inspect(store, limit, json).await,
        Commands::Export { output } => cmd_export(store, output).await,
        Commands::Import { file, merge } => cmd_import(store, file, merge).await,
    }
}

/// Show stats and recent records
async fn cmd_inspect(store: MemoryStore, limit: usize, json: bool) -> Result<()> {
    let stats = store.stats().await.context("failed to read stats")?;
    let export = store.export().await.context("failed to read records")?;

    if json {
        let recent: Vec<_> = export.episodic.iter().rev().take(limit).collect();
        let payload = serde_json::json!({
            "agent_id": export.agent_id,
            "stats": stats,
            "recent": recent,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{} {}", "Agent:".bold(), export.agent_id);
    println!(
        "{} {} episodic, {} semantic",
        "Durable:".bold(),
        stats.episodic_entry_count,
        stats.semantic_entry_count
    );
    println!(
        "{} {}/{} tokens ({:.0}%)",
        "Working:".bold(),
        stats.working_token_count,
        stats.working_token_budget,
        stats.working_utilization() * 100.0
    );

    if export.episodic.is_empty() {
        println!();
        println!("{}", "No episodic records.".dimmed());
        return Ok(());
    }

    println!();
    println!(
        "{:<20} {:>4}  {:<8}  {}",
        "CREATED".bold(),
        "IMP".bold(),
        "KIND".bold(),
        "CONTENT".bold()
    );
    for record in export.episodic.iter().rev().take(limit) {
        let kind = record
            .metadata
            .get("kind")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        let mut content = record.content.replace('\n', " ");
        if content.chars().count() > 72 {
            content = content.chars().take(69).collect::<String>() + "...";
        }
        println!(
            "{:<20} {:>4}  {:<8}  {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.importance.to_string().cyan(),
            kind,
            content
        );
    }
    Ok(())
}

/// Dump episodic memory as JSON
async fn cmd_export(store: MemoryStore, output: Option<PathBuf>) -> Result<()> {
    let json = store.export_json().await.context("export failed")?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "Exported to".green(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Load records from a JSON dump
async fn cmd_import(store: MemoryStore, file: PathBuf, merge: bool) -> Result<()> {
    let json = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let mode = if merge {
        ImportMode::Merge
    } else {
        ImportMode::Replace
    };
    let written = store
        .import_json(&json, mode)
        .await
        .context("import failed")?;

    println!(
        "{} {} records ({})",
        "Imported".green(),
        written,
        if merge { "merge" } else { "replace" }
    );
    Ok(())
}
