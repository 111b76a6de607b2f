// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::growth_score::{self, ScoreBreakdown};

#[derive(Parser)]
#[command(name = "flowbase")]
#[command(about = "LinkedIn growth analysis API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Print the growth score breakdown of an analysis JSON file
    Score { file: PathBuf },
}

pub async fn score_file(path: &Path) -> Result<ScoreBreakdown> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let analysis: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let breakdown = growth_score::breakdown_value(&analysis);
    info!(file = %path.display(), total = breakdown.total, "Scored analysis file");
    Ok(breakdown)
}

pub async fn handle_score_command(path: &Path) -> Result<()> {
    let breakdown = score_file(path).await?;
    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}
