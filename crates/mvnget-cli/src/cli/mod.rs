//! CLI for the mvnget repository crawler.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mvnget_core::config::{self, MvngetConfig};
use std::path::PathBuf;

use commands::{run_crawl_command, run_status};

/// Top-level CLI for mvnget.
#[derive(Debug, Parser)]
#[command(name = "mvnget")]
#[command(about = "mvnget: resumable, mirror-aware Maven repository downloader", long_about = None)]
pub struct Cli {
    /// Also print debug diagnostics (per-request failures, skipped entries) to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of ~/.config/mvnget/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Crawl a group and download its artifacts, following manifest dependencies.
    Run(RunArgs),

    /// Show completed and pending counts for an output directory.
    Status {
        /// Output directory of a previous run.
        #[arg(short, long, default_value = ".", value_name = "DIR")]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Seed group, dotted (org.springframework) or as a path (org/springframework/).
    pub group: String,

    /// Output directory; files mirror the repository layout under it.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output: PathBuf,

    /// Download workers (overrides config).
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Maximum dependency expansion depth (overrides config).
    #[arg(long, value_name = "N")]
    pub depth: Option<u32>,

    /// Skip groups, artifacts, and versions whose path contains TOKEN. Repeatable; added to config.
    #[arg(long = "exclude", value_name = "TOKEN")]
    pub exclude: Vec<String>,

    /// Ignore any pending snapshot from an interrupted run.
    #[arg(long)]
    pub fresh: bool,

    /// List what would be downloaded without downloading.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    fn load_config(&self) -> Result<MvngetConfig> {
        let cfg = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);
        Ok(cfg)
    }

    pub fn run(self) -> Result<()> {
        match &self.command {
            CliCommand::Run(args) => {
                let cfg = self.load_config()?;
                run_crawl_command(&cfg, args)?;
            }
            CliCommand::Status { output } => run_status(output)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
