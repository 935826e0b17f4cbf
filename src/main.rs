//! ttsproj - Tabletop Simulator save explorer
//!
//! Explodes a single save JSON into a project folder tree:
//! - One folder per placed object, nested for contained objects and states
//! - Scripts, UI markup and script state in their own files
//! - Bulky root settings under `core/`
//! - Optional backups of every referenced asset under `bin/`

mod application;
mod domain;
mod infrastructure;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::services::{ExportReport, ExportService};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_fetcher::HttpResourceFetcher;

#[derive(Parser)]
#[command(name = "ttsproj", about = "Tabletop Simulator save explorer", version)]
struct Cli {
    /// Configuration file (defaults to ./ttsproj.toml when present)
    #[arg(long, global = true, env = "TTSPROJ_CONFIG")]
    config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Explode a save file into a project folder
    Extract {
        /// Save JSON to read
        save: PathBuf,
        /// Project folder to write
        project: PathBuf,
        /// Download a backup of every referenced asset
        #[arg(short, long)]
        backup: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttsproj=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Extract {
            save,
            project,
            backup,
        } => {
            let fetcher = HttpResourceFetcher::new(&config.fetch.user_agent, config.fetch.chunk_size)
                .context("Failed to build HTTP client")?;
            let service =
                ExportService::new(config.layout.clone(), Arc::new(fetcher), config.fetch.delay())
                    .with_progress(!cli.no_progress);

            tracing::info!("Exporting {} to {}", save.display(), project.display());
            let report = service
                .export(&save, &project, backup)
                .await
                .with_context(|| format!("Export of {} failed", save.display()))?;

            print_summary(&report);
            if !report.flush.failures.is_empty() {
                anyhow::bail!(
                    "{} resource(s) could not be backed up",
                    report.flush.failures.len()
                );
            }
        }
    }

    Ok(())
}

fn print_summary(report: &ExportReport) {
    println!("Objects exported:  {}", report.objects);
    println!("Files written:     {}", report.flush.written);
    if !report.unknown_fields.is_empty() {
        println!("Unknown fields:    {}", report.unknown_fields.len());
        for field in &report.unknown_fields {
            println!("  {field}");
        }
    }
    if report.conflicts > 0 {
        println!("Conflicts:         {}", report.conflicts);
    }
    if report.folder_collisions > 0 {
        println!("Folder collisions: {}", report.folder_collisions);
    }
    if report.resources > 0 {
        println!(
            "Resources:         {} ({} downloaded, {} copied, {} already present, {} failed)",
            report.resources,
            report.flush.downloaded,
            report.flush.copied,
            report.flush.skipped,
            report.flush.failures.len()
        );
        for failure in &report.flush.failures {
            println!("  {} -> {}: {}", failure.url, failure.path, failure.error);
        }
    }
}
