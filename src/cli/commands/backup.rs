use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::services::backup_service::{self, BackupService};

#[derive(Subcommand)]
pub enum BackupCommands {
    #[command(about = "Run a backup now")]
    Run {
        #[arg(long, help = "Directory for backup artifacts (defaults to configured dir)")]
        dir: Option<PathBuf>,
    },

    #[command(about = "Verify a backup against its manifest checksum")]
    Verify {
        #[arg(help = "Manifest path; defaults to the newest manifest in the backup dir")]
        manifest: Option<PathBuf>,
    },

    #[command(about = "Validate a backup and report the restore plan")]
    Restore {
        #[arg(help = "Manifest path; defaults to the newest manifest in the backup dir")]
        manifest: Option<PathBuf>,
    },
}

pub async fn handle(cmd: BackupCommands, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        BackupCommands::Run { dir } => {
            let dir = dir.unwrap_or_else(default_dir);
            let service = BackupService::new().await?;
            let manifest = service.run_backup(&dir).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
                OutputFormat::Text => {
                    println!("Backup written: {}", manifest.artifact);
                    println!("Checksum: {}", manifest.checksum);
                }
            }
        }
        BackupCommands::Verify { manifest } => {
            let path = resolve_manifest(manifest).await?;
            let manifest = backup_service::verify_backup(&path).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
                OutputFormat::Text => println!("Backup OK: {}", manifest.artifact),
            }
        }
        BackupCommands::Restore { manifest } => {
            let path = resolve_manifest(manifest).await?;
            let plan = backup_service::restore_backup(&path).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Text => {
                    println!("Restore plan for {} ({} rows):", plan.artifact, plan.total_rows);
                    for (table, rows) in &plan.tables {
                        println!("  {:<20} {}", table, rows);
                    }
                }
            }
        }
    }
    Ok(())
}

fn default_dir() -> PathBuf {
    PathBuf::from(&crate::config::config().jobs.backup_dir)
}

async fn resolve_manifest(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    backup_service::latest_manifest(&default_dir())
        .await?
        .ok_or_else(|| anyhow::anyhow!("no backup manifests found in {:?}", default_dir()))
}
