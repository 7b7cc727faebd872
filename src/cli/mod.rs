pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Taskdeck CLI - operations companion for the task management API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the API server")]
    Serve,

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Backup management")]
    Backup {
        #[command(subcommand)]
        cmd: commands::backup::BackupCommands,
    },

    #[command(about = "Run a retention pass now")]
    Retention,
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve => commands::server::handle().await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Backup { cmd } => commands::backup::handle(cmd, output_format).await,
        Commands::Retention => commands::retention::handle(output_format).await,
    }
}
