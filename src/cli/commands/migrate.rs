use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;

pub async fn handle(format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::run_migrations().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "migrated": true })),
        OutputFormat::Text => println!("Migrations applied"),
    }
    Ok(())
}
