use crate::cli::OutputFormat;

pub async fn handle(format: OutputFormat) -> anyhow::Result<()> {
    let report = crate::jobs::retention::run().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("Retention pass complete:");
            println!("  activity logs pruned:   {}", report.activity_logs_pruned);
            println!("  invites pruned:         {}", report.invites_pruned);
            println!("  refresh tokens pruned:  {}", report.refresh_tokens_pruned);
        }
    }
    Ok(())
}
