#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_api=info,tower_http=info".into()),
        )
        .init();

    let config = taskdeck_api::config::config();
    tracing::info!("Starting taskdeck-api in {:?} mode", config.environment);

    taskdeck_api::jobs::queue::start();
    taskdeck_api::jobs::scheduler::start();

    taskdeck_api::server::serve().await
}
