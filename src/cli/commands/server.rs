pub async fn handle() -> anyhow::Result<()> {
    let config = crate::config::config();
    tracing::info!("Starting taskdeck-api in {:?} mode", config.environment);

    crate::jobs::queue::start();
    crate::jobs::scheduler::start();

    crate::server::serve().await
}
