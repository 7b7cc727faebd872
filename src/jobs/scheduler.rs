//! Wall-clock job scheduler. Each job runs on its own interval in its own
//! task, catching and logging its errors; no caller exists to surface them
//! to.

use std::path::PathBuf;
use std::time::Duration;

use crate::config;
use crate::services::backup_service::BackupService;

pub fn start() {
    let jobs = &config::config().jobs;
    if !jobs.enable_scheduler {
        tracing::info!("Job scheduler disabled by configuration");
        return;
    }

    spawn_retention(jobs.retention_interval_hours);
    spawn_backup(jobs.backup_interval_hours, PathBuf::from(&jobs.backup_dir));
}

fn spawn_retention(interval_hours: u64) {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(interval_hours * 3600));
        // First tick fires immediately; skip it so startup isn't a run
        ticker.tick().await;

        loop {
            ticker.tick().await;
            crate::metrics::record_job_run();
            if let Err(e) = super::retention::run().await {
                crate::metrics::record_job_failure();
                tracing::error!("Retention job failed: {e:?}");
            }
        }
    });
}

fn spawn_backup(interval_hours: u64, dir: PathBuf) {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(interval_hours * 3600));
        ticker.tick().await;

        loop {
            ticker.tick().await;
            crate::metrics::record_job_run();
            let result = async {
                let service = BackupService::new().await?;
                service.run_backup(&dir).await
            }
            .await;

            if let Err(e) = result {
                crate::metrics::record_job_failure();
                tracing::error!("Backup job failed: {e}");
            }
        }
    });
}
