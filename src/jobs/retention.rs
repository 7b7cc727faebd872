//! Retention pruning: expired invites, dead refresh tokens, and activity
//! logs past the configured window. Operates on append-only or time-bounded
//! data, so it runs without coordination against request traffic.

use chrono::{Duration, Utc};

use crate::config;
use crate::database::manager::DatabaseManager;

#[derive(Debug, serde::Serialize)]
pub struct RetentionReport {
    pub activity_logs_pruned: u64,
    pub invites_pruned: u64,
    pub refresh_tokens_pruned: u64,
}

pub async fn run() -> anyhow::Result<RetentionReport> {
    let pool = DatabaseManager::pool().await?;
    let now = Utc::now();
    let activity_cutoff =
        now - Duration::days(config::config().jobs.activity_retention_days);

    let activity = sqlx::query("DELETE FROM activity_logs WHERE created_at < $1")
        .bind(activity_cutoff)
        .execute(&pool)
        .await?;

    // Only pending invites expire; accepted/declined rows are history
    let invites =
        sqlx::query("DELETE FROM invites WHERE status = 'pending' AND expires_at < $1")
            .bind(now)
            .execute(&pool)
            .await?;

    let tokens = sqlx::query(
        "DELETE FROM refresh_tokens WHERE expires_at < $1 OR revoked_at IS NOT NULL",
    )
    .bind(now)
    .execute(&pool)
    .await?;

    let report = RetentionReport {
        activity_logs_pruned: activity.rows_affected(),
        invites_pruned: invites.rows_affected(),
        refresh_tokens_pruned: tokens.rows_affected(),
    };

    tracing::info!(
        "Retention pass: {} activity rows, {} invites, {} refresh tokens",
        report.activity_logs_pruned,
        report.invites_pruned,
        report.refresh_tokens_pruned
    );
    Ok(report)
}
