use sqlx::PgPool;
use uuid::Uuid;

use super::ServiceResult;
use crate::database::manager::DatabaseManager;
use crate::database::models::ActivityLog;
use crate::middleware::response::PageParams;

/// Append an activity row. Failures are logged and swallowed: the audit
/// trail must never fail the mutation it describes.
pub async fn record(
    pool: &PgPool,
    tenant_id: Uuid,
    actor_id: Uuid,
    action: &str,
    resource_type: &str,
    resource_id: Uuid,
    detail: Option<serde_json::Value>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO activity_logs (tenant_id, actor_id, action, resource_type, resource_id, detail)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(tenant_id)
    .bind(actor_id)
    .bind(action)
    .bind(resource_type)
    .bind(resource_id)
    .bind(detail)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!("Failed to record activity '{}': {}", action, e);
    }
}

pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Tenant-scoped listing, newest first
    pub async fn list(
        &self,
        tenant_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<ActivityLog>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, tenant_id, actor_id, action, resource_type, resource_id, detail, created_at
            FROM activity_logs
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }
}
