use sqlx::PgPool;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::Tenant;
use crate::middleware::response::PageParams;

/// Cross-tenant administration. This is the only service that queries
/// without a tenant_id predicate; its routes are gated to admin roles.
pub struct TenantService {
    pool: PgPool,
}

#[derive(Debug, serde::Serialize)]
pub struct TenantStats {
    pub users: i64,
    pub workspaces: i64,
    pub projects: i64,
    pub tasks: i64,
}

impl TenantService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list(&self, params: &PageParams) -> ServiceResult<(Vec<Tenant>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, created_at, updated_at, deleted_at
            FROM tenants
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((tenants, total))
    }

    pub async fn get(&self, tenant_id: Uuid) -> ServiceResult<Tenant> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, created_at, updated_at, deleted_at
            FROM tenants
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Tenant not found".into()))
    }

    /// Soft delete. Row data is retained for the retention window; cascades
    /// are left to the hard-delete path in retention.
    pub async fn delete(&self, tenant_id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query(
            "UPDATE tenants SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Tenant not found".into()));
        }
        Ok(())
    }

    pub async fn stats(&self, tenant_id: Uuid) -> ServiceResult<TenantStats> {
        // Confirm existence first so a bad id is a 404, not zeroed stats
        self.get(tenant_id).await?;

        let users: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE tenant_id = $1 AND deleted_at IS NULL",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        let workspaces: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM workspaces WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;
        let projects: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;
        let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(TenantStats { users, workspaces, projects, tasks })
    }
}
