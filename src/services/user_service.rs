use sqlx::PgPool;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::middleware::response::PageParams;

pub struct UserService {
    pool: PgPool,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub role: Option<String>,
}

impl UserService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list(&self, tenant_id: Uuid, params: &PageParams) -> ServiceResult<(Vec<User>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE tenant_id = $1 AND deleted_at IS NULL",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, email, password_hash, display_name, role,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE tenant_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    pub async fn get(&self, tenant_id: Uuid, user_id: Uuid) -> ServiceResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, email, password_hash, display_name, role,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        update: UserUpdate,
    ) -> ServiceResult<User> {
        if let Some(role) = &update.role {
            role.parse::<crate::authz::Role>()
                .map_err(|e| ServiceError::Invalid(e))?;
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET display_name = COALESCE($3, display_name),
                role = COALESCE($4, role),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL
            RETURNING id, tenant_id, email, password_hash, display_name, role,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(update.display_name)
        .bind(update.role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))?;

        Ok(user)
    }

    /// Soft delete; the last owner of a tenant cannot be removed
    pub async fn delete(&self, tenant_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let target = self.get(tenant_id, user_id).await?;

        if target.role == "owner" {
            let owners: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM users
                WHERE tenant_id = $1 AND role = 'owner' AND deleted_at IS NULL
                "#,
            )
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

            if owners <= 1 {
                return Err(ServiceError::Conflict(
                    "Cannot remove the last owner of a tenant".into(),
                ));
            }
        }

        sqlx::query(
            "UPDATE users SET deleted_at = now() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
