use sqlx::PgPool;
use uuid::Uuid;

use super::activity_service;
use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::{Workspace, WorkspaceMember};
use crate::middleware::response::PageParams;

pub struct WorkspaceService {
    pool: PgPool,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct WorkspaceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl WorkspaceService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a workspace; the creator becomes its owner member in the same
    /// transaction.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Workspace> {
        if name.trim().is_empty() {
            return Err(ServiceError::Invalid("Workspace name is required".into()));
        }

        let mut tx = self.pool.begin().await?;

        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            INSERT INTO workspaces (tenant_id, name, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO workspace_members (tenant_id, workspace_id, user_id, role)
            VALUES ($1, $2, $3, 'owner')
            "#,
        )
        .bind(tenant_id)
        .bind(workspace.id)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "workspace.created",
            "workspace",
            workspace.id,
            None,
        )
        .await;

        Ok(workspace)
    }

    /// Workspaces the user belongs to, newest first
    pub async fn list_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<Workspace>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM workspaces w
            JOIN workspace_members m ON m.workspace_id = w.id
            WHERE w.tenant_id = $1 AND m.tenant_id = $1 AND m.user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let workspaces = sqlx::query_as::<_, Workspace>(
            r#"
            SELECT w.id, w.tenant_id, w.name, w.description, w.created_by,
                   w.created_at, w.updated_at
            FROM workspaces w
            JOIN workspace_members m ON m.workspace_id = w.id
            WHERE w.tenant_id = $1 AND m.tenant_id = $1 AND m.user_id = $2
            ORDER BY w.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((workspaces, total))
    }

    pub async fn get(&self, tenant_id: Uuid, workspace_id: Uuid) -> ServiceResult<Workspace> {
        sqlx::query_as::<_, Workspace>(
            r#"
            SELECT id, tenant_id, name, description, created_by, created_at, updated_at
            FROM workspaces
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Workspace not found".into()))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        workspace_id: Uuid,
        update: WorkspaceUpdate,
    ) -> ServiceResult<Workspace> {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            UPDATE workspaces
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, tenant_id, name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .bind(update.name)
        .bind(update.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Workspace not found".into()))?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "workspace.updated",
            "workspace",
            workspace.id,
            None,
        )
        .await;

        Ok(workspace)
    }

    /// Delete a workspace and its membership rows in one transaction
    pub async fn delete(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        workspace_id: Uuid,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM workspace_members WHERE tenant_id = $1 AND workspace_id = $2",
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM workspaces WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(workspace_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Roll back the member delete as well
            tx.rollback().await?;
            return Err(ServiceError::NotFound("Workspace not found".into()));
        }

        tx.commit().await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "workspace.deleted",
            "workspace",
            workspace_id,
            None,
        )
        .await;

        Ok(())
    }

    pub async fn members(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
    ) -> ServiceResult<Vec<WorkspaceMember>> {
        let members = sqlx::query_as::<_, WorkspaceMember>(
            r#"
            SELECT id, tenant_id, workspace_id, user_id, role, created_at
            FROM workspace_members
            WHERE tenant_id = $1 AND workspace_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Explicit member removal. The last owner of a workspace stays.
    pub async fn remove_member(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<()> {
        let member = sqlx::query_as::<_, WorkspaceMember>(
            r#"
            SELECT id, tenant_id, workspace_id, user_id, role, created_at
            FROM workspace_members
            WHERE tenant_id = $1 AND workspace_id = $2 AND user_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Membership not found".into()))?;

        if member.role == "owner" {
            let owners: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM workspace_members
                WHERE tenant_id = $1 AND workspace_id = $2 AND role = 'owner'
                "#,
            )
            .bind(tenant_id)
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await?;

            if owners <= 1 {
                return Err(ServiceError::Conflict(
                    "Cannot remove the last owner of a workspace".into(),
                ));
            }
        }

        sqlx::query("DELETE FROM workspace_members WHERE id = $1")
            .bind(member.id)
            .execute(&self.pool)
            .await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "workspace.member_removed",
            "workspace",
            workspace_id,
            Some(serde_json::json!({ "user_id": user_id })),
        )
        .await;

        Ok(())
    }

    /// Insert a membership row, used by invite acceptance. Conflict on the
    /// (workspace_id, user_id) unique constraint maps to 409.
    pub async fn add_member(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tenant_id: Uuid,
        workspace_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> ServiceResult<WorkspaceMember> {
        let member = sqlx::query_as::<_, WorkspaceMember>(
            r#"
            INSERT INTO workspace_members (tenant_id, workspace_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, workspace_id, user_id, role, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ServiceError::Conflict(
                        "User is already a member of this workspace".into(),
                    );
                }
            }
            ServiceError::from(e)
        })?;

        Ok(member)
    }
}
