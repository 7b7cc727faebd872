use sqlx::PgPool;
use uuid::Uuid;

use super::activity_service;
use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::Project;
use crate::middleware::response::PageParams;

pub struct ProjectService {
    pool: PgPool,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

const PROJECT_STATUSES: &[&str] = &["active", "paused", "archived"];

impl ProjectService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        workspace_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Project> {
        if name.trim().is_empty() {
            return Err(ServiceError::Invalid("Project name is required".into()));
        }

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (tenant_id, workspace_id, name, description, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tenant_id, workspace_id, name, description, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .bind(name)
        .bind(description)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "project.created",
            "project",
            project.id,
            None,
        )
        .await;

        Ok(project)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<Project>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE tenant_id = $1 AND workspace_id = $2",
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .fetch_one(&self.pool)
        .await?;

        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, tenant_id, workspace_id, name, description, status, created_by,
                   created_at, updated_at
            FROM projects
            WHERE tenant_id = $1 AND workspace_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((projects, total))
    }

    pub async fn get(&self, tenant_id: Uuid, project_id: Uuid) -> ServiceResult<Project> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, tenant_id, workspace_id, name, description, status, created_by,
                   created_at, updated_at
            FROM projects
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found".into()))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        project_id: Uuid,
        update: ProjectUpdate,
    ) -> ServiceResult<Project> {
        if let Some(status) = &update.status {
            if !PROJECT_STATUSES.contains(&status.as_str()) {
                return Err(ServiceError::Invalid(format!("Unknown project status: {}", status)));
            }
        }

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, tenant_id, workspace_id, name, description, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(project_id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Project not found".into()))?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "project.updated",
            "project",
            project.id,
            None,
        )
        .await;

        Ok(project)
    }

    pub async fn delete(&self, tenant_id: Uuid, actor_id: Uuid, project_id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Project not found".into()));
        }

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "project.deleted",
            "project",
            project_id,
            None,
        )
        .await;

        Ok(())
    }
}
