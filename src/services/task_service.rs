use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::activity_service;
use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::Task;
use crate::jobs::queue::{self, Job};
use crate::middleware::response::PageParams;

pub struct TaskService {
    pool: PgPool,
}

#[derive(Debug, serde::Deserialize)]
pub struct TaskCreate {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

const TASK_STATUSES: &[&str] = &["todo", "in_progress", "done", "archived"];
const TASK_PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

impl TaskService {
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
        create: TaskCreate,
    ) -> ServiceResult<Task> {
        if create.title.trim().is_empty() {
            return Err(ServiceError::Invalid("Task title is required".into()));
        }
        let priority = create.priority.as_deref().unwrap_or("medium");
        if !TASK_PRIORITIES.contains(&priority) {
            return Err(ServiceError::Invalid(format!("Unknown priority: {}", priority)));
        }

        // The project lookup doubles as the tenant check for the new task
        let project_exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM projects WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id)
                .bind(create.project_id)
                .fetch_optional(&self.pool)
                .await?;
        if project_exists.is_none() {
            return Err(ServiceError::NotFound("Project not found".into()));
        }

        if let Some(assignee) = create.assignee_id {
            self.ensure_tenant_user(tenant_id, assignee).await?;
        }

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (tenant_id, project_id, title, description, priority,
                               assignee_id, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, tenant_id, project_id, title, description, status, priority,
                      assignee_id, due_date, created_by, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(create.project_id)
        .bind(&create.title)
        .bind(&create.description)
        .bind(priority)
        .bind(create.assignee_id)
        .bind(create.due_date)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "task.created",
            "task",
            task.id,
            None,
        )
        .await;

        if let Some(assignee) = task.assignee_id {
            queue::enqueue(Job::TaskAssigned {
                tenant_id,
                task_id: task.id,
                assignee_id: assignee,
            });
        }

        Ok(task)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<Task>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE tenant_id = $1 AND project_id = $2",
        )
        .bind(tenant_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, tenant_id, project_id, title, description, status, priority,
                   assignee_id, due_date, created_by, created_at, updated_at
            FROM tasks
            WHERE tenant_id = $1 AND project_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(project_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((tasks, total))
    }

    pub async fn get(&self, tenant_id: Uuid, task_id: Uuid) -> ServiceResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, tenant_id, project_id, title, description, status, priority,
                   assignee_id, due_date, created_by, created_at, updated_at
            FROM tasks
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Task not found".into()))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> ServiceResult<Task> {
        if let Some(status) = &update.status {
            if !TASK_STATUSES.contains(&status.as_str()) {
                return Err(ServiceError::Invalid(format!("Unknown task status: {}", status)));
            }
        }
        if let Some(priority) = &update.priority {
            if !TASK_PRIORITIES.contains(&priority.as_str()) {
                return Err(ServiceError::Invalid(format!("Unknown priority: {}", priority)));
            }
        }
        if let Some(assignee) = update.assignee_id {
            self.ensure_tenant_user(tenant_id, assignee).await?;
        }

        let previous = self.get(tenant_id, task_id).await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                assignee_id = COALESCE($7, assignee_id),
                due_date = COALESCE($8, due_date),
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, tenant_id, project_id, title, description, status, priority,
                      assignee_id, due_date, created_by, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(task_id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.status)
        .bind(update.priority)
        .bind(update.assignee_id)
        .bind(update.due_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Task not found".into()))?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "task.updated",
            "task",
            task.id,
            Some(serde_json::json!({ "status": task.status })),
        )
        .await;

        if task.assignee_id != previous.assignee_id {
            if let Some(assignee) = task.assignee_id {
                queue::enqueue(Job::TaskAssigned {
                    tenant_id,
                    task_id: task.id,
                    assignee_id: assignee,
                });
            }
        }

        Ok(task)
    }

    pub async fn delete(&self, tenant_id: Uuid, actor_id: Uuid, task_id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Task not found".into()));
        }

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "task.deleted",
            "task",
            task_id,
            None,
        )
        .await;

        Ok(())
    }

    /// Workspace a task ultimately belongs to, via its project
    pub async fn workspace_id_of(&self, tenant_id: Uuid, task_id: Uuid) -> ServiceResult<Uuid> {
        sqlx::query_scalar(
            r#"
            SELECT p.workspace_id
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.tenant_id = $1 AND t.id = $2 AND p.tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Task not found".into()))
    }

    async fn ensure_tenant_user(&self, tenant_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let exists: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM users WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if exists.is_none() {
            return Err(ServiceError::Invalid("Assignee is not a user of this tenant".into()));
        }
        Ok(())
    }
}
