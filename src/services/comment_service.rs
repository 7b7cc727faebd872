use sqlx::PgPool;
use uuid::Uuid;

use super::activity_service;
use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::Comment;
use crate::middleware::response::PageParams;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
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
        task_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment> {
        if body.trim().is_empty() {
            return Err(ServiceError::Invalid("Comment body is required".into()));
        }

        let task_exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM tasks WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id)
                .bind(task_id)
                .fetch_optional(&self.pool)
                .await?;
        if task_exists.is_none() {
            return Err(ServiceError::NotFound("Task not found".into()));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (tenant_id, task_id, author_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, task_id, author_id, body, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(task_id)
        .bind(actor_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "comment.created",
            "comment",
            comment.id,
            Some(serde_json::json!({ "task_id": task_id })),
        )
        .await;

        Ok(comment)
    }

    pub async fn list_for_task(
        &self,
        tenant_id: Uuid,
        task_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<Comment>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE tenant_id = $1 AND task_id = $2",
        )
        .bind(tenant_id)
        .bind(task_id)
        .fetch_one(&self.pool)
        .await?;

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, tenant_id, task_id, author_id, body, created_at, updated_at
            FROM comments
            WHERE tenant_id = $1 AND task_id = $2
            ORDER BY created_at ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(task_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((comments, total))
    }

    pub async fn get(&self, tenant_id: Uuid, comment_id: Uuid) -> ServiceResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, tenant_id, task_id, author_id, body, created_at, updated_at
            FROM comments
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Comment not found".into()))
    }

    /// Only the author may edit their comment
    pub async fn update(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        comment_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment> {
        if body.trim().is_empty() {
            return Err(ServiceError::Invalid("Comment body is required".into()));
        }

        let existing = self.get(tenant_id, comment_id).await?;
        if existing.author_id != actor_id {
            return Err(ServiceError::Forbidden("Only the author can edit a comment".into()));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments SET body = $3, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, tenant_id, task_id, author_id, body, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(comment_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Author or a workspace admin (checked at the route) may delete
    pub async fn delete(&self, tenant_id: Uuid, actor_id: Uuid, comment_id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Comment not found".into()));
        }

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "comment.deleted",
            "comment",
            comment_id,
            None,
        )
        .await;

        Ok(())
    }
}
