use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::authz::{self, workspace, Role};
use crate::database::models::Comment;
use crate::error::ApiError;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::comment_service::CommentService;
use crate::services::task_service::TaskService;

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub body: String,
}

/// GET /api/v1/tasks/:id/comments
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<Comment>> {
    let task_service = TaskService::new().await?;
    let workspace_id = task_service.workspace_id_of(ctx.tenant_id, task_id).await?;
    workspace::require_membership(task_service.pool(), &ctx, workspace_id, &[Role::Member])
        .await?;

    let service = CommentService::new().await?;
    let (comments, total) = service.list_for_task(ctx.tenant_id, task_id, &params).await?;
    Ok(ApiResponse::success(Page::new(comments, total, &params)))
}

/// POST /api/v1/tasks/:id/comments
pub async fn create(
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<CommentBody>,
) -> ApiResult<Comment> {
    let task_service = TaskService::new().await?;
    let workspace_id = task_service.workspace_id_of(ctx.tenant_id, task_id).await?;
    workspace::require_membership(task_service.pool(), &ctx, workspace_id, &[Role::Member])
        .await?;

    let service = CommentService::new().await?;
    let comment = service
        .create(ctx.tenant_id, ctx.user_id, task_id, &payload.body)
        .await?;
    Ok(ApiResponse::created(comment))
}

/// PATCH /api/v1/comments/:id - Author only
pub async fn update(
    Extension(ctx): Extension<TenantContext>,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<CommentBody>,
) -> ApiResult<Comment> {
    let service = CommentService::new().await?;
    let comment = service
        .update(ctx.tenant_id, ctx.user_id, comment_id, &payload.body)
        .await?;
    Ok(ApiResponse::success(comment))
}

/// DELETE /api/v1/comments/:id - Author, or a workspace admin
pub async fn delete(
    Extension(ctx): Extension<TenantContext>,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<()> {
    let service = CommentService::new().await?;
    let comment = service.get(ctx.tenant_id, comment_id).await?;

    let task_service = TaskService::new().await?;
    let workspace_id = task_service
        .workspace_id_of(ctx.tenant_id, comment.task_id)
        .await?;
    let member = workspace::require_membership(
        task_service.pool(),
        &ctx,
        workspace_id,
        &[Role::Member],
    )
    .await?;

    if comment.author_id != ctx.user_id {
        let member_role = Role::from_str(&member.role)
            .map_err(|_| ApiError::internal_server_error("Corrupt membership role"))?;
        if !authz::member_role_allows(member_role, &[Role::Admin]) {
            return Err(ApiError::forbidden("Only the author or a workspace admin can delete"));
        }
    }

    service.delete(ctx.tenant_id, ctx.user_id, comment_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
