use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::authz::{workspace, Role};
use crate::database::models::Task;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::project_service::ProjectService;
use crate::services::task_service::{TaskCreate, TaskService, TaskUpdate};

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub project_id: Uuid,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/v1/tasks?project_id=... - Members of the project's workspace
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Page<Task>> {
    let params = PageParams { page: query.page, limit: query.limit };

    let project_service = ProjectService::new().await?;
    let project = project_service.get(ctx.tenant_id, query.project_id).await?;
    workspace::require_membership(
        project_service.pool(),
        &ctx,
        project.workspace_id,
        &[Role::Member],
    )
    .await?;

    let service = TaskService::new().await?;
    let (tasks, total) = service.list(ctx.tenant_id, query.project_id, &params).await?;
    Ok(ApiResponse::success(Page::new(tasks, total, &params)))
}

/// POST /api/v1/tasks - Any member of the project's workspace
pub async fn create(
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<TaskCreate>,
) -> ApiResult<Task> {
    let project_service = ProjectService::new().await?;
    let project = project_service.get(ctx.tenant_id, payload.project_id).await?;
    workspace::require_membership(
        project_service.pool(),
        &ctx,
        project.workspace_id,
        &[Role::Member],
    )
    .await?;

    let service = TaskService::new().await?;
    let task = service.create(ctx.tenant_id, ctx.user_id, payload).await?;
    Ok(ApiResponse::created(task))
}

/// GET /api/v1/tasks/:id
pub async fn get(
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Task> {
    let service = TaskService::new().await?;
    let workspace_id = service.workspace_id_of(ctx.tenant_id, task_id).await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Member]).await?;

    let task = service.get(ctx.tenant_id, task_id).await?;
    Ok(ApiResponse::success(task))
}

/// PATCH /api/v1/tasks/:id - Any member of the workspace
pub async fn update(
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<TaskUpdate>,
) -> ApiResult<Task> {
    let service = TaskService::new().await?;
    let workspace_id = service.workspace_id_of(ctx.tenant_id, task_id).await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Member]).await?;

    let task = service
        .update(ctx.tenant_id, ctx.user_id, task_id, payload)
        .await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/v1/tasks/:id - Workspace admins and owners
pub async fn delete(
    Extension(ctx): Extension<TenantContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<()> {
    let service = TaskService::new().await?;
    let workspace_id = service.workspace_id_of(ctx.tenant_id, task_id).await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Admin]).await?;

    service.delete(ctx.tenant_id, ctx.user_id, task_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
