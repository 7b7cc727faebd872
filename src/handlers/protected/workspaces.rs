use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::authz::{workspace, Role};
use crate::database::models::{Workspace, WorkspaceMember};
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::workspace_service::{WorkspaceService, WorkspaceUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub description: Option<String>,
}

/// GET /api/v1/workspaces - Workspaces the caller belongs to
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<Workspace>> {
    let service = WorkspaceService::new().await?;
    let (workspaces, total) = service
        .list_for_user(ctx.tenant_id, ctx.user_id, &params)
        .await?;

    Ok(ApiResponse::success(Page::new(workspaces, total, &params)))
}

/// POST /api/v1/workspaces - Creator becomes the workspace owner
pub async fn create(
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> ApiResult<Workspace> {
    let service = WorkspaceService::new().await?;
    let workspace = service
        .create(
            ctx.tenant_id,
            ctx.user_id,
            &payload.name,
            payload.description.as_deref(),
        )
        .await?;

    Ok(ApiResponse::created(workspace))
}

/// GET /api/v1/workspaces/:id - Members only
pub async fn get(
    Extension(ctx): Extension<TenantContext>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Workspace> {
    let service = WorkspaceService::new().await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Member]).await?;

    let ws = service.get(ctx.tenant_id, workspace_id).await?;
    Ok(ApiResponse::success(ws))
}

/// PATCH /api/v1/workspaces/:id - Workspace admins and owners
pub async fn update(
    Extension(ctx): Extension<TenantContext>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<WorkspaceUpdate>,
) -> ApiResult<Workspace> {
    let service = WorkspaceService::new().await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Admin]).await?;

    let ws = service
        .update(ctx.tenant_id, ctx.user_id, workspace_id, payload)
        .await?;
    Ok(ApiResponse::success(ws))
}

/// DELETE /api/v1/workspaces/:id - Owner only; removes membership rows in
/// the same transaction
pub async fn delete(
    Extension(ctx): Extension<TenantContext>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<()> {
    let service = WorkspaceService::new().await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Owner]).await?;

    service.delete(ctx.tenant_id, ctx.user_id, workspace_id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// GET /api/v1/workspaces/:id/members - Members only
pub async fn members(
    Extension(ctx): Extension<TenantContext>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Vec<WorkspaceMember>> {
    let service = WorkspaceService::new().await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Member]).await?;

    let members = service.members(ctx.tenant_id, workspace_id).await?;
    Ok(ApiResponse::success(members))
}

/// DELETE /api/v1/workspaces/:id/members/:user_id - Admins and owners, or
/// a member removing themselves
pub async fn remove_member(
    Extension(ctx): Extension<TenantContext>,
    Path((workspace_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let service = WorkspaceService::new().await?;
    let required: &[Role] =
        if ctx.user_id == user_id { &[Role::Member] } else { &[Role::Admin] };
    workspace::require_membership(service.pool(), &ctx, workspace_id, required).await?;

    service
        .remove_member(ctx.tenant_id, ctx.user_id, workspace_id, user_id)
        .await?;
    Ok(ApiResponse::<()>::no_content())
}
