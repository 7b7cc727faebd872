use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::authz::{workspace, Role};
use crate::database::models::Project;
use crate::error::ApiError;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::project_service::{ProjectService, ProjectUpdate};

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: String,
    description: Option<String>,
}

/// GET /api/v1/projects?workspace_id=... - Members of that workspace
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Page<Project>> {
    let workspace_id = workspace::extract_workspace_id(&HashMap::new(), None, &query)
        .ok_or_else(|| ApiError::bad_request("workspace_id query parameter is required"))?;

    let params = page_params(&query);
    let service = ProjectService::new().await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Member]).await?;

    let (projects, total) = service.list(ctx.tenant_id, workspace_id, &params).await?;
    Ok(ApiResponse::success(Page::new(projects, total, &params)))
}

/// POST /api/v1/projects - Workspace admins and owners; the target
/// workspace comes from the body
pub async fn create(
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<HashMap<String, String>>,
    Json(payload): Json<Value>,
) -> ApiResult<Project> {
    let workspace_id = workspace::extract_workspace_id(&HashMap::new(), Some(&payload), &query)
        .ok_or_else(|| ApiError::bad_request("workspace_id is required"))?;

    let service = ProjectService::new().await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Admin]).await?;

    let request: CreateProjectRequest = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid project payload: {}", e)))?;

    let project = service
        .create(
            ctx.tenant_id,
            ctx.user_id,
            workspace_id,
            &request.name,
            request.description.as_deref(),
        )
        .await?;

    Ok(ApiResponse::created(project))
}

/// GET /api/v1/projects/:id
pub async fn get(
    Extension(ctx): Extension<TenantContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Project> {
    let service = ProjectService::new().await?;
    let project = service.get(ctx.tenant_id, project_id).await?;
    workspace::require_membership(service.pool(), &ctx, project.workspace_id, &[Role::Member])
        .await?;

    Ok(ApiResponse::success(project))
}

/// PATCH /api/v1/projects/:id - Workspace admins and owners
pub async fn update(
    Extension(ctx): Extension<TenantContext>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<ProjectUpdate>,
) -> ApiResult<Project> {
    let service = ProjectService::new().await?;
    let project = service.get(ctx.tenant_id, project_id).await?;
    workspace::require_membership(service.pool(), &ctx, project.workspace_id, &[Role::Admin])
        .await?;

    let updated = service
        .update(ctx.tenant_id, ctx.user_id, project_id, payload)
        .await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/v1/projects/:id - Workspace admins and owners
pub async fn delete(
    Extension(ctx): Extension<TenantContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<()> {
    let service = ProjectService::new().await?;
    let project = service.get(ctx.tenant_id, project_id).await?;
    workspace::require_membership(service.pool(), &ctx, project.workspace_id, &[Role::Admin])
        .await?;

    service.delete(ctx.tenant_id, ctx.user_id, project_id).await?;
    Ok(ApiResponse::<()>::no_content())
}

fn page_params(query: &HashMap<String, String>) -> PageParams {
    PageParams {
        page: query.get("page").and_then(|v| v.parse().ok()),
        limit: query.get("limit").and_then(|v| v.parse().ok()),
    }
}
