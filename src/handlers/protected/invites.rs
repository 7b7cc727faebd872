use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::authz::{workspace, Role};
use crate::database::models::Invite;
use crate::error::ApiError;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::invite_service::InviteService;

#[derive(Debug, Deserialize)]
struct CreateInviteRequest {
    email: String,
    role: Option<String>,
}

/// POST /api/v1/invites - Workspace admins and owners invite by email; the
/// workspace comes from the body
pub async fn create(
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<HashMap<String, String>>,
    Json(payload): Json<Value>,
) -> ApiResult<Invite> {
    let workspace_id = workspace::extract_workspace_id(&HashMap::new(), Some(&payload), &query)
        .ok_or_else(|| ApiError::bad_request("workspace_id is required"))?;

    let service = InviteService::new().await?;
    workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Admin]).await?;

    let request: CreateInviteRequest = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid invite payload: {}", e)))?;

    let invite = service
        .create(
            ctx.tenant_id,
            ctx.user_id,
            workspace_id,
            &request.email,
            request.role.as_deref().unwrap_or("member"),
        )
        .await?;

    Ok(ApiResponse::created(invite))
}

/// GET /api/v1/invites - Pending invites addressed to the caller; with
/// ?workspace_id= (admins) the invites sent for that workspace
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Page<Invite>> {
    let params = PageParams {
        page: query.get("page").and_then(|v| v.parse().ok()),
        limit: query.get("limit").and_then(|v| v.parse().ok()),
    };
    let service = InviteService::new().await?;

    if let Some(workspace_id) = workspace::extract_workspace_id(&HashMap::new(), None, &query) {
        workspace::require_membership(service.pool(), &ctx, workspace_id, &[Role::Admin])
            .await?;
        let (invites, total) = service
            .list_for_workspace(ctx.tenant_id, workspace_id, &params)
            .await?;
        return Ok(ApiResponse::success(Page::new(invites, total, &params)));
    }

    let (invites, total) = service
        .list_for_email(ctx.tenant_id, &ctx.email, &params)
        .await?;
    Ok(ApiResponse::success(Page::new(invites, total, &params)))
}

/// POST /api/v1/invites/:id/accept - Flips the invite to accepted and
/// creates the membership; the caller's email must match
pub async fn accept(
    Extension(ctx): Extension<TenantContext>,
    Path(invite_id): Path<Uuid>,
) -> ApiResult<Value> {
    let service = InviteService::new().await?;
    let (invite, member) = service
        .accept(ctx.tenant_id, invite_id, ctx.user_id, &ctx.email)
        .await?;

    Ok(ApiResponse::success(json!({
        "invite": invite,
        "membership": member,
    })))
}

/// POST /api/v1/invites/:id/decline
pub async fn decline(
    Extension(ctx): Extension<TenantContext>,
    Path(invite_id): Path<Uuid>,
) -> ApiResult<Invite> {
    let service = InviteService::new().await?;
    let invite = service
        .decline(ctx.tenant_id, invite_id, ctx.user_id, &ctx.email)
        .await?;

    Ok(ApiResponse::success(invite))
}
