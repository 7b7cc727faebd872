use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use uuid::Uuid;

use crate::authz::{self, Role};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::user_service::{UserService, UserUpdate};

/// GET /api/v1/users - List users in the caller's tenant
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<User>> {
    let service = UserService::new().await?;
    let (users, total) = service.list(ctx.tenant_id, &params).await?;

    Ok(ApiResponse::success(Page::new(users, total, &params)))
}

/// GET /api/v1/users/:id
pub async fn get(
    Extension(ctx): Extension<TenantContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<User> {
    let service = UserService::new().await?;
    let user = service.get(ctx.tenant_id, user_id).await?;

    Ok(ApiResponse::success(user))
}

/// PATCH /api/v1/users/:id - Self-service profile edits; role changes are
/// admin-only
pub async fn update(
    Extension(ctx): Extension<TenantContext>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserUpdate>,
) -> ApiResult<User> {
    let changing_role = payload.role.is_some();
    if ctx.user_id != user_id || changing_role {
        authz::require_roles(&ctx, &[Role::Admin, Role::Owner])?;
    }

    let service = UserService::new().await?;
    let user = service.update(ctx.tenant_id, user_id, payload).await?;

    Ok(ApiResponse::success(user))
}

/// DELETE /api/v1/users/:id - Admin-only removal
pub async fn delete(
    Extension(ctx): Extension<TenantContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<()> {
    authz::require_roles(&ctx, &[Role::Admin, Role::Owner])?;

    if ctx.user_id == user_id {
        return Err(ApiError::bad_request("Use account deletion to remove yourself"));
    }

    let service = UserService::new().await?;
    service.delete(ctx.tenant_id, user_id).await?;

    Ok(ApiResponse::<()>::no_content())
}
