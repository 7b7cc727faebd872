use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};

use crate::authz::{self, Role};
use crate::database::models::FeatureFlag;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::flag_service::{Evaluation, FlagCreate, FlagService, FlagUpdate};

/// GET /api/v1/flags
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<FeatureFlag>> {
    let service = FlagService::new().await?;
    let (flags, total) = service.list(ctx.tenant_id, &params).await?;

    Ok(ApiResponse::success(Page::new(flags, total, &params)))
}

/// POST /api/v1/flags - Tenant admins only
pub async fn create(
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<FlagCreate>,
) -> ApiResult<FeatureFlag> {
    authz::require_roles(&ctx, &[Role::Admin, Role::Owner])?;

    let service = FlagService::new().await?;
    let flag = service.create(ctx.tenant_id, payload).await?;
    Ok(ApiResponse::created(flag))
}

/// GET /api/v1/flags/:key
pub async fn get(
    Extension(ctx): Extension<TenantContext>,
    Path(key): Path<String>,
) -> ApiResult<FeatureFlag> {
    let service = FlagService::new().await?;
    let flag = service.get(ctx.tenant_id, &key).await?;
    Ok(ApiResponse::success(flag))
}

/// PATCH /api/v1/flags/:key - Tenant admins only
pub async fn update(
    Extension(ctx): Extension<TenantContext>,
    Path(key): Path<String>,
    Json(payload): Json<FlagUpdate>,
) -> ApiResult<FeatureFlag> {
    authz::require_roles(&ctx, &[Role::Admin, Role::Owner])?;

    let service = FlagService::new().await?;
    let flag = service.update(ctx.tenant_id, &key, payload).await?;
    Ok(ApiResponse::success(flag))
}

/// DELETE /api/v1/flags/:key - Tenant admins only
pub async fn delete(
    Extension(ctx): Extension<TenantContext>,
    Path(key): Path<String>,
) -> ApiResult<()> {
    authz::require_roles(&ctx, &[Role::Admin, Role::Owner])?;

    let service = FlagService::new().await?;
    service.delete(ctx.tenant_id, &key).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// GET /api/v1/flags/:key/evaluate - Deterministic rollout decision for
/// the calling user
pub async fn evaluate(
    Extension(ctx): Extension<TenantContext>,
    Path(key): Path<String>,
) -> ApiResult<Evaluation> {
    let service = FlagService::new().await?;
    let evaluation = service.evaluate(ctx.tenant_id, &key, ctx.user_id).await?;
    Ok(ApiResponse::success(evaluation))
}
