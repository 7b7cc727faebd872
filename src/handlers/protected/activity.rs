use axum::{extract::Query, Extension};

use crate::database::models::ActivityLog;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::activity_service::ActivityService;

/// GET /api/v1/activity - Tenant-scoped audit trail, newest first
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<ActivityLog>> {
    let service = ActivityService::new().await?;
    let (items, total) = service.list(ctx.tenant_id, &params).await?;

    Ok(ApiResponse::success(Page::new(items, total, &params)))
}
