//! Cross-tenant administration. Routes here run behind the admin role gate
//! in addition to the regular auth chain; they are the single place tenant
//! scoping is deliberately bypassed.

use axum::extract::{Path, Query};
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::tenant_service::{TenantService, TenantStats};

/// GET /api/v1/tenants
pub async fn list(Query(params): Query<PageParams>) -> ApiResult<Page<Tenant>> {
    let service = TenantService::new().await?;
    let (tenants, total) = service.list(&params).await?;

    Ok(ApiResponse::success(Page::new(tenants, total, &params)))
}

/// GET /api/v1/tenants/:id
pub async fn get(Path(tenant_id): Path<Uuid>) -> ApiResult<Tenant> {
    let service = TenantService::new().await?;
    let tenant = service.get(tenant_id).await?;

    Ok(ApiResponse::success(tenant))
}

/// GET /api/v1/tenants/:id/stats
pub async fn stats(Path(tenant_id): Path<Uuid>) -> ApiResult<TenantStats> {
    let service = TenantService::new().await?;
    let stats = service.stats(tenant_id).await?;

    Ok(ApiResponse::success(stats))
}

/// DELETE /api/v1/tenants/:id - Soft delete
pub async fn delete(Path(tenant_id): Path<Uuid>) -> ApiResult<()> {
    let service = TenantService::new().await?;
    service.delete(tenant_id).await?;

    Ok(ApiResponse::<()>::no_content())
}
