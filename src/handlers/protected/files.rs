use axum::{extract::Query, response::Json, Extension};
use serde::Deserialize;

use crate::database::models::Attachment;
use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult, Page, PageParams};
use crate::services::file_service::{FileService, PresignedUpload};

#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// POST /api/v1/files/presign - Issue a presigned upload URL; the file
/// itself goes straight to storage
pub async fn presign(
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<PresignRequest>,
) -> ApiResult<PresignedUpload> {
    let service = FileService::new().await?;
    let upload = service
        .presign(
            ctx.tenant_id,
            ctx.user_id,
            &payload.file_name,
            &payload.content_type,
            payload.size_bytes,
        )
        .await?;

    Ok(ApiResponse::created(upload))
}

/// GET /api/v1/files - Attachments in the caller's tenant
pub async fn list(
    Extension(ctx): Extension<TenantContext>,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<Attachment>> {
    let service = FileService::new().await?;
    let (attachments, total) = service.list(ctx.tenant_id, &params).await?;

    Ok(ApiResponse::success(Page::new(attachments, total, &params)))
}
