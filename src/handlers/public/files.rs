use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Attachment;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::file_service::FileService;

#[derive(Debug, Deserialize)]
pub struct ScanCallbackRequest {
    pub key: String,
    pub expires: i64,
    pub signature: String,
    pub verdict: String,
    pub task_id: Option<Uuid>,
}

/// POST /api/v1/files/scan-callback - Scanner verdict for an uploaded file.
/// Authenticated by the presign signature instead of a bearer token, since
/// the caller is the scanning service.
pub async fn scan_callback(Json(payload): Json<ScanCallbackRequest>) -> ApiResult<Attachment> {
    let service = FileService::new().await?;
    let attachment = service
        .scan_callback(
            &payload.key,
            payload.expires,
            &payload.signature,
            &payload.verdict,
            payload.task_id,
        )
        .await?;

    Ok(ApiResponse::success(attachment))
}
