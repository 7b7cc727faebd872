use axum::{response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::auth::TenantContext;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::auth_service::AuthService;

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// GET /api/v1/auth/me - Current authenticated identity
pub async fn me(Extension(ctx): Extension<TenantContext>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "user_id": ctx.user_id,
        "tenant_id": ctx.tenant_id,
        "email": ctx.email,
        "roles": ctx.roles,
    })))
}

/// DELETE /api/v1/auth/logout - Revoke the presented refresh token
pub async fn logout(
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<LogoutRequest>,
) -> ApiResult<()> {
    let service = AuthService::new().await?;
    service
        .logout(ctx.tenant_id, ctx.user_id, &payload.refresh_token)
        .await?;

    Ok(ApiResponse::<()>::no_content())
}
