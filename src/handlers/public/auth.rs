use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::auth_service::AuthService;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub tenant_name: String,
    pub tenant_slug: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub tenant: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/v1/auth/signup - Create a tenant and its owner user
pub async fn signup(Json(payload): Json<SignupRequest>) -> ApiResult<Value> {
    let service = AuthService::new().await?;
    let (tenant, user, tokens) = service
        .signup(
            &payload.tenant_name,
            &payload.tenant_slug,
            &payload.email,
            &payload.password,
            &payload.display_name,
        )
        .await?;

    tracing::info!("Tenant '{}' signed up", tenant.slug);

    Ok(ApiResponse::created(json!({
        "tenant": tenant,
        "user": user,
        "tokens": tokens,
    })))
}

/// POST /api/v1/auth/login - Authenticate and receive a token pair
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let service = AuthService::new().await?;
    let (user, tokens) = service
        .login(&payload.tenant, &payload.email, &payload.password)
        .await?;

    Ok(ApiResponse::success(json!({
        "user": user,
        "tokens": tokens,
    })))
}

/// POST /api/v1/auth/refresh - Rotate a refresh token
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> ApiResult<Value> {
    let service = AuthService::new().await?;
    let (user, tokens) = service.refresh(&payload.refresh_token).await?;

    Ok(ApiResponse::success(json!({
        "user": user,
        "tokens": tokens,
    })))
}
