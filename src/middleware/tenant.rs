use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;
use crate::middleware::auth::TenantContext;

/// Tenant-scope guard for non-public routes: requires a resolved context
/// with a non-nil tenant id. Presence-only check; resource-level scoping
/// happens in the services.
pub async fn require_tenant(request: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = request
        .extensions()
        .get::<TenantContext>()
        .ok_or_else(|| ApiError::forbidden("No tenant context resolved for this request"))?;

    if ctx.tenant_id.is_nil() {
        return Err(ApiError::forbidden("Request is not scoped to a tenant"));
    }

    Ok(next.run(request).await)
}
