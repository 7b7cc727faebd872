use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::{decode_access_token, Claims};
use crate::authz::Role;
use crate::error::ApiError;

/// Authenticated request context extracted from the access token. Built
/// once per request and never mutated; downstream code receives it via
/// request extensions instead of ambient state.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
}

impl From<Claims> for TenantContext {
    fn from(claims: Claims) -> Self {
        let roles = claims
            .roles
            .iter()
            .filter_map(|r| Role::from_str(r).ok())
            .collect();

        Self {
            tenant_id: claims.tenant_id,
            user_id: claims.sub,
            email: claims.email,
            roles,
        }
    }
}

/// Bearer-token authentication middleware. Validates the token and injects
/// a TenantContext; verification failures surface as 401 with no retry.
pub async fn require_auth(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    crate::metrics::record_request();

    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;
    let claims = decode_access_token(&token)?;

    let ctx = TenantContext::from(claims);
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_rejected() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn non_bearer_scheme_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn empty_token_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer  "));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn context_drops_unknown_roles() {
        let claims = Claims::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "a@b.c".to_string(),
            vec!["member".to_string(), "superuser".to_string()],
        );
        let ctx = TenantContext::from(claims);
        assert_eq!(ctx.roles, vec![Role::Member]);
    }
}
