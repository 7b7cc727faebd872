use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use taskdeck_api::auth::{generate_access_token, Claims};

pub fn app() -> Router {
    taskdeck_api::server::app()
}

/// Mint an access token for a synthetic user. Uses the development JWT
/// secret, so these tests run without any environment setup.
pub fn token_for(tenant_id: Uuid, user_id: Uuid, roles: &[&str]) -> String {
    let claims = Claims::new(
        user_id,
        tenant_id,
        "tester@example.com".to_string(),
        roles.iter().map(|r| r.to_string()).collect(),
    );
    generate_access_token(&claims).expect("token generation")
}

/// Mint a token that expired an hour ago
pub fn expired_token(tenant_id: Uuid, user_id: Uuid) -> String {
    let mut claims = Claims::new(
        user_id,
        tenant_id,
        "tester@example.com".to_string(),
        vec!["member".to_string()],
    );
    claims.exp = chrono::Utc::now().timestamp() - 3600;
    generate_access_token(&claims).expect("token generation")
}

pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
) -> Result<(StatusCode, serde_json::Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty())?;

    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, body))
}
