//! Guard-chain behavior that is independent of the database: the
//! authentication middleware, the tenant guard, and the role gates all
//! resolve before any query runs.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn protected_route_requires_a_token() -> Result<()> {
    let (status, body) = common::send(common::app(), "GET", "/api/v1/workspaces", None).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let (status, _) =
        common::send(common::app(), "GET", "/api/v1/workspaces", Some("not.a.jwt")).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn tampered_token_is_rejected() -> Result<()> {
    let mut token = common::token_for(Uuid::new_v4(), Uuid::new_v4(), &["member"]);
    token.push('x');

    let (status, _) =
        common::send(common::app(), "GET", "/api/v1/workspaces", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let token = common::expired_token(Uuid::new_v4(), Uuid::new_v4());

    let (status, body) =
        common::send(common::app(), "GET", "/api/v1/auth/me", Some(&token)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired");
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_the_handler() -> Result<()> {
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let token = common::token_for(tenant_id, user_id, &["member"]);

    let (status, body) =
        common::send(common::app(), "GET", "/api/v1/auth/me", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenant_id"], tenant_id.to_string());
    assert_eq!(body["data"]["user_id"], user_id.to_string());
    Ok(())
}

#[tokio::test]
async fn nil_tenant_fails_the_tenant_guard() -> Result<()> {
    let token = common::token_for(Uuid::nil(), Uuid::new_v4(), &["member"]);

    let (status, body) =
        common::send(common::app(), "GET", "/api/v1/auth/me", Some(&token)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn member_cannot_reach_the_admin_surface() -> Result<()> {
    let token = common::token_for(Uuid::new_v4(), Uuid::new_v4(), &["member"]);

    let (status, _) =
        common::send(common::app(), "GET", "/api/v1/tenants", Some(&token)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn member_cannot_delete_users() -> Result<()> {
    let token = common::token_for(Uuid::new_v4(), Uuid::new_v4(), &["member"]);
    let uri = format!("/api/v1/users/{}", Uuid::new_v4());

    let (status, _) = common::send(common::app(), "DELETE", &uri, Some(&token)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn member_cannot_mutate_feature_flags() -> Result<()> {
    let token = common::token_for(Uuid::new_v4(), Uuid::new_v4(), &["member"]);
    let uri = "/api/v1/flags/some-flag";

    let (status, _) = common::send(common::app(), "DELETE", uri, Some(&token)).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn metrics_endpoint_requires_auth_and_serves_counters() -> Result<()> {
    let (status, _) =
        common::send(common::app(), "GET", "/api/v1/monitoring/metrics", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = common::token_for(Uuid::new_v4(), Uuid::new_v4(), &["member"]);
    let (status, body) =
        common::send(common::app(), "GET", "/api/v1/monitoring/metrics", Some(&token)).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["http_requests_total"].is_u64());
    Ok(())
}
