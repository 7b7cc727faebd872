mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let (status, body) = common::send(common::app(), "GET", "/", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "taskdeck-api");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let (status, _) = common::send(common::app(), "GET", "/api/v1/nonsense", None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
