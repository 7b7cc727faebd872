use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Wrapper for API responses that automatically adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self { data, status_code: None }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code: Some(status_code) }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    /// Create a 204 No Content response (data will be ignored)
    pub fn no_content() -> ApiResponse<()> {
        ApiResponse::with_status((), StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let envelope = json!({
            "success": true,
            "data": data_value
        });

        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

/// Pagination query parameters; both are optional and clamped to the
/// configured limits.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        let api = &crate::config::config().api;
        self.limit
            .unwrap_or(api.default_page_limit)
            .clamp(1, api.max_page_limit)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// List-endpoint envelope: items plus the total row count and the page
/// window that produced them.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: &PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page(),
            limit: params.limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_defaults_and_clamping() {
        let params = PageParams { page: None, limit: None };
        assert_eq!(params.page(), 1);
        assert_eq!(params.offset(), 0);

        let params = PageParams { page: Some(0), limit: Some(0) };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);

        let params = PageParams { page: Some(3), limit: Some(10) };
        assert_eq!(params.offset(), 20);

        let huge = PageParams { page: Some(1), limit: Some(1_000_000) };
        assert!(huge.limit() <= crate::config::config().api.max_page_limit);
    }

    #[test]
    fn page_envelope_shape() {
        let params = PageParams { page: Some(2), limit: Some(5) };
        let page = Page::new(vec![1, 2, 3], 13, &params);
        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value["total"], 13);
        assert_eq!(value["page"], 2);
        assert_eq!(value["limit"], 5);
        assert_eq!(value["items"].as_array().unwrap().len(), 3);
    }
}
