use serde_json::Value;

use crate::middleware::response::{ApiResponse, ApiResult};

/// GET /api/v1/monitoring/metrics - Process counters
pub async fn metrics() -> ApiResult<Value> {
    Ok(ApiResponse::success(crate::metrics::snapshot()))
}
