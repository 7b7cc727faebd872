use axum::{extract::Request, middleware::Next, response::Response};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config;
use crate::error::ApiError;

/// Fixed-window request counter per client key. In-memory only; a
/// multi-instance deployment would move this behind a shared store, which
/// is out of scope here.
struct Window {
    started: Instant,
    count: u32,
}

static WINDOWS: Mutex<Option<HashMap<String, Window>>> = Mutex::new(None);

pub async fn rate_limit(request: Request, next: Next) -> Result<Response, ApiError> {
    let api_config = &config::config().api;
    if !api_config.enable_rate_limiting {
        return Ok(next.run(request).await);
    }

    let key = client_key(&request);
    let window = Duration::from_secs(api_config.rate_limit_window_secs);
    let allowed = check(&key, window, api_config.rate_limit_requests);

    if !allowed {
        return Err(ApiError::too_many_requests("Rate limit exceeded, slow down"));
    }

    Ok(next.run(request).await)
}

fn client_key(request: &Request) -> String {
    // Prefer the authenticated user; fall back to forwarded address
    if let Some(ctx) = request.extensions().get::<crate::middleware::auth::TenantContext>() {
        return format!("user:{}", ctx.user_id);
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| format!("ip:{}", v.split(',').next().unwrap_or(v).trim()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}

fn check(key: &str, window: Duration, limit: u32) -> bool {
    let mut guard = WINDOWS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let windows = guard.get_or_insert_with(HashMap::new);
    let now = Instant::now();

    let entry = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
    if now.duration_since(entry.started) > window {
        entry.started = now;
        entry.count = 0;
    }

    entry.count += 1;
    entry.count <= limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_reset_after_window() {
        let window = Duration::from_millis(20);
        let key = format!("test:{}", uuid::Uuid::new_v4());

        assert!(check(&key, window, 2));
        assert!(check(&key, window, 2));
        assert!(!check(&key, window, 2));

        std::thread::sleep(Duration::from_millis(30));
        assert!(check(&key, window, 2));
    }

    #[test]
    fn keys_are_independent() {
        let window = Duration::from_secs(60);
        let a = format!("test:{}", uuid::Uuid::new_v4());
        let b = format!("test:{}", uuid::Uuid::new_v4());

        assert!(check(&a, window, 1));
        assert!(!check(&a, window, 1));
        assert!(check(&b, window, 1));
    }
}
