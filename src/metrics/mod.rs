//! Process-local operational counters surfaced at /api/v1/monitoring/metrics.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUESTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static CLIENT_ERRORS: AtomicU64 = AtomicU64::new(0);
static SERVER_ERRORS: AtomicU64 = AtomicU64::new(0);
static JOBS_RUN: AtomicU64 = AtomicU64::new(0);
static JOBS_FAILED: AtomicU64 = AtomicU64::new(0);
static QUEUE_JOBS_PROCESSED: AtomicU64 = AtomicU64::new(0);

pub fn record_request() {
    REQUESTS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn record_error_status(status: u16) {
    match status {
        400..=499 => {
            CLIENT_ERRORS.fetch_add(1, Ordering::Relaxed);
        }
        500..=599 => {
            SERVER_ERRORS.fetch_add(1, Ordering::Relaxed);
        }
        _ => {}
    }
}

pub fn record_job_run() {
    JOBS_RUN.fetch_add(1, Ordering::Relaxed);
}

pub fn record_job_failure() {
    JOBS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_queue_job() {
    QUEUE_JOBS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> Value {
    json!({
        "http_requests_total": REQUESTS_TOTAL.load(Ordering::Relaxed),
        "http_client_errors_total": CLIENT_ERRORS.load(Ordering::Relaxed),
        "http_server_errors_total": SERVER_ERRORS.load(Ordering::Relaxed),
        "scheduled_jobs_run_total": JOBS_RUN.load(Ordering::Relaxed),
        "scheduled_jobs_failed_total": JOBS_FAILED.load(Ordering::Relaxed),
        "queue_jobs_processed_total": QUEUE_JOBS_PROCESSED.load(Ordering::Relaxed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let before = snapshot();
        record_request();
        record_error_status(404);
        record_error_status(500);
        let after = snapshot();

        let delta = |key: &str| {
            after[key].as_u64().unwrap_or(0) as i64 - before[key].as_u64().unwrap_or(0) as i64
        };
        assert!(delta("http_requests_total") >= 1);
        assert!(delta("http_client_errors_total") >= 1);
        assert!(delta("http_server_errors_total") >= 1);
    }
}
