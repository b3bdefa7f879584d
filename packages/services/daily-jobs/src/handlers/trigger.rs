use std::sync::Arc;

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::jobs::DailyJobs;

pub const FAILED_STEP_HEADER: &str = "x-failed-step";

#[derive(Clone)]
pub struct AppState {
    /// Requests are rejected while no secret is configured.
    pub expected_token: Option<String>,
    pub jobs: Arc<DailyJobs>,
}

/// True only for `Authorization: Bearer <secret>` with a non-empty configured secret.
pub fn is_authorized(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|s| !s.is_empty()) else {
        return false;
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false)
}

pub async fn run_daily_jobs(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !is_authorized(&headers, state.expected_token.as_deref()) {
        tracing::warn!(
            secret_configured = state.expected_token.is_some(),
            header_present = headers.contains_key(AUTHORIZATION),
            "daily jobs trigger rejected"
        );
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    match state.jobs.run().await {
        Ok(report) => {
            tracing::info!(
                run_id = %report.run_id,
                pushed = report.catalog.pushed(),
                catalog_skipped = report.catalog.is_skipped(),
                "daily jobs completed"
            );
            (StatusCode::OK, "OK").into_response()
        }
        Err(failure) => {
            tracing::error!(step = %failure.step, error = %failure.error, "daily jobs failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(FAILED_STEP_HEADER, failure.step.as_str())],
                "Failed",
            )
                .into_response()
        }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
