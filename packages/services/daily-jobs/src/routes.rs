use axum::http::Request;
use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};

use crate::handlers::{health_check, run_daily_jobs, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        // Intended for POST, but schedulers differ in what they send
        .route("/runDailyJobs", any(run_daily_jobs))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO))
                .make_span_with(|req: &Request<_>| {
                    let id = nanoid::nanoid!(8);
                    tracing::info_span!(
                        "http.request",
                        req.id = %id,
                        http.method = %req.method(),
                        http.path = %req.uri().path(),
                        user_agent = req.headers().get("user-agent").and_then(|v| v.to_str().ok()),
                    )
                }),
        )
}
