use axum::{Json, Router, routing::get};
use serde::Serialize;

use super::AppState;

pub(crate) mod admin;
pub(crate) mod cron;
pub(crate) mod posts;

/// Full API surface with state applied. Server-level layers are added in `server`.
pub(crate) fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/posts", posts::router(state.clone()))
        .nest("/api/admin", admin::router(state.clone()))
        .nest("/api/cron", cron::router(state.clone()))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthzResponse {
    status: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
