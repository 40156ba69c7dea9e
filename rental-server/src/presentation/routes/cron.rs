use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::infrastructure::rate_limit::RateLimitClass;
use crate::presentation::AppState;
use crate::presentation::handlers::cron::expire_posts;
use crate::presentation::middleware::rate_limit::{RateLimitGuard, enforce_rate_limit};

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/expire-posts", get(expire_posts))
        .layer(middleware::from_fn_with_state(
            RateLimitGuard::new(&state, RateLimitClass::Auth),
            enforce_rate_limit,
        ))
}
