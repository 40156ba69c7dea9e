use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, patch};

use crate::infrastructure::rate_limit::RateLimitClass;
use crate::presentation::AppState;
use crate::presentation::handlers::admin::{delete_post, force_status, list_posts, lock_user, stats};
use crate::presentation::middleware::auth::jwt_auth_middleware;
use crate::presentation::middleware::rate_limit::{RateLimitGuard, enforce_rate_limit};

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let reads = Router::new()
        .route("/posts", get(list_posts))
        .route("/stats", get(stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            RateLimitGuard::new(&state, RateLimitClass::Read),
            enforce_rate_limit,
        ));

    let writes = Router::new()
        .route("/posts/{id}", delete(delete_post))
        .route("/posts/{id}/status", patch(force_status))
        .route("/users/{id}/lock", patch(lock_user))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            RateLimitGuard::new(&state, RateLimitClass::Write),
            enforce_rate_limit,
        ));

    // Admin role is checked by the services, not here.
    reads.merge(writes)
}
