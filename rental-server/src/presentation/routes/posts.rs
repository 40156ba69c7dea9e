use axum::Router;
use axum::middleware;
use axum::routing::{get, patch, post};

use crate::infrastructure::rate_limit::RateLimitClass;
use crate::presentation::AppState;
use crate::presentation::handlers::posts::{
    bump_post, create_post, get_post, list_map, list_mine, mark_as_rented, toggle_visibility,
};
use crate::presentation::middleware::auth::jwt_auth_middleware;
use crate::presentation::middleware::rate_limit::{RateLimitGuard, enforce_rate_limit};

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_map))
        .route("/{id}", get(get_post))
        .layer(middleware::from_fn_with_state(
            RateLimitGuard::new(&state, RateLimitClass::Read),
            enforce_rate_limit,
        ));

    let mine = Router::new()
        .route("/mine", get(list_mine))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            RateLimitGuard::new(&state, RateLimitClass::Read),
            enforce_rate_limit,
        ));

    let write = Router::new()
        .route("/", post(create_post))
        .route("/{id}/bump", post(bump_post))
        .route("/{id}/toggle-visibility", patch(toggle_visibility))
        .route("/{id}/mark-as-rented", patch(mark_as_rented))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            RateLimitGuard::new(&state, RateLimitClass::Write),
            enforce_rate_limit,
        ));

    public.merge(mine).merge(write)
}
