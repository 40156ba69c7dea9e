use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

const INTERNAL_MESSAGE: &str = "something went wrong, please try again later";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let (status, code, msg) = match self {
            AppError::Domain(err) => match &err {
                DomainError::Unauthenticated => (
                    StatusCode::UNAUTHORIZED,
                    "unauthenticated",
                    "authentication required".to_string(),
                ),
                DomainError::Forbidden => (
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    "you are not allowed to perform this action".to_string(),
                ),
                DomainError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    "resource not found".to_string(),
                ),
                DomainError::InvalidInput { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
                }
                DomainError::InvalidStateTransition { .. } => (
                    StatusCode::BAD_REQUEST,
                    "invalid_state_transition",
                    err.to_string(),
                ),
                DomainError::Conflict(_) => (StatusCode::BAD_REQUEST, "conflict", err.to_string()),
                DomainError::RateLimited { retry_after_secs } => {
                    warn!(retry_after_secs, "request rate limited");
                    retry_after = Some(*retry_after_secs);
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        "rate_limited",
                        "too many requests".to_string(),
                    )
                }
                DomainError::Upstream(detail) => {
                    error!(error = %detail, "upstream failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "upstream_failure",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },
            AppError::Validation(err) => {
                (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
            AppError::Internal(err) => {
                error!(error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let mut response = (status, Json(ErrorBody { error: msg, code })).into_response();
        if let Some(secs) = retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

/// Path ids arrive as text so that malformed values surface as `invalid_input`.
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::Domain(DomainError::invalid("id", "must be a positive integer")))
}
