use thiserror::Error;

use super::post::{PostAction, PostStatus};

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("validation failed for '{field}': {message}")]
    InvalidInput {
        field: &'static str,
        message: &'static str,
    },

    #[error("cannot {action} a post in status '{from}'")]
    InvalidStateTransition { from: PostStatus, action: PostAction },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl DomainError {
    pub(crate) fn invalid(field: &'static str, message: &'static str) -> Self {
        Self::InvalidInput { field, message }
    }

    pub(crate) fn post_not_found(id: i64) -> Self {
        Self::NotFound(format!("post id: {id}"))
    }
}
