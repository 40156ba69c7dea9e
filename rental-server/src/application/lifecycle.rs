use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::data::post_repository::{PostRepository, StatusChange};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostAction};

#[derive(Debug, Clone, Default)]
pub(crate) struct TransitionExtras {
    pub(crate) expires_at: Option<DateTime<Utc>>,
    pub(crate) deletion_reason: Option<String>,
}

pub(crate) async fn load_post(repo: &dyn PostRepository, id: i64) -> Result<Post, DomainError> {
    repo.get_post(id)
        .await?
        .ok_or_else(|| DomainError::post_not_found(id))
}

/// Validates `action` against the post's current status and writes the result
/// with a single update fenced on that status.
pub(crate) async fn transition(
    repo: &dyn PostRepository,
    post: &Post,
    action: PostAction,
    actor_profile_id: i64,
    at: DateTime<Utc>,
    extras: TransitionExtras,
) -> Result<Post, DomainError> {
    let next = post.status.apply(action)?;

    let change = StatusChange {
        expected: post.status,
        status: next,
        expires_at: extras.expires_at,
        deletion_reason: extras.deletion_reason,
        actor_profile_id,
        at,
    };

    match repo.apply_status_change(post.id, change).await? {
        Some(updated) => {
            info!(
                post_id = post.id,
                actor_profile_id,
                from = %post.status,
                to = %updated.status,
                "post status changed"
            );
            Ok(updated)
        }
        None => {
            warn!(post_id = post.id, %action, "post changed concurrently");
            match repo.get_post(post.id).await? {
                Some(_) => Err(DomainError::Conflict(
                    "post was modified concurrently".to_string(),
                )),
                None => Err(DomainError::post_not_found(post.id)),
            }
        }
    }
}
