use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::lifecycle::{TransitionExtras, load_post, transition};
use super::listing_service::ListPostsResult;
use crate::data::post_repository::{Pagination, PostFilter, PostRepository};
use crate::data::profile_repository::{LockChange, ProfileRepository};
use crate::domain::access::{Actor, authorize_lock, require_admin};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostAction, PostStatus, validate_post_id};
use crate::domain::profile::{Lock, Profile, Role, validate_profile_id};
use crate::domain::renewal::renewal_deadline;

const MAX_REASON_CHARS: usize = 1000;

#[derive(Debug, Clone)]
pub(crate) struct AdminStats {
    pub(crate) posts_by_status: Vec<(PostStatus, i64)>,
    pub(crate) profiles_by_role: Vec<(Role, i64)>,
}

pub(crate) struct AdminService {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl AdminService {
    pub(crate) fn new(posts: Arc<dyn PostRepository>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { posts, profiles }
    }

    /// Soft delete. There is no way back from `Deleted`.
    pub(crate) async fn delete_post(
        &self,
        actor: &Actor,
        id: i64,
        reason: &str,
    ) -> Result<Post, DomainError> {
        let id = validate_post_id(id)?;
        require_admin(actor)?;
        let reason = normalize_reason(reason)?;

        let post = load_post(self.posts.as_ref(), id).await?;
        let extras = TransitionExtras {
            deletion_reason: Some(reason),
            ..TransitionExtras::default()
        };
        transition(
            self.posts.as_ref(),
            &post,
            PostAction::AdminDelete,
            actor.profile_id,
            Utc::now(),
            extras,
        )
        .await
    }

    pub(crate) async fn force_status(
        &self,
        actor: &Actor,
        id: i64,
        status: PostStatus,
    ) -> Result<Post, DomainError> {
        let id = validate_post_id(id)?;
        require_admin(actor)?;

        let post = load_post(self.posts.as_ref(), id).await?;
        let now = Utc::now();
        let extras = TransitionExtras {
            expires_at: (status == PostStatus::Active).then(|| renewal_deadline(now)),
            ..TransitionExtras::default()
        };
        transition(
            self.posts.as_ref(),
            &post,
            PostAction::ForceStatus(status),
            actor.profile_id,
            now,
            extras,
        )
        .await
    }

    pub(crate) async fn set_user_lock(
        &self,
        actor: &Actor,
        profile_id: i64,
        is_locked: bool,
    ) -> Result<Profile, DomainError> {
        let profile_id = validate_profile_id(profile_id)?;
        require_admin(actor)?;

        let target = self
            .profiles
            .get_profile(profile_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("profile id: {profile_id}")))?;
        authorize_lock(actor, &target)?;

        let at = Utc::now();
        let lock = is_locked.then(|| Lock {
            locked_at: at,
            locked_by: actor.profile_id,
        });
        let updated = self
            .profiles
            .set_lock(profile_id, LockChange { lock, at })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("profile id: {profile_id}")))?;

        info!(
            profile_id,
            actor_profile_id = actor.profile_id,
            is_locked,
            "profile lock state changed"
        );
        Ok(updated)
    }

    pub(crate) async fn list_posts(
        &self,
        actor: &Actor,
        status: Option<PostStatus>,
        pagination: Pagination,
    ) -> Result<ListPostsResult, DomainError> {
        require_admin(actor)?;

        let filter = PostFilter {
            status,
            created_by: None,
            include_deleted: true,
        };
        let posts = self.posts.list_posts(filter, pagination).await?;
        let total = self.posts.count_posts(filter).await?;

        Ok(ListPostsResult {
            posts,
            pagination,
            total,
        })
    }

    pub(crate) async fn stats(&self, actor: &Actor) -> Result<AdminStats, DomainError> {
        require_admin(actor)?;

        Ok(AdminStats {
            posts_by_status: self.posts.count_by_status().await?,
            profiles_by_role: self.profiles.count_by_role().await?,
        })
    }
}

fn normalize_reason(reason: &str) -> Result<String, DomainError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(DomainError::invalid("reason", "must not be empty"));
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(DomainError::invalid("reason", "must be at most 1000 chars"));
    }
    Ok(reason.to_string())
}
