use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::bounds::MapBounds;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostStatus};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: i64,
    pub(crate) address: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) created_by: i64,
    pub(crate) expires_at: DateTime<Utc>,
}

/// A status write fenced on the status the caller observed.
#[derive(Debug, Clone)]
pub(crate) struct StatusChange {
    pub(crate) expected: PostStatus,
    pub(crate) status: PostStatus,
    pub(crate) expires_at: Option<DateTime<Utc>>,
    pub(crate) deletion_reason: Option<String>,
    pub(crate) actor_profile_id: i64,
    pub(crate) at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Pagination {
    pub(crate) limit: u32,
    pub(crate) offset: u32,
}

impl Pagination {
    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.offset)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PostFilter {
    pub(crate) status: Option<PostStatus>,
    pub(crate) created_by: Option<i64>,
    pub(crate) include_deleted: bool,
}

impl PostFilter {
    #[cfg(test)]
    pub(crate) fn matches(&self, post: &Post) -> bool {
        if !self.include_deleted && post.is_deleted() {
            return false;
        }
        if self.status.is_some_and(|status| status != post.status) {
            return false;
        }
        self.created_by.is_none_or(|owner| owner == post.created_by)
    }
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Returns `None` when the post no longer has `change.expected` status.
    async fn apply_status_change(
        &self,
        id: i64,
        change: StatusChange,
    ) -> Result<Option<Post>, DomainError>;
    async fn list_in_bounds(
        &self,
        bounds: MapBounds,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Post>, DomainError>;
    async fn list_posts(
        &self,
        filter: PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError>;
    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError>;
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
    async fn count_by_status(&self) -> Result<Vec<(PostStatus, i64)>, DomainError>;
}
