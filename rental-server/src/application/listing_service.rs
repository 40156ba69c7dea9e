use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::lifecycle::{TransitionExtras, load_post, transition};
use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostRepository};
use crate::domain::access::{Actor, PostPermission, authorize_post, require_publisher};
use crate::domain::bounds::MapBounds;
use crate::domain::error::DomainError;
use crate::domain::post::{CreatePostRequest, Post, PostAction, PostStatus, validate_post_id};
use crate::domain::renewal::renewal_deadline;

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<Post>,
    pub(crate) pagination: Pagination,
    pub(crate) total: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct BumpResult {
    pub(crate) post: Post,
    pub(crate) expires_at: DateTime<Utc>,
}

/// Owner-facing side of the post lifecycle plus the public map queries.
pub(crate) struct ListingService {
    repo: Arc<dyn PostRepository>,
}

impl ListingService {
    pub(crate) fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub(crate) async fn create_post(
        &self,
        actor: &Actor,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        require_publisher(actor)?;
        let req = req.validate()?;

        let new_post = NewPost {
            title: req.title,
            description: req.description,
            price: req.price,
            address: req.address,
            latitude: req.latitude,
            longitude: req.longitude,
            created_by: actor.profile_id,
            expires_at: renewal_deadline(Utc::now()),
        };
        self.repo.create_post(new_post).await
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        let id = validate_post_id(id)?;
        let post = load_post(self.repo.as_ref(), id).await?;
        if post.is_deleted() {
            return Err(DomainError::post_not_found(id));
        }
        Ok(post)
    }

    pub(crate) async fn list_map(
        &self,
        bounds: MapBounds,
        limit: u32,
    ) -> Result<Vec<Post>, DomainError> {
        self.repo.list_in_bounds(bounds, Utc::now(), limit).await
    }

    pub(crate) async fn list_mine(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> Result<ListPostsResult, DomainError> {
        let filter = PostFilter {
            created_by: Some(actor.profile_id),
            ..PostFilter::default()
        };
        let posts = self.repo.list_posts(filter, pagination).await?;
        let total = self.repo.count_posts(filter).await?;

        Ok(ListPostsResult {
            posts,
            pagination,
            total,
        })
    }

    pub(crate) async fn bump(&self, actor: &Actor, id: i64) -> Result<BumpResult, DomainError> {
        let id = validate_post_id(id)?;
        let post = load_post(self.repo.as_ref(), id).await?;
        authorize_post(actor, &post, PostPermission::OwnerOrAdmin)?;

        let now = Utc::now();
        let expires_at = renewal_deadline(now);
        let extras = TransitionExtras {
            expires_at: Some(expires_at),
            ..TransitionExtras::default()
        };
        let post = transition(
            self.repo.as_ref(),
            &post,
            PostAction::Bump,
            actor.profile_id,
            now,
            extras,
        )
        .await?;

        Ok(BumpResult { post, expires_at })
    }

    pub(crate) async fn toggle_visibility(
        &self,
        actor: &Actor,
        id: i64,
    ) -> Result<PostStatus, DomainError> {
        let id = validate_post_id(id)?;
        let post = load_post(self.repo.as_ref(), id).await?;
        authorize_post(actor, &post, PostPermission::Owner)?;

        let post = transition(
            self.repo.as_ref(),
            &post,
            PostAction::ToggleVisibility,
            actor.profile_id,
            Utc::now(),
            TransitionExtras::default(),
        )
        .await?;
        Ok(post.status)
    }

    pub(crate) async fn mark_rented(&self, actor: &Actor, id: i64) -> Result<Post, DomainError> {
        let id = validate_post_id(id)?;
        let post = load_post(self.repo.as_ref(), id).await?;
        authorize_post(actor, &post, PostPermission::Owner)?;

        transition(
            self.repo.as_ref(),
            &post,
            PostAction::MarkRented,
            actor.profile_id,
            Utc::now(),
            TransitionExtras::default(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    use super::ListingService;
    use crate::data::memory::{MemoryPostRepo, sample_post};
    use crate::data::post_repository::{
        NewPost, Pagination, PostFilter, PostRepository, StatusChange,
    };
    use crate::domain::access::Actor;
    use crate::domain::bounds::MapBounds;
    use crate::domain::error::DomainError;
    use crate::domain::post::{CreatePostRequest, Post, PostStatus};
    use crate::domain::profile::Role;

    const OWNER: i64 = 10;

    /// What happens to the row between the service's read and its write.
    #[derive(Clone, Copy)]
    enum Interference {
        Sweep,
        Remove,
    }

    /// Runs one interfering change right before the first status write.
    struct RacingRepo {
        inner: MemoryPostRepo,
        interference: Interference,
        armed: AtomicBool,
    }

    impl RacingRepo {
        fn new(inner: MemoryPostRepo, interference: Interference) -> Self {
            Self {
                inner,
                interference,
                armed: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl PostRepository for RacingRepo {
        async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
            self.inner.create_post(input).await
        }

        async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
            self.inner.get_post(id).await
        }

        async fn apply_status_change(
            &self,
            id: i64,
            change: StatusChange,
        ) -> Result<Option<Post>, DomainError> {
            if self.armed.swap(false, Ordering::SeqCst) {
                match self.interference {
                    Interference::Sweep => {
                        self.inner.expire_stale(change.at).await?;
                    }
                    Interference::Remove => {
                        self.inner.remove(id);
                    }
                }
            }
            self.inner.apply_status_change(id, change).await
        }

        async fn list_in_bounds(
            &self,
            bounds: MapBounds,
            now: DateTime<Utc>,
            limit: u32,
        ) -> Result<Vec<Post>, DomainError> {
            self.inner.list_in_bounds(bounds, now, limit).await
        }

        async fn list_posts(
            &self,
            filter: PostFilter,
            pagination: Pagination,
        ) -> Result<Vec<Post>, DomainError> {
            self.inner.list_posts(filter, pagination).await
        }

        async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError> {
            self.inner.count_posts(filter).await
        }

        async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
            self.inner.expire_stale(now).await
        }

        async fn count_by_status(&self) -> Result<Vec<(PostStatus, i64)>, DomainError> {
            self.inner.count_by_status().await
        }
    }

    #[tokio::test]
    async fn bump_racing_the_sweep_conflicts_then_retry_succeeds() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(
            1,
            OWNER,
            PostStatus::Active,
            Some(Utc::now() - Duration::hours(1)),
        ));
        let service = ListingService::new(Arc::new(RacingRepo::new(
            repo.clone(),
            Interference::Sweep,
        )));
        let owner = actor(OWNER, Role::Lessor);

        let err = service
            .bump(&owner, 1)
            .await
            .expect_err("status moved under the bump");
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repo.post(1).expect("post").status, PostStatus::Expired);

        let retry = service.bump(&owner, 1).await.expect("retry must succeed");
        assert_eq!(retry.post.status, PostStatus::Active);
        assert_eq!(repo.post(1).expect("post").status, PostStatus::Active);
    }

    #[tokio::test]
    async fn bump_on_row_removed_mid_flight_is_not_found() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(1, OWNER, PostStatus::Hidden, None));
        let service = ListingService::new(Arc::new(RacingRepo::new(
            repo.clone(),
            Interference::Remove,
        )));

        let err = service
            .bump(&actor(OWNER, Role::Lessor), 1)
            .await
            .expect_err("row is gone");
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(repo.post(1).is_none());
    }

    #[tokio::test]
    async fn bump_renews_renewable_posts_for_fourteen_days() {
        for status in [PostStatus::Active, PostStatus::Hidden, PostStatus::Expired] {
            let repo = MemoryPostRepo::new();
            repo.insert(sample_post(1, OWNER, status, Some(Utc::now() - Duration::days(3))));
            let service = ListingService::new(Arc::new(repo.clone()));

            let before = Utc::now();
            let result = service
                .bump(&actor(OWNER, Role::Lessor), 1)
                .await
                .expect("bump must succeed");
            let after = Utc::now();

            assert_eq!(result.post.status, PostStatus::Active);
            assert!(result.expires_at >= before + Duration::days(14));
            assert!(result.expires_at <= after + Duration::days(14));

            let stored = repo.post(1).expect("post must exist");
            assert_eq!(stored.expires_at, Some(result.expires_at));
            assert_eq!(stored.updated_by, Some(OWNER));
        }
    }

    #[tokio::test]
    async fn bump_rejects_rented_and_deleted_without_writing() {
        for status in [PostStatus::Rented, PostStatus::Deleted] {
            let repo = MemoryPostRepo::new();
            repo.insert(sample_post(1, OWNER, status, None));
            let service = ListingService::new(Arc::new(repo.clone()));

            let err = service
                .bump(&actor(OWNER, Role::Lessor), 1)
                .await
                .expect_err("bump must fail");
            assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
            assert_eq!(repo.write_count(), 0);
        }
    }

    #[tokio::test]
    async fn admin_may_bump_on_behalf_of_owner() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(1, OWNER, PostStatus::Expired, None));
        let service = ListingService::new(Arc::new(repo.clone()));

        service
            .bump(&actor(1, Role::Admin), 1)
            .await
            .expect("admin bump must succeed");
        assert_eq!(repo.post(1).expect("post").updated_by, Some(1));
    }

    #[tokio::test]
    async fn stranger_is_forbidden_regardless_of_status() {
        for status in PostStatus::ALL {
            let repo = MemoryPostRepo::new();
            repo.insert(sample_post(1, OWNER, status, None));
            let service = ListingService::new(Arc::new(repo));
            let stranger = actor(99, Role::Lessor);

            assert!(matches!(
                service.bump(&stranger, 1).await,
                Err(DomainError::Forbidden)
            ));
            assert!(matches!(
                service.toggle_visibility(&stranger, 1).await,
                Err(DomainError::Forbidden)
            ));
            assert!(matches!(
                service.mark_rented(&stranger, 1).await,
                Err(DomainError::Forbidden)
            ));
        }
    }

    #[tokio::test]
    async fn toggle_visibility_twice_restores_status() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(1, OWNER, PostStatus::Active, None));
        let service = ListingService::new(Arc::new(repo));
        let owner = actor(OWNER, Role::Lessor);

        let first = service.toggle_visibility(&owner, 1).await.expect("toggle");
        assert_eq!(first, PostStatus::Hidden);
        let second = service.toggle_visibility(&owner, 1).await.expect("toggle");
        assert_eq!(second, PostStatus::Active);
    }

    #[tokio::test]
    async fn admin_cannot_toggle_someone_elses_post() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(1, OWNER, PostStatus::Active, None));
        let service = ListingService::new(Arc::new(repo));

        let err = service
            .toggle_visibility(&actor(1, Role::Admin), 1)
            .await
            .expect_err("toggle is owner-only");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn mark_rented_second_call_conflicts() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(1, OWNER, PostStatus::Active, None));
        let service = ListingService::new(Arc::new(repo.clone()));
        let owner = actor(OWNER, Role::Lessor);

        service.mark_rented(&owner, 1).await.expect("first call");
        let err = service
            .mark_rented(&owner, 1)
            .await
            .expect_err("second call must fail");
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repo.post(1).expect("post").status, PostStatus::Rented);
    }

    #[tokio::test]
    async fn invalid_and_missing_ids_are_distinguished() {
        let service = ListingService::new(Arc::new(MemoryPostRepo::new()));
        let owner = actor(OWNER, Role::Lessor);

        let err = service.bump(&owner, 0).await.expect_err("invalid id");
        assert!(matches!(err, DomainError::InvalidInput { field: "id", .. }));

        let err = service.bump(&owner, 42).await.expect_err("missing post");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_post_hides_soft_deleted_posts() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(1, OWNER, PostStatus::Deleted, None));
        let service = ListingService::new(Arc::new(repo));

        let err = service.get_post(1).await.expect_err("deleted is not found");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_post_requires_publisher_role() {
        let service = ListingService::new(Arc::new(MemoryPostRepo::new()));
        let err = service
            .create_post(&actor(5, Role::Renter), sample_request())
            .await
            .expect_err("renter cannot publish");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn create_post_starts_active_with_renewal_window() {
        let repo = MemoryPostRepo::new();
        let service = ListingService::new(Arc::new(repo.clone()));

        let post = service
            .create_post(&actor(OWNER, Role::Lessor), sample_request())
            .await
            .expect("create must succeed");

        assert_eq!(post.status, PostStatus::Active);
        assert_eq!(post.created_by, OWNER);
        let expires_at = post.expires_at.expect("deadline must be set");
        assert!(expires_at > Utc::now() + Duration::days(13));
        assert_eq!(post.title, "Loft");
    }

    #[tokio::test]
    async fn map_shows_only_active_unexpired_posts_in_bounds() {
        let repo = MemoryPostRepo::new();
        let future = Some(Utc::now() + Duration::days(1));
        repo.insert(sample_post(1, OWNER, PostStatus::Active, future));
        repo.insert(sample_post(2, OWNER, PostStatus::Hidden, future));
        repo.insert(sample_post(3, OWNER, PostStatus::Active, Some(Utc::now() - Duration::days(1))));
        let mut far_away = sample_post(4, OWNER, PostStatus::Active, future);
        far_away.longitude = -120.0;
        repo.insert(far_away);

        let service = ListingService::new(Arc::new(repo));
        let bounds = MapBounds::new(50.0, 10.0, 55.0, 15.0).expect("bounds");
        let posts = service.list_map(bounds, 100).await.expect("map query");

        let ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn list_mine_excludes_deleted_and_foreign_posts() {
        let repo = MemoryPostRepo::new();
        repo.insert(sample_post(1, OWNER, PostStatus::Active, None));
        repo.insert(sample_post(2, OWNER, PostStatus::Deleted, None));
        repo.insert(sample_post(3, 77, PostStatus::Active, None));
        let service = ListingService::new(Arc::new(repo));

        let result = service
            .list_mine(
                &actor(OWNER, Role::Lessor),
                Pagination {
                    limit: 20,
                    offset: 0,
                },
            )
            .await
            .expect("list must succeed");
        assert_eq!(result.total, 1);
        assert_eq!(result.posts[0].id, 1);
    }

    fn actor(profile_id: i64, role: Role) -> Actor {
        Actor {
            profile_id,
            role,
            is_locked: false,
        }
    }

    fn sample_request() -> CreatePostRequest {
        CreatePostRequest {
            title: " Loft ".to_string(),
            description: "sunny".to_string(),
            price: 150_000,
            address: "Harbour 5".to_string(),
            latitude: 53.55,
            longitude: 9.99,
        }
    }
}
