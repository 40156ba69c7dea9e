use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostRepository, StatusChange};
use crate::data::profile_repository::{LockChange, ProfileRepository};
use crate::domain::bounds::MapBounds;
use crate::domain::error::DomainError;
use crate::domain::post::{Deletion, Post, PostAction, PostStatus};
use crate::domain::profile::{Profile, Role};

#[derive(Clone, Default)]
pub(crate) struct MemoryPostRepo {
    posts: Arc<Mutex<BTreeMap<i64, Post>>>,
    writes: Arc<Mutex<u32>>,
    fail_with_upstream: Arc<Mutex<bool>>,
}

impl MemoryPostRepo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, post: Post) {
        self.posts
            .lock()
            .expect("posts mutex poisoned")
            .insert(post.id, post);
    }

    pub(crate) fn post(&self, id: i64) -> Option<Post> {
        self.posts
            .lock()
            .expect("posts mutex poisoned")
            .get(&id)
            .cloned()
    }

    pub(crate) fn remove(&self, id: i64) -> Option<Post> {
        self.posts.lock().expect("posts mutex poisoned").remove(&id)
    }

    pub(crate) fn write_count(&self) -> u32 {
        *self.writes.lock().expect("writes mutex poisoned")
    }

    pub(crate) fn fail_with_upstream(&self) {
        *self
            .fail_with_upstream
            .lock()
            .expect("fail flag mutex poisoned") = true;
    }

    fn check_upstream(&self) -> Result<(), DomainError> {
        if *self
            .fail_with_upstream
            .lock()
            .expect("fail flag mutex poisoned")
        {
            return Err(DomainError::Upstream(
                "connection refused: db.internal:5432".to_string(),
            ));
        }
        Ok(())
    }

    fn record_write(&self) {
        *self.writes.lock().expect("writes mutex poisoned") += 1;
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepo {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        self.check_upstream()?;
        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let id = posts.keys().next_back().copied().unwrap_or(0) + 1;
        let now = Utc::now();
        let post = Post {
            id,
            title: input.title,
            description: input.description,
            price: input.price,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            status: PostStatus::Active,
            expires_at: Some(input.expires_at),
            created_by: input.created_by,
            updated_by: Some(input.created_by),
            deletion: None,
            created_at: now,
            updated_at: now,
        };
        posts.insert(id, post.clone());
        drop(posts);
        self.record_write();
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        self.check_upstream()?;
        Ok(self.post(id))
    }

    async fn apply_status_change(
        &self,
        id: i64,
        change: StatusChange,
    ) -> Result<Option<Post>, DomainError> {
        self.check_upstream()?;
        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        if post.status != change.expected {
            return Ok(None);
        }

        post.status = change.status;
        if let Some(expires_at) = change.expires_at {
            post.expires_at = Some(expires_at);
        }
        post.updated_by = Some(change.actor_profile_id);
        post.updated_at = change.at;
        if let Some(reason) = change.deletion_reason {
            post.deletion = Some(Deletion {
                reason,
                deleted_by: change.actor_profile_id,
                deleted_at: change.at,
            });
        }
        let updated = post.clone();
        drop(posts);
        self.record_write();
        Ok(Some(updated))
    }

    async fn list_in_bounds(
        &self,
        bounds: MapBounds,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Post>, DomainError> {
        self.check_upstream()?;
        let posts = self.posts.lock().expect("posts mutex poisoned");
        Ok(posts
            .values()
            .rev()
            .filter(|post| post.is_on_map(now) && bounds.contains(post.latitude, post.longitude))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        self.check_upstream()?;
        let posts = self.posts.lock().expect("posts mutex poisoned");
        Ok(posts
            .values()
            .rev()
            .filter(|post| filter.matches(post))
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .cloned()
            .collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError> {
        self.check_upstream()?;
        let posts = self.posts.lock().expect("posts mutex poisoned");
        Ok(posts.values().filter(|post| filter.matches(post)).count() as i64)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        self.check_upstream()?;
        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let mut expired = 0;
        for post in posts.values_mut() {
            if !post.expires_at.is_some_and(|at| at < now) {
                continue;
            }
            if let Ok(next) = post.status.apply(PostAction::Expire) {
                post.status = next;
                post.updated_by = None;
                post.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn count_by_status(&self) -> Result<Vec<(PostStatus, i64)>, DomainError> {
        self.check_upstream()?;
        let posts = self.posts.lock().expect("posts mutex poisoned");
        Ok(PostStatus::ALL
            .into_iter()
            .map(|status| {
                let count = posts.values().filter(|post| post.status == status).count();
                (status, count as i64)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryProfileRepo {
    profiles: Arc<Mutex<BTreeMap<i64, Profile>>>,
}

impl MemoryProfileRepo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, profile: Profile) {
        self.profiles
            .lock()
            .expect("profiles mutex poisoned")
            .insert(profile.id, profile);
    }

    pub(crate) fn profile(&self, id: i64) -> Option<Profile> {
        self.profiles
            .lock()
            .expect("profiles mutex poisoned")
            .get(&id)
            .cloned()
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepo {
    async fn find_by_auth_user(&self, auth_user_id: Uuid) -> Result<Option<Profile>, DomainError> {
        let profiles = self.profiles.lock().expect("profiles mutex poisoned");
        Ok(profiles
            .values()
            .find(|profile| profile.auth_user_id == auth_user_id)
            .cloned())
    }

    async fn get_profile(&self, id: i64) -> Result<Option<Profile>, DomainError> {
        Ok(self.profile(id))
    }

    async fn set_lock(&self, id: i64, change: LockChange) -> Result<Option<Profile>, DomainError> {
        let mut profiles = self.profiles.lock().expect("profiles mutex poisoned");
        let Some(profile) = profiles.get_mut(&id) else {
            return Ok(None);
        };
        profile.lock = change.lock;
        profile.updated_at = change.at;
        Ok(Some(profile.clone()))
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, i64)>, DomainError> {
        let profiles = self.profiles.lock().expect("profiles mutex poisoned");
        Ok([Role::Admin, Role::Lessor, Role::Renter]
            .into_iter()
            .map(|role| {
                let count = profiles.values().filter(|p| p.role == role).count();
                (role, count as i64)
            })
            .collect())
    }
}

pub(crate) fn sample_profile(id: i64, role: Role) -> Profile {
    let now = Utc::now();
    Profile {
        id,
        auth_user_id: Uuid::new_v4(),
        display_name: format!("user {id}"),
        phone: None,
        city: Some("Berlin".to_string()),
        role,
        lock: None,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_post(
    id: i64,
    created_by: i64,
    status: PostStatus,
    expires_at: Option<DateTime<Utc>>,
) -> Post {
    let now = Utc::now();
    Post {
        id,
        title: format!("flat {id}"),
        description: "two rooms, balcony".to_string(),
        price: 95_000,
        address: "Main St 1".to_string(),
        latitude: 52.52,
        longitude: 13.40,
        status,
        expires_at,
        created_by,
        updated_by: None,
        deletion: None,
        created_at: now,
        updated_at: now,
    }
}
