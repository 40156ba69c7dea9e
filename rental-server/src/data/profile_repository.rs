use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::profile::{Lock, Profile, Role};

#[derive(Debug, Clone)]
pub(crate) struct LockChange {
    pub(crate) lock: Option<Lock>,
    pub(crate) at: DateTime<Utc>,
}

#[async_trait]
pub(crate) trait ProfileRepository: Send + Sync {
    async fn find_by_auth_user(&self, auth_user_id: Uuid) -> Result<Option<Profile>, DomainError>;
    async fn get_profile(&self, id: i64) -> Result<Option<Profile>, DomainError>;
    async fn set_lock(&self, id: i64, change: LockChange) -> Result<Option<Profile>, DomainError>;
    async fn count_by_role(&self) -> Result<Vec<(Role, i64)>, DomainError>;
}
