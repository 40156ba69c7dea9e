use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::data::profile_repository::ProfileRepository;
use crate::domain::access::Actor;
use crate::domain::error::DomainError;

/// Turns an authenticated identity into an [`Actor`] the guard can reason about.
pub(crate) struct AccessService {
    profiles: Arc<dyn ProfileRepository>,
}

impl AccessService {
    pub(crate) fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    pub(crate) async fn resolve_actor(&self, auth_user_id: Uuid) -> Result<Actor, DomainError> {
        let profile = self
            .profiles
            .find_by_auth_user(auth_user_id)
            .await?
            .ok_or_else(|| {
                warn!(%auth_user_id, "authenticated user has no profile");
                DomainError::Forbidden
            })?;

        Ok(Actor::from_profile(&profile))
    }
}
