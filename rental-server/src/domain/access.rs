use super::error::DomainError;
use super::post::Post;
use super::profile::{Profile, Role};

/// Caller of a mutating operation, resolved from the bearer token and the
/// profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Actor {
    pub(crate) profile_id: i64,
    pub(crate) role: Role,
    pub(crate) is_locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostPermission {
    Owner,
    OwnerOrAdmin,
}

impl Actor {
    pub(crate) fn from_profile(profile: &Profile) -> Self {
        Self {
            profile_id: profile.id,
            role: profile.role,
            is_locked: profile.is_locked(),
        }
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn ensure_unlocked(&self) -> Result<(), DomainError> {
        if self.is_locked {
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }
}

pub(crate) fn authorize_post(
    actor: &Actor,
    post: &Post,
    permission: PostPermission,
) -> Result<(), DomainError> {
    actor.ensure_unlocked()?;
    if post.is_owned_by(actor.profile_id) {
        return Ok(());
    }
    match permission {
        PostPermission::OwnerOrAdmin if actor.is_admin() => Ok(()),
        _ => Err(DomainError::Forbidden),
    }
}

pub(crate) fn require_admin(actor: &Actor) -> Result<(), DomainError> {
    actor.ensure_unlocked()?;
    if !actor.is_admin() {
        return Err(DomainError::Forbidden);
    }
    Ok(())
}

pub(crate) fn require_publisher(actor: &Actor) -> Result<(), DomainError> {
    actor.ensure_unlocked()?;
    if !actor.role.can_publish() {
        return Err(DomainError::Forbidden);
    }
    Ok(())
}

/// Admins may lock anyone except themselves and other admins.
pub(crate) fn authorize_lock(actor: &Actor, target: &Profile) -> Result<(), DomainError> {
    require_admin(actor)?;
    if target.id == actor.profile_id {
        return Err(DomainError::invalid("id", "cannot change lock state of own account"));
    }
    if target.role == Role::Admin {
        return Err(DomainError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{Actor, PostPermission, authorize_lock, authorize_post, require_admin, require_publisher};
    use crate::domain::error::DomainError;
    use crate::domain::post::{Post, PostStatus};
    use crate::domain::profile::{Profile, Role};

    #[test]
    fn owner_may_mutate_own_post() {
        let post = sample_post(10);
        authorize_post(&actor(10, Role::Lessor), &post, PostPermission::Owner)
            .expect("owner is allowed");
    }

    #[test]
    fn non_owner_non_admin_is_forbidden() {
        let post = sample_post(10);
        for permission in [PostPermission::Owner, PostPermission::OwnerOrAdmin] {
            let err = authorize_post(&actor(11, Role::Lessor), &post, permission)
                .expect_err("stranger must be rejected");
            assert!(matches!(err, DomainError::Forbidden));
        }
    }

    #[test]
    fn admin_bypasses_ownership_only_where_allowed() {
        let post = sample_post(10);
        let admin = actor(1, Role::Admin);
        authorize_post(&admin, &post, PostPermission::OwnerOrAdmin).expect("admin may bump");
        assert!(authorize_post(&admin, &post, PostPermission::Owner).is_err());
    }

    #[test]
    fn locked_owner_is_forbidden() {
        let post = sample_post(10);
        let mut owner = actor(10, Role::Lessor);
        owner.is_locked = true;
        let err = authorize_post(&owner, &post, PostPermission::Owner).expect_err("locked");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[test]
    fn renters_cannot_publish() {
        assert!(require_publisher(&actor(1, Role::Renter)).is_err());
        assert!(require_publisher(&actor(1, Role::Lessor)).is_ok());
    }

    #[test]
    fn require_admin_rejects_lessor() {
        let err = require_admin(&actor(1, Role::Lessor)).expect_err("not admin");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[test]
    fn admin_cannot_lock_self() {
        let admin = actor(1, Role::Admin);
        let err = authorize_lock(&admin, &sample_profile(1, Role::Admin)).expect_err("self lock");
        assert!(matches!(err, DomainError::InvalidInput { .. }));
    }

    #[test]
    fn admin_cannot_lock_other_admin() {
        let admin = actor(1, Role::Admin);
        let err = authorize_lock(&admin, &sample_profile(2, Role::Admin)).expect_err("admin");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[test]
    fn admin_can_lock_lessor() {
        let admin = actor(1, Role::Admin);
        authorize_lock(&admin, &sample_profile(2, Role::Lessor)).expect("lessor can be locked");
    }

    fn actor(profile_id: i64, role: Role) -> Actor {
        Actor {
            profile_id,
            role,
            is_locked: false,
        }
    }

    fn sample_profile(id: i64, role: Role) -> Profile {
        Profile {
            id,
            auth_user_id: Uuid::new_v4(),
            display_name: format!("user {id}"),
            phone: None,
            city: None,
            role,
            lock: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_post(created_by: i64) -> Post {
        let now = Utc::now();
        Post {
            id: 7,
            title: "title".to_string(),
            description: "description".to_string(),
            price: 1000,
            address: "address".to_string(),
            latitude: 1.0,
            longitude: 1.0,
            status: PostStatus::Active,
            expires_at: None,
            created_by,
            updated_by: None,
            deletion: None,
            created_at: now,
            updated_at: now,
        }
    }
}
