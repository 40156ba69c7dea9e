use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PostStatus {
    Active,
    Hidden,
    Rented,
    Expired,
    Deleted,
}

impl PostStatus {
    pub(crate) const ALL: [PostStatus; 5] = [
        PostStatus::Active,
        PostStatus::Hidden,
        PostStatus::Rented,
        PostStatus::Expired,
        PostStatus::Deleted,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Hidden => "hidden",
            PostStatus::Rented => "rented",
            PostStatus::Expired => "expired",
            PostStatus::Deleted => "deleted",
        }
    }

    #[cfg(test)]
    pub(crate) fn is_publicly_visible(self) -> bool {
        self == PostStatus::Active
    }

    /// Resolves the status a post moves to when `action` is applied to it.
    ///
    /// `Deleted` is terminal: every action on a deleted post is reported as a
    /// missing resource, except the user-facing actions which get a state error.
    pub(crate) fn apply(self, action: PostAction) -> Result<PostStatus, DomainError> {
        use PostStatus::*;

        let reject = DomainError::InvalidStateTransition { from: self, action };
        match action {
            PostAction::ToggleVisibility => match self {
                Active => Ok(Hidden),
                Hidden => Ok(Active),
                _ => Err(reject),
            },
            PostAction::Bump => match self {
                Active | Hidden | Expired => Ok(Active),
                Rented | Deleted => Err(reject),
            },
            PostAction::MarkRented => match self {
                Active => Ok(Rented),
                Rented => Err(DomainError::Conflict("post is already rented".to_string())),
                _ => Err(reject),
            },
            PostAction::Expire => match self {
                Active => Ok(Expired),
                _ => Err(reject),
            },
            PostAction::AdminDelete => match self {
                Deleted => Err(DomainError::NotFound("post".to_string())),
                _ => Ok(Deleted),
            },
            PostAction::ForceStatus(target) => {
                if self == Deleted {
                    return Err(DomainError::NotFound("post".to_string()));
                }
                if target == Deleted {
                    return Err(DomainError::invalid(
                        "status",
                        "use admin delete with a reason to delete a post",
                    ));
                }
                Ok(target)
            }
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PostStatus::Active),
            "hidden" => Ok(PostStatus::Hidden),
            "rented" => Ok(PostStatus::Rented),
            "expired" => Ok(PostStatus::Expired),
            "deleted" => Ok(PostStatus::Deleted),
            _ => Err(DomainError::invalid("status", "unknown post status")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostAction {
    ToggleVisibility,
    Bump,
    MarkRented,
    Expire,
    AdminDelete,
    ForceStatus(PostStatus),
}

impl fmt::Display for PostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostAction::ToggleVisibility => f.write_str("toggle visibility of"),
            PostAction::Bump => f.write_str("bump"),
            PostAction::MarkRented => f.write_str("mark as rented"),
            PostAction::Expire => f.write_str("expire"),
            PostAction::AdminDelete => f.write_str("delete"),
            PostAction::ForceStatus(target) => write!(f, "force status '{target}' on"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Deletion {
    pub(crate) reason: String,
    pub(crate) deleted_by: i64,
    pub(crate) deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: i64,
    pub(crate) address: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) status: PostStatus,
    pub(crate) expires_at: Option<DateTime<Utc>>,
    pub(crate) created_by: i64,
    pub(crate) updated_by: Option<i64>,
    pub(crate) deletion: Option<Deletion>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Post {
    pub(crate) fn is_owned_by(&self, profile_id: i64) -> bool {
        self.created_by == profile_id
    }

    pub(crate) fn is_deleted(&self) -> bool {
        self.status == PostStatus::Deleted
    }

    /// Shown on the public map: active and not past its deadline, even if the
    /// sweep has not run yet. The postgres map query encodes the same rule.
    #[cfg(test)]
    pub(crate) fn is_on_map(&self, now: DateTime<Utc>) -> bool {
        self.status.is_publicly_visible() && self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: i64,
    pub(crate) address: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > 255 {
            return Err(DomainError::invalid("title", "must be 1..255 chars"));
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(DomainError::invalid("description", "must not be empty"));
        }
        let address = self.address.trim();
        if address.is_empty() || address.chars().count() > 500 {
            return Err(DomainError::invalid("address", "must be 1..500 chars"));
        }
        if self.price < 0 {
            return Err(DomainError::invalid("price", "must be >= 0"));
        }
        validate_latitude("latitude", self.latitude)?;
        validate_longitude("longitude", self.longitude)?;

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            price: self.price,
            address: address.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

pub(crate) fn validate_post_id(id: i64) -> Result<i64, DomainError> {
    if id <= 0 {
        return Err(DomainError::invalid("id", "must be > 0"));
    }
    Ok(id)
}

pub(crate) fn validate_latitude(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || !(-90.0..=90.0).contains(&value) {
        return Err(DomainError::invalid(field, "must be within -90..90"));
    }
    Ok(())
}

pub(crate) fn validate_longitude(field: &'static str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || !(-180.0..=180.0).contains(&value) {
        return Err(DomainError::invalid(field, "must be within -180..180"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{CreatePostRequest, DomainError, PostAction, PostStatus};

    #[test]
    fn toggle_visibility_flips_between_active_and_hidden() {
        let hidden = PostStatus::Active
            .apply(PostAction::ToggleVisibility)
            .expect("active must toggle");
        assert_eq!(hidden, PostStatus::Hidden);

        let back = hidden
            .apply(PostAction::ToggleVisibility)
            .expect("hidden must toggle");
        assert_eq!(back, PostStatus::Active);
    }

    #[test]
    fn toggle_visibility_rejects_other_statuses() {
        for status in [PostStatus::Rented, PostStatus::Expired, PostStatus::Deleted] {
            let err = status
                .apply(PostAction::ToggleVisibility)
                .expect_err("toggle must be rejected");
            assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        }
    }

    #[test]
    fn bump_reactivates_renewable_statuses() {
        for status in [PostStatus::Active, PostStatus::Hidden, PostStatus::Expired] {
            assert_eq!(status.apply(PostAction::Bump).expect("bump"), PostStatus::Active);
        }
    }

    #[test]
    fn bump_rejects_rented_and_deleted() {
        for status in [PostStatus::Rented, PostStatus::Deleted] {
            let err = status.apply(PostAction::Bump).expect_err("bump must fail");
            assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        }
    }

    #[test]
    fn mark_rented_twice_is_a_conflict() {
        let rented = PostStatus::Active
            .apply(PostAction::MarkRented)
            .expect("first call must succeed");
        let err = rented
            .apply(PostAction::MarkRented)
            .expect_err("second call must fail");
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn mark_rented_requires_active() {
        let err = PostStatus::Hidden
            .apply(PostAction::MarkRented)
            .expect_err("hidden cannot be rented");
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
    }

    #[test]
    fn expire_only_applies_to_active() {
        assert_eq!(
            PostStatus::Active.apply(PostAction::Expire).expect("expire"),
            PostStatus::Expired
        );
        assert!(PostStatus::Hidden.apply(PostAction::Expire).is_err());
    }

    #[test]
    fn deleted_posts_cannot_be_deleted_or_forced() {
        let err = PostStatus::Deleted
            .apply(PostAction::AdminDelete)
            .expect_err("already deleted");
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = PostStatus::Deleted
            .apply(PostAction::ForceStatus(PostStatus::Active))
            .expect_err("deleted is terminal");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn force_status_refuses_deleted_target() {
        let err = PostStatus::Active
            .apply(PostAction::ForceStatus(PostStatus::Deleted))
            .expect_err("deleted target must go through admin delete");
        assert!(matches!(err, DomainError::InvalidInput { field: "status", .. }));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in PostStatus::ALL {
            assert_eq!(status.as_str().parse::<PostStatus>().expect("parse"), status);
        }
        assert!("pending".parse::<PostStatus>().is_err());
    }

    #[test]
    fn invalid_transition_message_names_status_and_action() {
        let err = PostStatus::Rented
            .apply(PostAction::Bump)
            .expect_err("rented cannot be bumped");
        assert_eq!(err.to_string(), "cannot bump a post in status 'rented'");
    }

    #[test]
    fn create_post_request_normalizes_fields() {
        let req = sample_request();
        let validated = req.validate().expect("must validate");
        assert_eq!(validated.title, "Cozy flat");
        assert_eq!(validated.address, "1 Main St");
    }

    #[test]
    fn create_post_request_rejects_out_of_range_coordinates() {
        let mut req = sample_request();
        req.latitude = 91.0;
        let err = req.validate().expect_err("latitude must be rejected");
        assert!(matches!(err, DomainError::InvalidInput { field: "latitude", .. }));

        let mut req = sample_request();
        req.longitude = f64::NAN;
        let err = req.validate().expect_err("longitude must be rejected");
        assert!(matches!(err, DomainError::InvalidInput { field: "longitude", .. }));
    }

    #[test]
    fn create_post_request_rejects_negative_price() {
        let mut req = sample_request();
        req.price = -1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn expired_deadline_hides_active_post_from_map() {
        let now = Utc::now();
        let mut post = super::Post {
            id: 1,
            title: "t".to_string(),
            description: "d".to_string(),
            price: 0,
            address: "a".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            status: PostStatus::Active,
            expires_at: Some(now - Duration::seconds(1)),
            created_by: 1,
            updated_by: None,
            deletion: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!post.is_on_map(now));
        post.expires_at = Some(now + Duration::days(1));
        assert!(post.is_on_map(now));
        post.status = PostStatus::Hidden;
        assert!(!post.is_on_map(now));
    }

    fn sample_request() -> CreatePostRequest {
        CreatePostRequest {
            title: "  Cozy flat  ".to_string(),
            description: " Two rooms ".to_string(),
            price: 120_000,
            address: " 1 Main St ".to_string(),
            latitude: 52.5,
            longitude: 13.4,
        }
    }
}
