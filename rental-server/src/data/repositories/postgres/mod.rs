pub(crate) mod post_repository;
pub(crate) mod profile_repository;

use crate::domain::error::DomainError;

pub(super) fn map_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        return DomainError::NotFound("profile".to_string());
    }
    DomainError::Upstream(err.to_string())
}
