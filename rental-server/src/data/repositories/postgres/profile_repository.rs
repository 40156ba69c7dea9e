use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::map_db_error;
use crate::data::profile_repository::{LockChange, ProfileRepository};
use crate::domain::error::DomainError;
use crate::domain::profile::{Lock, Profile, Role};

#[derive(Debug, Clone)]
pub(crate) struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: i64,
    auth_user_id: Uuid,
    display_name: String,
    phone: Option<String>,
    city: Option<String>,
    role: String,
    is_locked: bool,
    locked_at: Option<DateTime<Utc>>,
    locked_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct RoleCountRow {
    role: String,
    count: i64,
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_by_auth_user(&self, auth_user_id: Uuid) -> Result<Option<Profile>, DomainError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                p.id,
                p.auth_user_id,
                p.display_name,
                p.phone,
                p.city,
                r.name AS role,
                p.is_locked,
                p.locked_at,
                p.locked_by,
                p.created_at,
                p.updated_at
            FROM profiles p
            JOIN roles r ON r.id = p.role_id
            WHERE p.auth_user_id = $1
            "#,
        )
        .bind(auth_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(map_row_to_profile).transpose()
    }

    async fn get_profile(&self, id: i64) -> Result<Option<Profile>, DomainError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT
                p.id,
                p.auth_user_id,
                p.display_name,
                p.phone,
                p.city,
                r.name AS role,
                p.is_locked,
                p.locked_at,
                p.locked_by,
                p.created_at,
                p.updated_at
            FROM profiles p
            JOIN roles r ON r.id = p.role_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(map_row_to_profile).transpose()
    }

    async fn set_lock(&self, id: i64, change: LockChange) -> Result<Option<Profile>, DomainError> {
        let (is_locked, locked_at, locked_by) = match &change.lock {
            Some(lock) => (true, Some(lock.locked_at), Some(lock.locked_by)),
            None => (false, None, None),
        };

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            WITH updated AS (
                UPDATE profiles
                SET is_locked = $2,
                    locked_at = $3,
                    locked_by = $4,
                    updated_at = $5
                WHERE id = $1
                RETURNING *
            )
            SELECT
                u.id,
                u.auth_user_id,
                u.display_name,
                u.phone,
                u.city,
                r.name AS role,
                u.is_locked,
                u.locked_at,
                u.locked_by,
                u.created_at,
                u.updated_at
            FROM updated u
            JOIN roles r ON r.id = u.role_id
            "#,
        )
        .bind(id)
        .bind(is_locked)
        .bind(locked_at)
        .bind(locked_by)
        .bind(change.at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(map_row_to_profile).transpose()
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, i64)>, DomainError> {
        let rows = sqlx::query_as::<_, RoleCountRow>(
            r#"
            SELECT r.name AS role, COUNT(p.id) AS count
            FROM roles r
            LEFT JOIN profiles p ON p.role_id = r.id
            GROUP BY r.name
            ORDER BY r.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter()
            .map(|row| {
                let role = row
                    .role
                    .parse::<Role>()
                    .map_err(|err| DomainError::Upstream(err.to_string()))?;
                Ok((role, row.count))
            })
            .collect()
    }
}

fn map_row_to_profile(row: ProfileRow) -> Result<Profile, DomainError> {
    let role = row
        .role
        .parse::<Role>()
        .map_err(|err| DomainError::Upstream(err.to_string()))?;

    let lock = match (row.is_locked, row.locked_at, row.locked_by) {
        (true, Some(locked_at), Some(locked_by)) => Some(Lock {
            locked_at,
            locked_by,
        }),
        (true, _, _) => {
            return Err(DomainError::Upstream(format!(
                "profile {} is locked without lock metadata",
                row.id
            )));
        }
        (false, _, _) => None,
    };

    Ok(Profile {
        id: row.id,
        auth_user_id: row.auth_user_id,
        display_name: row.display_name,
        phone: row.phone,
        city: row.city,
        role,
        lock,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
