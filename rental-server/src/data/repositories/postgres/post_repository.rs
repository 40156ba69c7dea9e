use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::map_db_error;
use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostRepository, StatusChange};
use crate::domain::bounds::MapBounds;
use crate::domain::error::DomainError;
use crate::domain::post::{Deletion, Post, PostAction, PostStatus};

const POST_COLUMNS: &str = r#"
    id,
    title,
    description,
    price,
    address,
    latitude,
    longitude,
    status,
    expires_at,
    created_by,
    updated_by,
    deletion_reason,
    deleted_by,
    deleted_at,
    created_at,
    updated_at
"#;

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    description: String,
    price: i64,
    address: String,
    latitude: f64,
    longitude: f64,
    status: String,
    expires_at: Option<DateTime<Utc>>,
    created_by: i64,
    updated_by: Option<i64>,
    deletion_reason: Option<String>,
    deleted_by: Option<i64>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO posts
                (title, description, price, address, latitude, longitude,
                 status, expires_at, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $8)
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.address)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.expires_at)
            .bind(input.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn apply_status_change(
        &self,
        id: i64,
        change: StatusChange,
    ) -> Result<Option<Post>, DomainError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET status = $3,
                expires_at = COALESCE($4, expires_at),
                updated_by = $5,
                updated_at = $6,
                deletion_reason = COALESCE($7, deletion_reason),
                deleted_by = CASE WHEN $7::text IS NULL THEN deleted_by ELSE $5 END,
                deleted_at = CASE WHEN $7::text IS NULL THEN deleted_at ELSE $6 END
            WHERE id = $1 AND status = $2
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(change.expected.as_str())
            .bind(change.status.as_str())
            .bind(change.expires_at)
            .bind(change.actor_profile_id)
            .bind(change.at)
            .bind(change.deletion_reason)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn list_in_bounds(
        &self,
        bounds: MapBounds,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Post>, DomainError> {
        let ranges = bounds.longitude_ranges();
        let first = ranges[0];
        let second = ranges.get(1).copied().unwrap_or(first);

        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE status = 'active'
              AND (expires_at IS NULL OR expires_at > $1)
              AND latitude BETWEEN $2 AND $3
              AND (longitude BETWEEN $4 AND $5 OR longitude BETWEEN $6 AND $7)
            ORDER BY created_at DESC, id DESC
            LIMIT $8
            "#
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(now)
            .bind(bounds.south)
            .bind(bounds.north)
            .bind(first.min)
            .bind(first.max)
            .bind(second.min)
            .bind(second.max)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR created_by = $2)
              AND ($3 OR status <> 'deleted')
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            OFFSET $5
            "#
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(filter.status.map(PostStatus::as_str))
            .bind(filter.created_by)
            .bind(filter.include_deleted)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::bigint IS NULL OR created_by = $2)
              AND ($3 OR status <> 'deleted')
            "#,
        )
        .bind(filter.status.map(PostStatus::as_str))
        .bind(filter.created_by)
        .bind(filter.include_deleted)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(count)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let from = PostStatus::Active;
        let to = from.apply(PostAction::Expire)?;

        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = $3,
                updated_by = NULL,
                updated_at = $1
            WHERE status = $2
              AND expires_at IS NOT NULL
              AND expires_at < $1
            "#,
        )
        .bind(now)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    async fn count_by_status(&self) -> Result<Vec<(PostStatus, i64)>, DomainError> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM posts
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter()
            .map(|row| {
                let status = row
                    .status
                    .parse::<PostStatus>()
                    .map_err(|err| DomainError::Upstream(err.to_string()))?;
                Ok((status, row.count))
            })
            .collect()
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    let status = row
        .status
        .parse::<PostStatus>()
        .map_err(|err| DomainError::Upstream(err.to_string()))?;

    let deletion = match (row.deletion_reason, row.deleted_by, row.deleted_at) {
        (Some(reason), Some(deleted_by), Some(deleted_at)) => Some(Deletion {
            reason,
            deleted_by,
            deleted_at,
        }),
        _ => None,
    };

    Ok(Post {
        id: row.id,
        title: row.title,
        description: row.description,
        price: row.price,
        address: row.address,
        latitude: row.latitude,
        longitude: row.longitude,
        status,
        expires_at: row.expires_at,
        created_by: row.created_by,
        updated_by: row.updated_by,
        deletion,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
