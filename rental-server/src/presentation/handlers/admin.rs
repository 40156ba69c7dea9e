use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::posts::{PostDto, json_body, query_params};
use crate::application::admin_service::AdminStats;
use crate::application::listing_service::ListPostsResult;
use crate::data::post_repository::Pagination;
use crate::domain::post::{Post, PostStatus};
use crate::domain::profile::{Profile, Role};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppResult, parse_id};
use crate::presentation::middleware::auth::CurrentActor;

const DEFAULT_ADMIN_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct DeletePostDto {
    pub(crate) reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ForceStatusDto {
    pub(crate) status: PostStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LockUserDto {
    pub(crate) is_locked: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct AdminPostsQuery {
    pub(crate) status: Option<PostStatus>,
    #[validate(range(min = 1, max = 200))]
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

/// A post as moderators see it, with the audit trail of the last change.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminPostDto {
    #[serde(flatten)]
    pub(crate) post: PostDto,
    pub(crate) updated_by: Option<i64>,
    pub(crate) deletion_reason: Option<String>,
    pub(crate) deleted_by: Option<i64>,
    pub(crate) deleted_at: Option<DateTime<Utc>>,
}

impl From<Post> for AdminPostDto {
    fn from(mut post: Post) -> Self {
        let deletion = post.deletion.take();
        let updated_by = post.updated_by;
        Self {
            post: PostDto::from(post),
            updated_by,
            deletion_reason: deletion.as_ref().map(|d| d.reason.clone()),
            deleted_by: deletion.as_ref().map(|d| d.deleted_by),
            deleted_at: deletion.as_ref().map(|d| d.deleted_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AdminPostsResponseDto {
    pub(crate) posts: Vec<AdminPostDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

impl From<ListPostsResult> for AdminPostsResponseDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(AdminPostDto::from).collect(),
            limit: result.pagination.limit,
            offset: result.pagination.offset,
            total: result.total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileDto {
    pub(crate) id: i64,
    pub(crate) display_name: String,
    pub(crate) phone: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) role: Role,
    pub(crate) is_locked: bool,
    pub(crate) locked_at: Option<DateTime<Utc>>,
    pub(crate) locked_by: Option<i64>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<Profile> for ProfileDto {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            is_locked: profile.is_locked(),
            locked_at: profile.lock.as_ref().map(|lock| lock.locked_at),
            locked_by: profile.lock.as_ref().map(|lock| lock.locked_by),
            display_name: profile.display_name,
            phone: profile.phone,
            city: profile.city,
            role: profile.role,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SuccessResponseDto {
    pub(crate) success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LockUserResponseDto {
    pub(crate) success: bool,
    pub(crate) is_locked: bool,
    pub(crate) message: String,
    pub(crate) profile: ProfileDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsResponseDto {
    pub(crate) posts_by_status: BTreeMap<String, i64>,
    pub(crate) profiles_by_role: BTreeMap<String, i64>,
}

impl From<AdminStats> for StatsResponseDto {
    fn from(stats: AdminStats) -> Self {
        // Every status and role is reported, zero when absent.
        let mut posts_by_status: BTreeMap<String, i64> = PostStatus::ALL
            .iter()
            .map(|status| (status.as_str().to_string(), 0))
            .collect();
        for (status, count) in stats.posts_by_status {
            posts_by_status.insert(status.as_str().to_string(), count);
        }

        let profiles_by_role = stats
            .profiles_by_role
            .into_iter()
            .map(|(role, count)| (role.as_str().to_string(), count))
            .collect();

        Self {
            posts_by_status,
            profiles_by_role,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/posts",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("status" = Option<PostStatus>, Query, description = "Filter by status"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=200)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "All posts, deleted included", body = AdminPostsResponseDto),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    query: Result<Query<AdminPostsQuery>, QueryRejection>,
) -> AppResult<(StatusCode, Json<AdminPostsResponseDto>)> {
    let query = query_params(query)?;
    query.validate()?;
    let pagination = Pagination {
        limit: query.limit.unwrap_or(DEFAULT_ADMIN_PAGE_SIZE),
        offset: query.offset.unwrap_or(0),
    };

    let result = state
        .admin
        .list_posts(&actor, query.status, pagination)
        .await?;

    Ok((StatusCode::OK, Json(AdminPostsResponseDto::from(result))))
}

#[utoipa::path(
    delete,
    path = "/api/admin/posts/{id}",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = DeletePostDto,
    responses(
        (status = 200, description = "Post soft-deleted", body = SuccessResponseDto),
        (status = 400, description = "Invalid id or reason"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Post not found or already deleted"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<DeletePostDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SuccessResponseDto>)> {
    let id = parse_id(&id)?;
    let dto = json_body(payload)?;

    state.admin.delete_post(&actor, id, &dto.reason).await?;

    Ok((StatusCode::OK, Json(SuccessResponseDto { success: true })))
}

#[utoipa::path(
    patch,
    path = "/api/admin/posts/{id}/status",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = ForceStatusDto,
    responses(
        (status = 200, description = "Status overridden", body = AdminPostDto),
        (status = 400, description = "Invalid id or status"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Post not found or deleted"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn force_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<ForceStatusDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AdminPostDto>)> {
    let id = parse_id(&id)?;
    let dto = json_body(payload)?;

    let post = state.admin.force_status(&actor, id, dto.status).await?;

    Ok((StatusCode::OK, Json(AdminPostDto::from(post))))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/lock",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Profile id")
    ),
    request_body = LockUserDto,
    responses(
        (status = 200, description = "Lock state updated", body = LockUserResponseDto),
        (status = 400, description = "Invalid id or own profile"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin or target is an admin"),
        (status = 404, description = "Profile not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn lock_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<LockUserDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<LockUserResponseDto>)> {
    let id = parse_id(&id)?;
    let dto = json_body(payload)?;

    let profile = state.admin.set_user_lock(&actor, id, dto.is_locked).await?;
    let is_locked = profile.is_locked();
    let message = if is_locked {
        "User locked"
    } else {
        "User unlocked"
    };

    Ok((
        StatusCode::OK,
        Json(LockUserResponseDto {
            success: true,
            is_locked,
            message: message.to_string(),
            profile: ProfileDto::from(profile),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Post and profile counters", body = StatsResponseDto),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn stats(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<(StatusCode, Json<StatsResponseDto>)> {
    let stats = state.admin.stats(&actor).await?;
    Ok((StatusCode::OK, Json(StatsResponseDto::from(stats))))
}
