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

use crate::application::listing_service::ListPostsResult;
use crate::data::post_repository::Pagination;
use crate::domain::bounds::MapBounds;
use crate::domain::post::{CreatePostRequest, Post, PostStatus};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppError, AppResult, parse_id};
use crate::presentation::middleware::auth::CurrentActor;

const DEFAULT_MAP_LIMIT: u32 = 200;
const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) description: String,
    #[validate(range(min = 0))]
    pub(crate) price: i64,
    #[validate(length(min = 1, max = 500))]
    pub(crate) address: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct MapQuery {
    pub(crate) south: f64,
    pub(crate) west: f64,
    pub(crate) north: f64,
    pub(crate) east: f64,
    #[validate(range(min = 1, max = 500))]
    pub(crate) limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct PaginationQuery {
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

impl PaginationQuery {
    pub(crate) fn pagination(&self) -> Pagination {
        Pagination {
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: self.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostDto {
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
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MapPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) crosses_antimeridian: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BumpResponseDto {
    pub(crate) message: String,
    pub(crate) expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ToggleVisibilityResponseDto {
    pub(crate) message: String,
    pub(crate) status: PostStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MessageResponseDto {
    pub(crate) message: String,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            price: post.price,
            address: post.address,
            latitude: post.latitude,
            longitude: post.longitude,
            status: post.status,
            expires_at: post.expires_at,
            created_by: post.created_by,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<ListPostsResult> for ListPostsResponseDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostDto::from).collect(),
            limit: result.pagination.limit,
            offset: result.pagination.offset,
            total: result.total,
        }
    }
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(
        ("south" = f64, Query, description = "Southern latitude of the viewport"),
        ("west" = f64, Query, description = "Western longitude; greater than east when crossing the antimeridian"),
        ("north" = f64, Query, description = "Northern latitude of the viewport"),
        ("east" = f64, Query, description = "Eastern longitude"),
        ("limit" = Option<u32>, Query, description = "Max posts (1..=500)")
    ),
    responses(
        (status = 200, description = "Active posts inside the viewport", body = MapPostsResponseDto),
        (status = 400, description = "Invalid bounds"),
        (status = 429, description = "Rate limited"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_map(
    State(state): State<AppState>,
    query: Result<Query<MapQuery>, QueryRejection>,
) -> AppResult<(StatusCode, Json<MapPostsResponseDto>)> {
    let query = query_params(query)?;
    query.validate()?;
    let bounds = MapBounds::new(query.south, query.west, query.north, query.east)?;
    let limit = query.limit.unwrap_or(DEFAULT_MAP_LIMIT);

    let posts = state.listing.list_map(bounds, limit).await?;

    Ok((
        StatusCode::OK,
        Json(MapPostsResponseDto {
            posts: posts.into_iter().map(PostDto::from).collect(),
            crosses_antimeridian: bounds.crosses_antimeridian(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let id = parse_id(&id)?;
    let post = state.listing.get_post(id).await?;

    Ok((StatusCode::OK, Json(PostDto::from(post))))
}

#[utoipa::path(
    get,
    path = "/api/posts/mine",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Caller's posts", body = ListPostsResponseDto),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "No profile"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_mine(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> AppResult<(StatusCode, Json<ListPostsResponseDto>)> {
    let query = query_params(query)?;
    query.validate()?;
    let result = state
        .listing
        .list_mine(&actor, query.pagination())
        .await?;

    Ok((StatusCode::OK, Json(ListPostsResponseDto::from(result))))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Role may not publish"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<CreatePostDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let dto = json_body(payload)?;
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        description: dto.description,
        price: dto.price,
        address: dto.address,
        latitude: dto.latitude,
        longitude: dto.longitude,
    };

    let post = state.listing.create_post(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(PostDto::from(post))))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/bump",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post renewed", body = BumpResponseDto),
        (status = 400, description = "Invalid id or status"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not owner or admin"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn bump_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<BumpResponseDto>)> {
    let id = parse_id(&id)?;
    let result = state.listing.bump(&actor, id).await?;

    Ok((
        StatusCode::OK,
        Json(BumpResponseDto {
            message: "Post renewed".to_string(),
            expires_at: result.expires_at,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}/toggle-visibility",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Visibility toggled", body = ToggleVisibilityResponseDto),
        (status = 400, description = "Invalid id or status"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn toggle_visibility(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<ToggleVisibilityResponseDto>)> {
    let id = parse_id(&id)?;
    let status = state.listing.toggle_visibility(&actor, id).await?;

    let message = match status {
        PostStatus::Hidden => "Post hidden",
        _ => "Post visible",
    };
    Ok((
        StatusCode::OK,
        Json(ToggleVisibilityResponseDto {
            message: message.to_string(),
            status,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}/mark-as-rented",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post marked as rented", body = MessageResponseDto),
        (status = 400, description = "Invalid id, status or already rented"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn mark_as_rented(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<MessageResponseDto>)> {
    let id = parse_id(&id)?;
    state.listing.mark_rented(&actor, id).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponseDto {
            message: "Post marked as rented".to_string(),
        }),
    ))
}
