use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::post::PostStatus;
use crate::domain::profile::Role;
use crate::presentation::handlers::admin::{
    AdminPostDto, AdminPostsQuery, AdminPostsResponseDto, DeletePostDto, ForceStatusDto,
    LockUserDto, LockUserResponseDto, ProfileDto, StatsResponseDto, SuccessResponseDto,
};
use crate::presentation::handlers::cron::ExpirePostsResponseDto;
use crate::presentation::handlers::posts::{
    BumpResponseDto, CreatePostDto, ListPostsResponseDto, MapPostsResponseDto, MapQuery,
    MessageResponseDto, PaginationQuery, PostDto, ToggleVisibilityResponseDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::posts::list_map,
        crate::presentation::handlers::posts::get_post,
        crate::presentation::handlers::posts::list_mine,
        crate::presentation::handlers::posts::create_post,
        crate::presentation::handlers::posts::bump_post,
        crate::presentation::handlers::posts::toggle_visibility,
        crate::presentation::handlers::posts::mark_as_rented,
        crate::presentation::handlers::admin::list_posts,
        crate::presentation::handlers::admin::delete_post,
        crate::presentation::handlers::admin::force_status,
        crate::presentation::handlers::admin::lock_user,
        crate::presentation::handlers::admin::stats,
        crate::presentation::handlers::cron::expire_posts
    ),
    components(
        schemas(
            PostStatus,
            PostDto,
            CreatePostDto,
            MapQuery,
            PaginationQuery,
            MapPostsResponseDto,
            ListPostsResponseDto,
            BumpResponseDto,
            ToggleVisibilityResponseDto,
            MessageResponseDto,
            AdminPostsQuery,
            AdminPostDto,
            AdminPostsResponseDto,
            Role,
            ProfileDto,
            DeletePostDto,
            ForceStatusDto,
            LockUserDto,
            LockUserResponseDto,
            SuccessResponseDto,
            StatsResponseDto,
            ExpirePostsResponseDto
        )
    ),
    tags(
        (name = "posts", description = "Listing lifecycle endpoints"),
        (name = "admin", description = "Moderation endpoints"),
        (name = "cron", description = "Scheduled jobs")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
