use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::error::DomainError;
use crate::infrastructure::secret::secrets_match;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::bearer_token;
use crate::presentation::{AppState, CronAuth};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExpirePostsResponseDto {
    pub(crate) success: bool,
    pub(crate) expired_count: u64,
}

fn check_cron_auth(cron: &CronAuth, headers: &HeaderMap) -> AppResult<()> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    match (&cron.secret, provided) {
        (Some(expected), Some(provided)) if secrets_match(provided, expected) => Ok(()),
        (Some(_), _) => {
            warn!("cron trigger rejected: bad or missing secret");
            Err(DomainError::Unauthenticated.into())
        }
        (None, _) if cron.required => {
            warn!("cron trigger rejected: no secret configured");
            Err(DomainError::Unauthenticated.into())
        }
        (None, _) => Ok(()),
    }
}

#[utoipa::path(
    get,
    path = "/api/cron/expire-posts",
    tag = "cron",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Sweep finished", body = ExpirePostsResponseDto),
        (status = 401, description = "Missing or wrong cron secret"),
        (status = 429, description = "Rate limited"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn expire_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<ExpirePostsResponseDto>)> {
    check_cron_auth(&state.cron, &headers)?;

    let expired_count = state.expiry.expire_posts(Utc::now()).await?;

    Ok((
        StatusCode::OK,
        Json(ExpirePostsResponseDto {
            success: true,
            expired_count,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::check_cron_auth;
    use crate::domain::error::DomainError;
    use crate::presentation::CronAuth;
    use crate::presentation::app_error::AppError;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header"),
        );
        headers
    }

    #[test]
    fn configured_secret_must_match() {
        let cron = CronAuth {
            secret: Some("s3cret".into()),
            required: true,
        };
        assert!(check_cron_auth(&cron, &headers("Bearer s3cret")).is_ok());
        assert!(check_cron_auth(&cron, &headers("Bearer nope")).is_err());
        assert!(check_cron_auth(&cron, &HeaderMap::new()).is_err());
    }

    #[test]
    fn missing_secret_is_open_only_when_not_required() {
        let dev = CronAuth {
            secret: None,
            required: false,
        };
        assert!(check_cron_auth(&dev, &HeaderMap::new()).is_ok());

        let prod = CronAuth {
            secret: None,
            required: true,
        };
        assert!(check_cron_auth(&prod, &headers("Bearer anything")).is_err());
    }

    #[test]
    fn wrong_secret_is_reported_as_unauthenticated() {
        let cron = CronAuth {
            secret: Some("s3cret".into()),
            required: true,
        };
        let err = check_cron_auth(&cron, &headers("Bearer nope")).expect_err("must reject");
        assert!(matches!(
            err,
            AppError::Domain(DomainError::Unauthenticated)
        ));
    }
}
