use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{RentalClientError, RentalClientResult};
use crate::models::{
    AdminStats, BumpResponse, ListPostsResponse, LockResponse, MapBounds, MapPostsResponse,
    NewPost, Post, PostStatus,
};

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToggleVisibilityResponseDto {
    status: PostStatus,
}

#[derive(Debug, Deserialize)]
struct SuccessResponseDto {
    success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpirePostsResponseDto {
    expired_count: u64,
}

#[derive(Debug, Deserialize)]
struct ListPostsResponseDto {
    posts: Vec<Post>,
    limit: u32,
    offset: u32,
    total: i64,
}

#[derive(Debug, Serialize)]
struct DeletePostRequestDto<'a> {
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct ForceStatusRequestDto {
    status: PostStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LockUserRequestDto {
    is_locked: bool,
}

#[derive(Serialize)]
struct MapQuery {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

#[derive(Serialize)]
struct PageQuery {
    limit: u32,
    offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<PostStatus>,
}

impl From<ListPostsResponseDto> for ListPostsResponse {
    fn from(value: ListPostsResponseDto) -> Self {
        Self {
            posts: value.posts,
            limit: value.limit,
            offset: value.offset,
            total: value.total.max(0) as u64,
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент для REST API `rental-server`.
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт новый HTTP-клиент с базовым URL сервера.
    pub fn new(base_url: impl Into<String>) -> RentalClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn decode_error(response: reqwest::Response) -> RentalClientError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let (code, message) = match response.json::<ErrorResponseDto>().await {
            Ok(body) => (body.code, body.error),
            Err(_) => (None, None),
        };
        RentalClientError::from_http_status(status, code, message, retry_after)
    }

    /// Отправляет подготовленный запрос и декодирует JSON-ответ.
    async fn execute<TRes>(&self, request: RequestBuilder) -> RentalClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(RentalClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<TRes>()
            .await
            .map_err(RentalClientError::from_reqwest)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// универсальный helper для запросов с json-payload
    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: Option<&str>,
    ) -> RentalClientResult<TRes>
    where
        TReq: Serialize,
        TRes: DeserializeOwned,
    {
        self.execute(self.request(method, path, token).json(body))
            .await
    }

    /// Возвращает активные объявления в видимой области карты.
    pub async fn list_map(
        &self,
        bounds: MapBounds,
        limit: Option<u32>,
    ) -> RentalClientResult<MapPostsResponse> {
        let query = MapQuery {
            south: bounds.south,
            west: bounds.west,
            north: bounds.north,
            east: bounds.east,
            limit,
        };
        self.execute(self.request(Method::GET, "/api/posts", None).query(&query))
            .await
    }

    /// Получает объявление по идентификатору.
    pub async fn get_post(&self, id: i64) -> RentalClientResult<Post> {
        self.execute(self.request(Method::GET, &format!("/api/posts/{id}"), None))
            .await
    }

    /// Возвращает объявления текущего пользователя.
    pub async fn list_mine(
        &self,
        token: &str,
        limit: u32,
        offset: u32,
    ) -> RentalClientResult<ListPostsResponse> {
        let query = PageQuery {
            limit,
            offset,
            status: None,
        };
        let dto: ListPostsResponseDto = self
            .execute(
                self.request(Method::GET, "/api/posts/mine", Some(token))
                    .query(&query),
            )
            .await?;
        Ok(dto.into())
    }

    /// Публикует объявление. Требует роль арендодателя или администратора.
    pub async fn create_post(&self, token: &str, post: &NewPost) -> RentalClientResult<Post> {
        self.send_json(Method::POST, "/api/posts", post, Some(token))
            .await
    }

    /// Продлевает объявление на две недели.
    pub async fn bump(&self, token: &str, id: i64) -> RentalClientResult<BumpResponse> {
        self.execute(self.request(
            Method::POST,
            &format!("/api/posts/{id}/bump"),
            Some(token),
        ))
        .await
    }

    /// Переключает видимость и возвращает новый статус.
    pub async fn toggle_visibility(&self, token: &str, id: i64) -> RentalClientResult<PostStatus> {
        let dto: ToggleVisibilityResponseDto = self
            .execute(self.request(
                Method::PATCH,
                &format!("/api/posts/{id}/toggle-visibility"),
                Some(token),
            ))
            .await?;
        Ok(dto.status)
    }

    /// Отмечает объявление как сданное.
    pub async fn mark_as_rented(&self, token: &str, id: i64) -> RentalClientResult<()> {
        let _: serde_json::Value = self
            .execute(self.request(
                Method::PATCH,
                &format!("/api/posts/{id}/mark-as-rented"),
                Some(token),
            ))
            .await?;
        Ok(())
    }

    /// Список всех объявлений для администратора, включая удалённые.
    pub async fn admin_list_posts(
        &self,
        token: &str,
        status: Option<PostStatus>,
        limit: u32,
        offset: u32,
    ) -> RentalClientResult<ListPostsResponse> {
        let query = PageQuery {
            limit,
            offset,
            status,
        };
        let dto: ListPostsResponseDto = self
            .execute(
                self.request(Method::GET, "/api/admin/posts", Some(token))
                    .query(&query),
            )
            .await?;
        Ok(dto.into())
    }

    /// Мягкое удаление объявления с указанием причины.
    pub async fn admin_delete(&self, token: &str, id: i64, reason: &str) -> RentalClientResult<bool> {
        let dto: SuccessResponseDto = self
            .send_json(
                Method::DELETE,
                &format!("/api/admin/posts/{id}"),
                &DeletePostRequestDto { reason },
                Some(token),
            )
            .await?;
        Ok(dto.success)
    }

    /// Принудительно устанавливает статус объявления.
    pub async fn force_status(
        &self,
        token: &str,
        id: i64,
        status: PostStatus,
    ) -> RentalClientResult<Post> {
        self.send_json(
            Method::PATCH,
            &format!("/api/admin/posts/{id}/status"),
            &ForceStatusRequestDto { status },
            Some(token),
        )
        .await
    }

    /// Блокирует или разблокирует профиль.
    pub async fn lock_user(
        &self,
        token: &str,
        profile_id: i64,
        is_locked: bool,
    ) -> RentalClientResult<LockResponse> {
        self.send_json(
            Method::PATCH,
            &format!("/api/admin/users/{profile_id}/lock"),
            &LockUserRequestDto { is_locked },
            Some(token),
        )
        .await
    }

    /// Счётчики объявлений и профилей.
    pub async fn stats(&self, token: &str) -> RentalClientResult<AdminStats> {
        self.execute(self.request(Method::GET, "/api/admin/stats", Some(token)))
            .await
    }

    /// Запускает переход просроченных объявлений в `expired`.
    /// Возвращает количество изменённых объявлений.
    pub async fn expire_posts(&self, cron_secret: Option<&str>) -> RentalClientResult<u64> {
        let dto: ExpirePostsResponseDto = self
            .execute(self.request(Method::GET, "/api/cron/expire-posts", cron_secret))
            .await?;
        Ok(dto.expired_count)
    }
}
