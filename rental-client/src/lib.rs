//! Клиентская библиотека для работы с `rental-server` по HTTP.
//!
//! `RentalClient` хранит JWT-токен, выданный провайдером идентификации,
//! и подставляет его во все защищённые операции: публикацию, продление,
//! смену видимости, отметку «сдано» и модерацию.
#![warn(missing_docs)]

mod error;
mod http_client;
mod models;

pub use error::{RentalClientError, RentalClientResult};
pub use http_client::HttpClient;
pub use models::{
    AdminStats, BumpResponse, ListPostsResponse, LockResponse, MapBounds, MapPostsResponse,
    NewPost, Post, PostStatus,
};

#[derive(Debug, Clone)]
/// Клиент сервиса объявлений об аренде.
pub struct RentalClient {
    http: HttpClient,
    token: Option<String>,
}

impl RentalClient {
    /// Создаёт клиент для сервера по базовому URL, например `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> RentalClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
            token: None,
        })
    }

    /// Устанавливает JWT-токен.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Возвращает текущий JWT-токен, если он установлен.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Очищает сохранённый JWT-токен.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Активные объявления в видимой области карты.
    pub async fn list_map(
        &self,
        bounds: MapBounds,
        limit: Option<u32>,
    ) -> RentalClientResult<MapPostsResponse> {
        self.http.list_map(bounds, limit).await
    }

    /// Возвращает объявление по идентификатору. Удалённые объявления не видны.
    pub async fn get_post(&self, id: i64) -> RentalClientResult<Post> {
        self.http.get_post(id).await
    }

    /// Объявления текущего пользователя.
    ///
    /// Требует установленный JWT-токен.
    pub async fn list_mine(&self, limit: u32, offset: u32) -> RentalClientResult<ListPostsResponse> {
        let token = self.require_token()?;
        self.http.list_mine(token, limit, offset).await
    }

    /// Публикует объявление.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_post(&self, post: &NewPost) -> RentalClientResult<Post> {
        let token = self.require_token()?;
        self.http.create_post(token, post).await
    }

    /// Продлевает объявление.
    ///
    /// Требует установленный JWT-токен.
    pub async fn bump(&self, id: i64) -> RentalClientResult<BumpResponse> {
        let token = self.require_token()?;
        self.http.bump(token, id).await
    }

    /// Скрывает активное объявление или снова показывает скрытое.
    ///
    /// Требует установленный JWT-токен.
    pub async fn toggle_visibility(&self, id: i64) -> RentalClientResult<PostStatus> {
        let token = self.require_token()?;
        self.http.toggle_visibility(token, id).await
    }

    /// Отмечает объявление как сданное.
    ///
    /// Требует установленный JWT-токен.
    pub async fn mark_as_rented(&self, id: i64) -> RentalClientResult<()> {
        let token = self.require_token()?;
        self.http.mark_as_rented(token, id).await
    }

    /// Все объявления, включая удалённые. Только для администратора.
    pub async fn admin_list_posts(
        &self,
        status: Option<PostStatus>,
        limit: u32,
        offset: u32,
    ) -> RentalClientResult<ListPostsResponse> {
        let token = self.require_token()?;
        self.http.admin_list_posts(token, status, limit, offset).await
    }

    /// Удаляет объявление с указанием причины. Только для администратора.
    pub async fn admin_delete(&self, id: i64, reason: &str) -> RentalClientResult<bool> {
        let token = self.require_token()?;
        self.http.admin_delete(token, id, reason).await
    }

    /// Принудительно меняет статус объявления. Только для администратора.
    pub async fn force_status(&self, id: i64, status: PostStatus) -> RentalClientResult<Post> {
        let token = self.require_token()?;
        self.http.force_status(token, id, status).await
    }

    /// Блокирует или разблокирует профиль. Только для администратора.
    pub async fn lock_user(&self, profile_id: i64, is_locked: bool) -> RentalClientResult<LockResponse> {
        let token = self.require_token()?;
        self.http.lock_user(token, profile_id, is_locked).await
    }

    /// Счётчики объявлений и профилей. Только для администратора.
    pub async fn stats(&self) -> RentalClientResult<AdminStats> {
        let token = self.require_token()?;
        self.http.stats(token).await
    }

    /// Запускает обработку просроченных объявлений.
    ///
    /// Использует секрет планировщика, а не JWT пользователя.
    pub async fn expire_posts(&self, cron_secret: Option<&str>) -> RentalClientResult<u64> {
        self.http.expire_posts(cron_secret).await
    }

    fn require_token(&self) -> RentalClientResult<&str> {
        self.token.as_deref().ok_or(RentalClientError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::{RentalClient, RentalClientError};

    #[tokio::test]
    async fn protected_calls_need_token() {
        let client = RentalClient::new("http://127.0.0.1:9").expect("client");
        assert!(matches!(
            client.bump(1).await,
            Err(RentalClientError::Unauthorized)
        ));
        assert!(matches!(
            client.stats().await,
            Err(RentalClientError::Unauthorized)
        ));
    }

    #[test]
    fn token_can_be_replaced_and_cleared() {
        let mut client = RentalClient::new("http://127.0.0.1:9").expect("client");
        client.set_token("a");
        client.set_token("b");
        assert_eq!(client.get_token(), Some("b"));
        client.clear_token();
        assert!(client.get_token().is_none());
    }
}
