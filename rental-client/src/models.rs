use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Статус объявления.
pub enum PostStatus {
    /// Видно на карте до истечения срока.
    Active,
    /// Скрыто владельцем.
    Hidden,
    /// Сдано.
    Rented,
    /// Срок публикации истёк.
    Expired,
    /// Удалено модератором.
    Deleted,
}

impl PostStatus {
    /// Строковое представление, совпадающее с API.
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Hidden => "hidden",
            PostStatus::Rented => "rented",
            PostStatus::Expired => "expired",
            PostStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(PostStatus::Active),
            "hidden" => Ok(PostStatus::Hidden),
            "rented" => Ok(PostStatus::Rented),
            "expired" => Ok(PostStatus::Expired),
            "deleted" => Ok(PostStatus::Deleted),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Публичная модель объявления.
pub struct Post {
    /// Идентификатор объявления.
    pub id: i64,
    /// Заголовок.
    pub title: String,
    /// Описание.
    pub description: String,
    /// Цена в минимальных единицах валюты.
    pub price: i64,
    /// Адрес.
    pub address: String,
    /// Широта.
    pub latitude: f64,
    /// Долгота.
    pub longitude: f64,
    /// Текущий статус.
    pub status: PostStatus,
    /// Крайний срок публикации (UTC).
    pub expires_at: Option<DateTime<Utc>>,
    /// Профиль владельца.
    pub created_by: i64,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
    /// Дата и время последнего изменения (UTC).
    pub updated_at: DateTime<Utc>,
    /// Причина удаления; заполняется только в ответах админ-API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Данные для создания объявления.
pub struct NewPost {
    /// Заголовок (1..=255 символов).
    pub title: String,
    /// Описание.
    pub description: String,
    /// Цена, не меньше нуля.
    pub price: i64,
    /// Адрес (1..=500 символов).
    pub address: String,
    /// Широта.
    pub latitude: f64,
    /// Долгота.
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
/// Видимая область карты. `west > east` означает пересечение антимеридиана.
pub struct MapBounds {
    /// Южная граница.
    pub south: f64,
    /// Западная граница.
    pub west: f64,
    /// Северная граница.
    pub north: f64,
    /// Восточная граница.
    pub east: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Ответ карты.
pub struct MapPostsResponse {
    /// Активные объявления в области.
    pub posts: Vec<Post>,
    /// Пересекает ли область антимеридиан.
    pub crosses_antimeridian: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Ответ списка объявлений с параметрами пагинации.
pub struct ListPostsResponse {
    /// Объявления на текущей странице.
    pub posts: Vec<Post>,
    /// Размер страницы.
    pub limit: u32,
    /// Смещение от начала выборки.
    pub offset: u32,
    /// Общее количество.
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Результат продления.
pub struct BumpResponse {
    /// Сообщение сервера.
    pub message: String,
    /// Новый крайний срок.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Результат блокировки или разблокировки пользователя.
pub struct LockResponse {
    /// Успех операции.
    pub success: bool,
    /// Итоговое состояние блокировки.
    pub is_locked: bool,
    /// Сообщение сервера.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Счётчики для панели администратора.
pub struct AdminStats {
    /// Количество объявлений по статусам.
    pub posts_by_status: BTreeMap<String, i64>,
    /// Количество профилей по ролям.
    pub profiles_by_role: BTreeMap<String, i64>,
}
