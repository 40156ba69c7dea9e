use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `rental-client`.
pub enum RentalClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Требуется аутентификация (токен отсутствует или недействителен).
    #[error("unauthorized")]
    Unauthorized,

    /// Действие запрещено для текущего профиля.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос, недопустимый переход статуса или конфликт.
    #[error("invalid request ({code}): {message}")]
    InvalidRequest {
        /// Машинный код ошибки сервера, например `invalid_state_transition`.
        code: String,
        /// Текст ошибки.
        message: String,
    },

    /// Превышен лимит запросов.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Через сколько можно повторить запрос.
        retry_after: Option<Duration>,
    },

    /// Внутренняя ошибка сервера.
    #[error("server error: {0}")]
    Server(String),
}

/// Результат операций `rental-client`.
pub type RentalClientResult<T> = Result<T, RentalClientError>;

impl RentalClientError {
    pub(crate) fn from_http_status(
        status: reqwest::StatusCode,
        code: Option<String>,
        message: Option<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        let message = message.unwrap_or_else(|| format!("http status {status}"));
        match status {
            reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized,
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden(message),
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            reqwest::StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { retry_after },
            status if status.is_server_error() => Self::Server(message),
            _ => Self::InvalidRequest {
                code: code.unwrap_or_else(|| "invalid_input".to_string()),
                message,
            },
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None, None, None);
        }
        Self::Http(err)
    }
}
