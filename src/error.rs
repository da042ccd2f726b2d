use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::catalogue::CatalogueError;
use crate::store::StoreError;
use crate::utils::error_to_api_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    /// 会话缺失、格式错误、过期或签名无效，对客户端不区分原因
    #[error("unauthenticated")]
    Unauthenticated,
    /// 登录密码错误
    #[error("incorrect password")]
    Unauthorized,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("catalogue is empty")]
    EmptyCatalogue,
    #[error("upstream catalogue timed out")]
    UpstreamTimeout,
    #[error("upstream catalogue unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InsufficientBalance => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::EmptyCatalogue => StatusCode::NOT_FOUND,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给客户端的消息，不泄露内部细节
    fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Conflict(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Unauthenticated => "Authentication required.".into(),
            AppError::Unauthorized => "Incorrect password.".into(),
            AppError::InsufficientBalance => "Insufficient balance".into(),
            AppError::EmptyCatalogue => "The menu is currently empty.".into(),
            AppError::UpstreamTimeout => "External API took too long to respond.".into(),
            AppError::UpstreamUnavailable(_) => "Upstream service error.".into(),
            AppError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(detail) => tracing::error!(error = %detail, "Request failed"),
            AppError::UpstreamTimeout | AppError::UpstreamUnavailable(_) => {
                tracing::warn!(error = %self, "Catalogue request failed")
            }
            _ => tracing::debug!(error = %self, status = status.as_u16(), "Request rejected"),
        }

        (status, error_to_api_response(self.client_message())).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => {
                AppError::Conflict("This email is already registered. Please try logging in.".into())
            }
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::InsufficientBalance => AppError::InsufficientBalance,
            StoreError::Database(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<CatalogueError> for AppError {
    fn from(err: CatalogueError) -> Self {
        match err {
            CatalogueError::Timeout => AppError::UpstreamTimeout,
            CatalogueError::Unavailable(_) | CatalogueError::Malformed(_) => {
                AppError::UpstreamUnavailable(err.to_string())
            }
            CatalogueError::Empty => AppError::EmptyCatalogue,
            CatalogueError::NotFound(_) => AppError::NotFound("Product not found.".into()),
            CatalogueError::Client(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// 请求体缺失、不是 JSON 或字段类型不符，统一按校验错误返回 400
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token signing failed: {err}"))
    }
}
