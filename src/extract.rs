use axum::extract::FromRequest;

use crate::error::AppError;

/// 与 `axum::Json` 相同，但解析失败时返回统一的错误信封
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
