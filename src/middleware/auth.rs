use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{AppState, config::Config, error::AppError, utils::verify_token};

/// 会话 cookie 名
pub const SESSION_COOKIE: &str = "token";

/// 已通过会话校验的调用者，只能由认证中间件产生
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// 签发时的余额快照，可能已过期，需要当前余额时必须重新查询
    pub balance_at_issue: Decimal,
}

/// 解析并校验 cookie 中的会话令牌，任何失败都视为未登录
pub fn session_user(jar: &CookieJar, config: &Config) -> Option<AuthUser> {
    let token = jar.get(SESSION_COOKIE)?.value();

    let claims = match verify_token(token, config) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected session token: {}", e);
            return None;
        }
    };

    let id = Uuid::parse_str(&claims.sub).ok()?;
    Some(AuthUser {
        id,
        email: claims.email,
        name: claims.name,
        balance_at_issue: claims.balance,
    })
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = session_user(&jar, &state.config).ok_or(AppError::Unauthenticated)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
