use axum::Json;
use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::result::{ApiResponse, EmptyResponse};
use crate::store::User;

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 会话令牌声明，balance 为签发时的快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub email: String,
    pub name: String,
    pub balance: Decimal,
    pub exp: i64, // 过期时间
    pub iat: i64, // 签发时间
}

pub fn generate_token(
    user: &User,
    config: &Config,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let issued_at = Utc::now().timestamp();
    let expiration = issued_at.saturating_add(config.jwt_expiration_secs);

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        balance: user.balance,
        exp: expiration,
        iat: issued_at,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    tracing::debug!(user_id = %user.id, expires_at = expiration, "Issued session token");
    Ok((token, expiration))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub fn success_to_api_response<T: Serialize>(
    message: impl Into<String>,
    data: T,
) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(message, data))
}

pub fn error_to_api_response(message: impl Into<String>) -> Json<ApiResponse<EmptyResponse>> {
    Json(ApiResponse::error(message))
}
