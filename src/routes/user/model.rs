use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    middleware::AuthUser,
    store::{NewUser, Store, StoreError, User},
    utils::{hash_password, verify_password},
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Age")]
    pub age: Option<i32>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

fn required(field: Option<String>, what: &str) -> Result<String, AppError> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{what} is required.")))
}

fn validate_email(email: &str) -> Result<(), AppError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::Validation("Email address is invalid.".into())),
    }
}

/// 注册新用户，初始余额来自配置；注册后不自动登录
pub async fn register_user(
    store: &dyn Store,
    config: &Config,
    req: RegisterRequest,
) -> Result<User, AppError> {
    let name = required(req.name, "Name")?;
    let email = required(req.email, "Email")?;
    validate_email(&email)?;
    let password = req
        .password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| AppError::Validation("Password is required.".into()))?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    if req.age.is_some_and(|age| age < 0) {
        return Err(AppError::Validation("Age must not be negative.".into()));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(StoreError::Conflict.into());
    }

    let password_hash = hash_password(&password, config.bcrypt_cost)?;
    let user = store
        .insert_user(NewUser {
            name,
            email,
            age: req.age,
            password_hash,
            balance: config.starting_balance,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Registered user");
    Ok(user)
}

/// 校验邮箱和密码；用户不存在返回 `NotFound`，密码错误返回 `Unauthorized`
pub async fn authenticate(store: &dyn Store, req: LoginRequest) -> Result<User, AppError> {
    let (Some(email), Some(password)) = (
        req.email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()),
        req.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(AppError::Validation(
            "Invalid credentials. Please provide both email and password.".into(),
        ));
    };

    let user = store.find_user_by_email(&email).await?.ok_or_else(|| {
        AppError::NotFound("User not found. Please try again or register.".into())
    })?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Rejected login with wrong password");
        return Err(AppError::Unauthorized);
    }

    Ok(user)
}

/// 修改调用者自己的名字和邮箱；新邮箱属于其他用户时返回 `Conflict`
pub async fn edit_profile(
    store: &dyn Store,
    caller: &AuthUser,
    req: EditUserRequest,
) -> Result<User, AppError> {
    let name = required(req.name, "Name")?;
    let email = required(req.email, "Email")?;
    validate_email(&email)?;

    if store.find_user_by_id(caller.id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    if let Some(owner) = store.find_user_by_email(&email).await? {
        if owner.id != caller.id {
            return Err(AppError::Conflict(
                "This email is already used by another account.".into(),
            ));
        }
    }

    let user = store
        .update_profile(caller.id, &name, &email)
        .await
        .map_err(|e| match e {
            StoreError::Conflict => {
                AppError::Conflict("This email is already used by another account.".into())
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "Updated user profile");
    Ok(user)
}
