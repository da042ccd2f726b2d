use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    AppState,
    error::AppError,
    extract::AppJson,
    middleware::{AuthUser, SESSION_COOKIE, session_user},
    result::EmptyResponse,
    utils::{generate_token, success_to_api_response},
};

use super::model::{
    CheckAuthResponse, EditUserRequest, LoginRequest, ProfileResponse, RegisterRequest,
    UserResponse, authenticate, edit_profile, register_user,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    register_user(state.store.as_ref(), &state.config, req).await?;

    Ok((
        StatusCode::CREATED,
        success_to_api_response(
            "Registration successful. You can now log in.",
            EmptyResponse {},
        ),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate(state.store.as_ref(), req).await?;
    let (token, _) = generate_token(&user, &state.config)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(state.config.is_production())
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(state.config.jwt_expiration_secs));

    tracing::info!(user_id = %user.id, "User logged in");
    Ok((
        jar.add(cookie),
        success_to_api_response("Login successful", EmptyResponse {}),
    ))
}

/// 只清除客户端 cookie，令牌在过期前仍然有效
#[axum::debug_handler]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .build();
    cookie.make_removal();

    (
        jar.add(cookie),
        success_to_api_response("Success Logout", EmptyResponse {}),
    )
}

#[axum::debug_handler]
pub async fn check_auth(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let user = session_user(&jar, &state.config);
    success_to_api_response(
        "Authentication status",
        CheckAuthResponse {
            is_authenticated: user.is_some(),
            user_id: user.map(|user| user.id),
        },
    )
}

/// 余额以存储为准，不使用令牌中的快照
#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user_by_id(caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    Ok(success_to_api_response(
        "Profile loaded",
        ProfileResponse {
            balance: user.balance,
        },
    ))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user_by_id(caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    Ok(success_to_api_response("User Page", UserResponse { user }))
}

#[axum::debug_handler]
pub async fn edit_user(
    State(state): State<AppState>,
    caller: AuthUser,
    AppJson(req): AppJson<EditUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = edit_profile(state.store.as_ref(), &caller, req).await?;

    Ok(success_to_api_response(
        "User updated successfully",
        UserResponse { user },
    ))
}
