mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::json;
use storefront::store::Store;

use common::{empty_request, json_request, session_cookie, spawn_app};

#[tokio::test]
async fn register_grants_starting_balance_and_hashes_password() {
    let app = spawn_app().await;

    let (status, body) = app.register("Alice", "alice@example.com", "pa55word").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let user = app
        .store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.balance, Decimal::from(5000));
    assert_ne!(user.password_hash, "pa55word");
    assert_eq!(user.age, Some(30));
}

#[tokio::test]
async fn register_accepts_capitalized_field_names() {
    let app = spawn_app().await;

    let (status, _, _) = app
        .send(json_request(
            Method::POST,
            "/api/register",
            json!({ "Name": "Bo", "Email": "bo@example.com", "Age": 22, "Password": "123456" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict_and_keeps_the_original() {
    let app = spawn_app().await;
    app.register("Alice", "alice@example.com", "pa55word").await;

    let (status, body) = app.register("Mallory", "alice@example.com", "other-pass").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let user = app
        .store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Alice");
}

#[tokio::test]
async fn register_validates_input() {
    let app = spawn_app().await;

    let (status, body) = app.register("", "x@example.com", "pa55word").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app.register("Xi", "not-an-email", "pa55word").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.register("Xi", "xi@example.com", "123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_never_issues_a_session() {
    let app = spawn_app().await;
    app.register("Alice", "alice@example.com", "pa55word").await;

    let (status, headers, body) = app
        .send(json_request(
            Method::POST,
            "/api/login",
            json!({ "email": "alice@example.com", "password": "wrong-one" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(session_cookie(&headers).is_none());
}

#[tokio::test]
async fn login_for_unknown_email_is_not_found() {
    let app = spawn_app().await;

    let (status, _, body) = app
        .send(json_request(
            Method::POST,
            "/api/login",
            json!({ "email": "ghost@example.com", "password": "whatever" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_without_credentials_is_rejected() {
    let app = spawn_app().await;

    let (status, _, _) = app
        .send(json_request(Method::POST, "/api/login", json!({ "email": "a@b.c" }), None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_sets_http_only_cookie_usable_for_profile() {
    let app = spawn_app().await;
    app.register("Alice", "alice@example.com", "pa55word").await;

    let (status, headers, _) = app
        .send(json_request(
            Method::POST,
            "/api/login",
            json!({ "email": "alice@example.com", "password": "pa55word" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let raw = headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap();
    assert!(raw.contains("HttpOnly"));
    assert!(!raw.contains("Secure"));

    let cookie = session_cookie(&headers).unwrap();
    let (status, _, body) = app
        .send(empty_request(Method::GET, "/api/profile", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["balance"].as_f64(), Some(5000.0));
}

#[tokio::test]
async fn protected_routes_reject_missing_or_forged_sessions() {
    let app = spawn_app().await;

    let (status, _, body) = app
        .send(empty_request(Method::GET, "/api/buy/purchases", None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _, _) = app
        .send(empty_request(Method::GET, "/api/user", Some("token=garbage")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = app.login_new_user("eve@example.com").await;
    let tampered = format!("{cookie}x");
    let (status, _, _) = app
        .send(empty_request(Method::GET, "/api/profile", Some(&tampered)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_reads_the_current_balance_not_the_token_snapshot() {
    let app = spawn_app().await;
    app.serve_catalogue(json!([{ "id": "b1", "name": "Burger", "price": 700 }]))
        .await;
    let cookie = app.login_new_user("carol@example.com").await;

    let (status, _, _) = app
        .send(json_request(
            Method::POST,
            "/api/buy/product",
            json!({ "productId": "b1" }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = app
        .send(empty_request(Method::GET, "/api/profile", Some(&cookie)))
        .await;
    assert_eq!(body["balance"].as_f64(), Some(4300.0));
}

#[tokio::test]
async fn user_page_returns_record_without_password_hash() {
    let app = spawn_app().await;
    let cookie = app.login_new_user("dave@example.com").await;

    let (status, _, body) = app
        .send(empty_request(Method::GET, "/api/user", Some(&cookie)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "dave@example.com");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = spawn_app().await;

    let (status, headers, body) = app
        .send(empty_request(Method::GET, "/api/logout", None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let raw = headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap();
    assert!(raw.starts_with("token="));
    assert!(raw.contains("Max-Age=0"));
}

#[tokio::test]
async fn check_auth_reports_session_state() {
    let app = spawn_app().await;

    let (status, _, body) = app
        .send(empty_request(Method::GET, "/api/checkauth", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isAuthenticated"], false);

    let cookie = app.login_new_user("frank@example.com").await;
    let (_, _, body) = app
        .send(empty_request(Method::GET, "/api/checkauth", Some(&cookie)))
        .await;
    assert_eq!(body["isAuthenticated"], true);
}

#[tokio::test]
async fn edit_profile_renames_and_blocks_taken_emails() {
    let app = spawn_app().await;
    app.register("Other", "taken@example.com", "pa55word").await;
    let cookie = app.login_new_user("gina@example.com").await;

    let (status, _, _) = app
        .send(json_request(
            Method::PUT,
            "/api/userEdit",
            json!({ "name": "Gina", "email": "taken@example.com" }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, body) = app
        .send(json_request(
            Method::PUT,
            "/api/userEdit",
            json!({ "name": "Gina R", "email": "gina.r@example.com" }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Gina R");
    assert_eq!(body["user"]["email"], "gina.r@example.com");
    assert!(
        app.store
            .find_user_by_email("gina@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn edit_profile_keeping_own_email_is_allowed() {
    let app = spawn_app().await;
    let cookie = app.login_new_user("hal@example.com").await;

    let (status, _, body) = app
        .send(json_request(
            Method::PUT,
            "/api/userEdit",
            json!({ "name": "Hal 9000", "email": "hal@example.com" }),
            Some(&cookie),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Hal 9000");
}

#[tokio::test]
async fn unreadable_bodies_get_the_error_envelope() {
    let app = spawn_app().await;

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": \"Ann\","))
        .unwrap();
    let (status, _, body) = app.send(malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let untyped = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .body(Body::from(json!({ "email": "a@b.c", "password": "secret" }).to_string()))
        .unwrap();
    let (status, _, body) = app.send(untyped).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _, body) = app
        .send(json_request(
            Method::POST,
            "/api/register",
            json!({ "name": "Ann", "email": "ann@example.com", "age": "thirty", "password": "secret-pass" }),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn login_trims_the_email_like_registration() {
    let app = spawn_app().await;
    let (status, _) = app.register("Pat", "  pat@example.com ", "secret-pass").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, headers, _) = app
        .send(json_request(
            Method::POST,
            "/api/login",
            json!({ "email": " pat@example.com  ", "password": "secret-pass" }),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(session_cookie(&headers).is_some());
}
