#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use httpmock::MockServer;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use storefront::{
    AppState, app, catalogue::CatalogueClient, config::Config, store::MemoryStore,
};
use tower::ServiceExt;

pub const CATALOGUE_PATH: &str = "/menu";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub upstream: MockServer,
}

pub fn test_config(catalogue_url: String) -> Config {
    Config {
        database_url: None,
        jwt_secret: "test-secret".into(),
        jwt_expiration_secs: 3 * 3600,
        catalogue_url,
        catalogue_timeout_secs: 5,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        environment: "test".into(),
        cors_origin: "http://localhost:3000".into(),
        bcrypt_cost: 4,
        starting_balance: Decimal::from(5000),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_timeout(Duration::from_secs(5)).await
}

pub async fn spawn_app_with_timeout(timeout: Duration) -> TestApp {
    let upstream = MockServer::start_async().await;
    let config = test_config(upstream.url(CATALOGUE_PATH));
    let store = Arc::new(MemoryStore::new());
    let catalogue = CatalogueClient::new(config.catalogue_url.clone(), timeout).unwrap();

    let router = app(AppState {
        store: store.clone(),
        catalogue,
        config,
    });

    TestApp {
        router,
        store,
        upstream,
    }
}

impl TestApp {
    /// 上游目录返回给定的 JSON
    pub async fn serve_catalogue(&self, body: Value) {
        self.upstream
            .mock_async(|when, then| {
                when.path(CATALOGUE_PATH);
                then.status(200).json_body(body);
            })
            .await;
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
        let (status, _, body) = self
            .send(json_request(
                Method::POST,
                "/api/register",
                json!({ "name": name, "email": email, "age": 30, "password": password }),
                None,
            ))
            .await;
        (status, body)
    }

    /// 注册并登录，返回可直接放入 Cookie 请求头的会话
    pub async fn login_new_user(&self, email: &str) -> String {
        let (status, _) = self.register("Tester", email, "secret-pass").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, headers, _) = self
            .send(json_request(
                Method::POST,
                "/api/login",
                json!({ "email": email, "password": "secret-pass" }),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        session_cookie(&headers).expect("login sets the session cookie")
    }
}

/// 取出 Set-Cookie 中的 `token=...` 部分
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("token="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn json_request(method: Method, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}
