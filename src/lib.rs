use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use catalogue::CatalogueClient;
use config::Config;
use store::Store;

pub mod catalogue;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod result;
pub mod routes;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub catalogue: CatalogueClient,
    pub config: Config,
}

/// 构建完整路由，不包含 CORS
pub fn app(state: AppState) -> Router {
    // 公开路由
    let public_routes = Router::new()
        .route("/", get(routes::about::home))
        .route("/api/about", get(routes::about::about))
        .route("/api/register", post(routes::user::register))
        .route("/api/login", post(routes::user::login))
        .route("/api/logout", get(routes::user::logout))
        .route("/api/checkauth", get(routes::user::check_auth))
        .route("/api/shopping", get(routes::product::shopping))
        .route("/api/v1", get(routes::product::page_one))
        .route("/api/product/{id}", get(routes::product::product_by_id));

    // 需要会话的路由
    let protected_routes = Router::new()
        .route("/api/profile", get(routes::user::profile))
        .route("/api/user", get(routes::user::get_user))
        .route("/api/userEdit", put(routes::user::edit_user))
        .route("/api/buy/product", post(routes::purchase::buy_product))
        .route("/api/buy/purchases", get(routes::purchase::list_purchases))
        .route(
            "/api/buy/purchases/{id}",
            put(routes::purchase::add_purchase).delete(routes::purchase::delete_purchase),
        )
        .route("/api/about/Report", post(routes::about::submit_report))
        .route("/api/about/report", post(routes::about::submit_report))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 前端携带 cookie 访问，需要精确的来源而不是通配
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origin = HeaderValue::from_str(&config.cors_origin).unwrap_or_else(|_| {
        tracing::warn!(origin = %config.cors_origin, "Invalid CORS_ORIGIN, falling back to localhost");
        HeaderValue::from_static("http://localhost:3000")
    });

    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
