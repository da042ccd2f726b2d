mod auth;
mod error_handler;

pub use auth::{AuthUser, SESSION_COOKIE, auth_middleware, session_user};
pub use error_handler::log_errors;
