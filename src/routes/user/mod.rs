mod handler;
mod model;

pub use handler::{check_auth, edit_user, get_user, login, logout, profile, register};
pub use model::{EditUserRequest, LoginRequest, RegisterRequest};
