pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, optional_auth_middleware, AuthUser, Viewer};
pub use cors::cors_middleware;
