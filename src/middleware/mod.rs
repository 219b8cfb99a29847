pub mod admin;
pub mod auth;
pub mod error_handling;

pub use admin::admin_middleware;
pub use auth::{auth_middleware, Claims, JwtService};
