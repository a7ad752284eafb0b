//! Bearer authentication for the booking API

pub mod jwt_auth;

pub use jwt_auth::{Identity, auth_middleware, create_token};
