//! Core module - infrastructure shared by the whole server:
//! authentication, configuration, errors and application state.

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

pub use auth::{Claims, authentication_middleware, decode_jwt, encode_jwt, require_role};
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
