//! HTTP handlers for the `/user` surface: signup, login, profile lookup,
//! username checks and profile image uploads.

pub mod auth;
pub mod error;
pub mod extract;
pub mod files;
pub mod routes;
pub mod session;
pub mod state;
pub mod token;
pub mod users;
pub mod validation;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, Settings};
