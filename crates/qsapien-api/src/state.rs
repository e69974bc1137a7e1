use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use tracing::error;

use qsapien_db::Database;

use crate::error::ApiError;

/// Handler-facing configuration.
#[derive(Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub session_secret: String,
    /// Directory profile images are written to.
    pub upload_dir: PathBuf,
    /// Public base URL that image URLs are built from.
    pub api_base_url: String,
    /// Accept a valid session token on login without checking credentials.
    pub trust_session_on_login: bool,
    pub session_ttl_hours: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jwt_secret: "qsapiensecret".into(),
            session_secret: "qsapien_session_secret".into(),
            upload_dir: PathBuf::from("./public/profileImages"),
            api_base_url: "http://localhost:3001".into(),
            trust_session_on_login: false,
            session_ttl_hours: 14 * 24,
        }
    }
}

// Secrets stay out of logs
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("jwt_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("upload_dir", &self.upload_dir)
            .field("api_base_url", &self.api_base_url)
            .field("trust_session_on_login", &self.trust_session_on_login)
            .field("session_ttl_hours", &self.session_ttl_hours)
            .finish()
    }
}

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub settings: Arc<Settings>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(db: Arc<Database>, settings: Settings) -> Self {
        // Cookie keys need 64 bytes; stretch whatever secret we were given.
        let digest = Sha512::digest(settings.session_secret.as_bytes());
        let cookie_key = Key::from(digest.as_slice());

        Self {
            db,
            settings: Arc::new(settings),
            cookie_key,
        }
    }

    /// Run a blocking DB call off the async runtime.
    pub async fn run_db<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(e.to_string())
            })?
            .map_err(ApiError::Database)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
