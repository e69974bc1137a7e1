use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

use qsapien_api::Settings;

/// Placeholder secrets that should never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["qsapiensecret", "qsapien_session_secret"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Directory served as static files (uploaded images live below it).
    pub public_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Settings::default();

        let port: u16 = env_or("PORT", "3001")
            .parse()
            .context("PORT must be a port number")?;
        let trust_session_on_login = env_or("QSAPIEN_TRUST_SESSION_ON_LOGIN", "false")
            .parse()
            .context("QSAPIEN_TRUST_SESSION_ON_LOGIN must be true or false")?;
        let session_ttl_hours = env_or("QSAPIEN_SESSION_TTL_HOURS", "336")
            .parse()
            .context("QSAPIEN_SESSION_TTL_HOURS must be a number of hours")?;

        let settings = Settings {
            jwt_secret: env_or("JWT_SECRET", &defaults.jwt_secret),
            session_secret: env_or("SESSION_SECRET", &defaults.session_secret),
            upload_dir: env_or("PROFILE_IMAGES_DEST", "./public/profileImages").into(),
            api_base_url: env_or("API_URL", &defaults.api_base_url),
            trust_session_on_login,
            session_ttl_hours,
        };

        for secret in [&settings.jwt_secret, &settings.session_secret] {
            if PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
                warn!("Running with a built-in placeholder secret; set JWT_SECRET and SESSION_SECRET");
                break;
            }
        }
        if settings.trust_session_on_login {
            warn!("Login accepts session tokens without checking credentials");
        }

        Ok(Self {
            host: env_or("QSAPIEN_HOST", "0.0.0.0"),
            port,
            db_path: env_or("QSAPIEN_DB_PATH", "qsapien.db").into(),
            public_dir: env_or("QSAPIEN_PUBLIC_DIR", "./public").into(),
            settings,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
