use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::debug;

use qsapien_types::api::SessionToken;

use crate::error::ClientError;

/// Persistent slot for the login token, kept as JSON on disk. Without a path
/// the token only lives in memory.
pub struct TokenStorage {
    path: Option<PathBuf>,
    cached: Mutex<Option<SessionToken>>,
}

impl TokenStorage {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            cached: Mutex::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            cached: Mutex::new(None),
        }
    }

    pub async fn save(&self, token: &SessionToken) -> Result<(), ClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, serde_json::to_vec(token)?).await?;
            debug!("token saved to {}", path.display());
        }
        *cached = Some(token.clone());
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<SessionToken>, ClientError> {
        let mut cached = self.cached.lock().await;
        if cached.is_some() {
            return Ok(cached.clone());
        }
        let Some(path) = &self.path else {
            return Ok(None);
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let token: SessionToken = serde_json::from_slice(&bytes)?;
                *cached = Some(token.clone());
                Ok(Some(token))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn clear(&self) -> Result<(), ClientError> {
        let mut cached = self.cached.lock().await;
        *cached = None;
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
