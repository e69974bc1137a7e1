use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx answer; `body` is the server's JSON (or null).
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: Value },

    #[error("token storage: {0}")]
    Storage(#[from] std::io::Error),

    #[error("token encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ClientError {
    /// JSON payload carried by error actions: the server body when there is
    /// one, otherwise `{message}`.
    pub fn into_payload(self) -> Value {
        match self {
            ClientError::Status { body, .. } if !body.is_null() => body,
            other => serde_json::json!({ "message": other.to_string() }),
        }
    }
}
