use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use rand::Rng;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the signed cookie carrying the server-side session id.
pub const SESSION_COOKIE: &str = "qsapien.sid";

/// Server-side session resolved from the signed session cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token: Option<String>,
}

impl Session {
    /// Resolve the session named by the request's cookie, if it is still live.
    pub async fn load(state: &AppState, jar: &SignedCookieJar) -> Result<Option<Self>, ApiError> {
        let Some(id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Ok(None);
        };

        let row = state.run_db(move |db| db.get_session(&id)).await?;
        Ok(row.map(|row| Self {
            id: row.id,
            token: row.token,
        }))
    }

    /// Forget the token held by this session.
    pub async fn clear_token(&self, state: &AppState) -> Result<(), ApiError> {
        let id = self.id.clone();
        state.run_db(move |db| db.set_session_token(&id, None)).await
    }
}

/// Store `token` in the caller's session, opening a new session when the
/// request carried none. Returns the jar to send back with the response.
pub async fn store_token(
    state: &AppState,
    jar: SignedCookieJar,
    token: &str,
) -> Result<SignedCookieJar, ApiError> {
    let token = token.to_string();

    if let Some(session) = Session::load(state, &jar).await? {
        let id = session.id;
        state
            .run_db(move |db| db.set_session_token(&id, Some(token.as_str())))
            .await?;
        return Ok(jar);
    }

    let id = generate_session_id();
    let ttl_hours = state.settings.session_ttl_hours;
    let sid = id.clone();
    state
        .run_db(move |db| {
            db.create_session(&sid, ttl_hours)?;
            db.set_session_token(&sid, Some(token.as_str()))
        })
        .await?;
    debug!("opened session {}", id);

    let cookie = Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok(jar.add(cookie))
}

/// Generate a cryptographically random 32-byte hex session id.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}
