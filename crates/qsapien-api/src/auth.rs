use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use axum_extra::extract::cookie::SignedCookieJar;
use tracing::{debug, error, info};
use uuid::Uuid;

use qsapien_db::models::NewUser;
use qsapien_types::api::{LoginRequest, LoginResponse, SessionToken, SignupRequest, SignupResponse};

use crate::error::ApiError;
use crate::extract::FormOrJson;
use crate::session::{self, Session};
use crate::state::AppState;
use crate::token::{create_token, verify_token};
use crate::validation::{validate_login, validate_signup};

pub const SIGNUP_OK: &str = "user completed signup successfully";
pub const SIGNUP_INVALID: &str = "error occured";
pub const DUPLICATE_EMAIL: &str = "email id already exists";
pub const LOGIN_OK: &str = "user verified successfully";
pub const LOGIN_INVALID: &str = "error occured while verifying user";
pub const NOT_REGISTERED: &str = "email id is not registered";
pub const PASSWORD_MISMATCH: &str = "Password does not match with given email address";

pub async fn signup(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    FormOrJson(req): FormOrJson<SignupRequest>,
) -> Result<(SignedCookieJar, Json<SignupResponse>), ApiError> {
    info!("user signup request");

    let signup = validate_signup(req).map_err(|errors| {
        debug!(?errors, "signup validation failed");
        ApiError::Validation {
            message: SIGNUP_INVALID,
            errors,
        }
    })?;
    debug!(email = %signup.email_id, username = %signup.username, "signup data");

    // Check if email is taken
    let email = signup.email_id.clone();
    if state
        .run_db(move |db| db.get_user_by_email(&email))
        .await?
        .is_some()
    {
        info!("email id already in use");
        return Err(ApiError::BadRequest(DUPLICATE_EMAIL.into()));
    }

    let password_hash = hash_password(&signup.password)?;
    let user_id = Uuid::new_v4().to_string();
    // Nothing past the insert may fail the request
    let token = issue_token(&state, &user_id)?;

    let new_user = NewUser {
        id: user_id.clone(),
        first_name: signup.first_name,
        last_name: signup.last_name,
        email_id: signup.email_id,
        username: signup.username,
        password: password_hash,
        location: signup.location,
        bio: signup.bio,
        contact_no: signup.contact_no,
    };

    // The UNIQUE index catches a concurrent signup that slipped past the check
    if !state.run_db(move |db| db.create_user(&new_user)).await? {
        info!("email id registered concurrently");
        return Err(ApiError::BadRequest(DUPLICATE_EMAIL.into()));
    }

    info!(%user_id, "user signed up");

    // A failed session write leaves the caller without the cookie only
    let jar = match session::store_token(&state, jar.clone(), &token).await {
        Ok(jar) => jar,
        Err(e) => {
            error!(%user_id, "account created but session not stored: {}", e);
            jar
        }
    };

    Ok((
        jar,
        Json(SignupResponse {
            success: true,
            message: SIGNUP_OK.into(),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    FormOrJson(req): FormOrJson<LoginRequest>,
) -> Result<(SignedCookieJar, Json<LoginResponse>), ApiError> {
    info!("user login request");

    if state.settings.trust_session_on_login {
        if let Some(token) = session_login(&state, &jar).await? {
            return Ok((jar, Json(login_response(token))));
        }
    }

    let (email, password) = validate_login(&req).map_err(|errors| {
        debug!(?errors, "login validation failed");
        ApiError::Validation {
            message: LOGIN_INVALID,
            errors,
        }
    })?;

    let user = state
        .run_db(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| {
            info!("email id not registered");
            ApiError::BadRequest(NOT_REGISTERED.into())
        })?;

    if !password_matches(&password, &user.password)? {
        info!(user_id = %user.id, "password does not match");
        return Err(ApiError::BadRequest(PASSWORD_MISMATCH.into()));
    }

    let token = issue_token(&state, &user.id)?;
    let jar = session::store_token(&state, jar, &token).await?;
    info!(user_id = %user.id, "user verified");

    Ok((
        jar,
        Json(login_response(SessionToken {
            user_id: user.id,
            token,
        })),
    ))
}

/// Accept the token already held by the caller's session. The submitted
/// credentials are not consulted. A token that no longer verifies is dropped
/// from the session so the normal login path runs.
async fn session_login(
    state: &AppState,
    jar: &SignedCookieJar,
) -> Result<Option<SessionToken>, ApiError> {
    let Some(session) = Session::load(state, jar).await? else {
        return Ok(None);
    };
    let Some(token) = session.token.clone() else {
        return Ok(None);
    };

    match verify_token(&state.settings.jwt_secret, &token) {
        Ok(claims) => {
            info!(user_id = %claims.id, "session token verified, skipping credential check");
            Ok(Some(SessionToken {
                user_id: claims.id,
                token,
            }))
        }
        Err(e) => {
            debug!("session token rejected: {}", e);
            session.clear_token(state).await?;
            Ok(None)
        }
    }
}

fn login_response(token: SessionToken) -> LoginResponse {
    LoginResponse {
        success: true,
        message: LOGIN_OK.into(),
        token,
    }
}

fn issue_token(state: &AppState, user_id: &str) -> Result<String, ApiError> {
    create_token(&state.settings.jwt_secret, user_id).map_err(|e| ApiError::Internal(e.to_string()))
}

/// Hash password with Argon2id
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

fn password_matches(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|e| ApiError::Internal(format!("corrupt password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
