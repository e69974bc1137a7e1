use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use qsapien_types::api::Claims;

/// Tokens are valid for 24 hours.
pub const TOKEN_TTL_SECS: i64 = 86_400;

pub fn create_token(secret: &str, user_id: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        id: user_id.to_string(),
        iat: now as usize,
        exp: (now + TOKEN_TTL_SECS) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry, returning the claims.
pub fn verify_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
