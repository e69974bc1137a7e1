//! Input checks for signup and login payloads.
//!
//! Each field yields at most one message. Messages are returned in field
//! order so clients can show them as-is.

use qsapien_types::api::{LoginRequest, SignupRequest};

pub const FIRST_NAME_REQUIRED: &str = "first name is required";
pub const INVALID_EMAIL: &str = "Invalid Email Address";
pub const WEAK_PASSWORD: &str =
    "Password must be at least 6 characters long and must contain numeric digit";
pub const USERNAME_REQUIRED: &str = "Username is required";
pub const LOGIN_EMAIL_REQUIRED: &str = "Email Id is required";
pub const LOGIN_INVALID_PASSWORD: &str = "Invalid Password";

const MIN_PASSWORD_LEN: usize = 6;
const MIN_USERNAME_LEN: usize = 4;

/// A signup payload that passed validation. Optional fields that were sent
/// as empty strings are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email_id: String,
    pub password: String,
    pub username: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub contact_no: Option<String>,
}

pub fn validate_signup(req: SignupRequest) -> Result<ValidSignup, Vec<String>> {
    let mut errors = Vec::new();

    let first_name = req.first_name.as_deref().map(str::trim).unwrap_or_default();
    if first_name.is_empty() {
        errors.push(FIRST_NAME_REQUIRED.to_string());
    }

    let email = req.email_id.as_deref().map(str::trim).unwrap_or_default();
    if !is_email(email) {
        errors.push(INVALID_EMAIL.to_string());
    }

    let password = req.password.as_deref().unwrap_or_default();
    if !is_strong_enough(password) {
        errors.push(WEAK_PASSWORD.to_string());
    }

    let username = req.username.as_deref().unwrap_or_default();
    if username.chars().count() < MIN_USERNAME_LEN {
        errors.push(USERNAME_REQUIRED.to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // confirm_password is never stored
    Ok(ValidSignup {
        first_name: first_name.to_string(),
        last_name: non_empty(req.last_name),
        email_id: normalize_email(email),
        password: password.to_string(),
        username: username.to_string(),
        location: non_empty(req.location),
        bio: non_empty(req.bio),
        contact_no: non_empty(req.contact_no),
    })
}

/// Returns the normalized email and the password.
pub fn validate_login(req: &LoginRequest) -> Result<(String, String), Vec<String>> {
    let mut errors = Vec::new();

    let email = req.email_id.as_deref().map(str::trim).unwrap_or_default();
    if !is_email(email) {
        errors.push(LOGIN_EMAIL_REQUIRED.to_string());
    }

    let password = req.password.as_deref().unwrap_or_default();
    if !is_strong_enough(password) {
        errors.push(LOGIN_INVALID_PASSWORD.to_string());
    }

    if errors.is_empty() {
        Ok((normalize_email(email), password.to_string()))
    } else {
        Err(errors)
    }
}

fn is_strong_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN && password.chars().any(|c| c.is_ascii_digit())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Structural email check: one `@`, a sane local part and a dotted domain
/// ending in an alphabetic (or punycode) TLD.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.len() > 253 {
        return false;
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });
    if !labels_ok {
        return false;
    }

    let tld = labels[labels.len() - 1];
    (tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic))
        || tld.to_ascii_lowercase().starts_with("xn--")
}

/// Canonical form used for storage and lookup. Lowercases the address and
/// folds provider-specific aliases (gmail dots, `+tag` / `-tag` suffixes).
pub fn normalize_email(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    let Some((local, domain)) = lower.rsplit_once('@') else {
        return lower;
    };

    let strip = |sep: char| local.split_once(sep).map_or(local, |(head, _)| head);

    match domain {
        "gmail.com" | "googlemail.com" => {
            format!("{}@gmail.com", strip('+').replace('.', ""))
        }
        "outlook.com" | "hotmail.com" | "live.com" | "icloud.com" | "me.com" => {
            format!("{}@{}", strip('+'), domain)
        }
        "yahoo.com" | "ymail.com" | "rocketmail.com" => format!("{}@{}", strip('-'), domain),
        _ => lower.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(first: &str, email: &str, password: &str, username: &str) -> SignupRequest {
        SignupRequest {
            first_name: Some(first.into()),
            email_id: Some(email.into()),
            password: Some(password.into()),
            username: Some(username.into()),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_signup_passes() {
        let valid = validate_signup(signup("A", "a@b.com", "abc123", "abcd")).unwrap();
        assert_eq!(valid.first_name, "A");
        assert_eq!(valid.email_id, "a@b.com");
        assert_eq!(valid.username, "abcd");
    }

    #[test]
    fn password_without_digit_is_rejected() {
        let errors = validate_signup(signup("A", "a@b.com", "abcdef", "abcd")).unwrap_err();
        assert_eq!(errors, vec![WEAK_PASSWORD.to_string()]);
    }

    #[test]
    fn every_bad_field_reports_once() {
        let errors = validate_signup(SignupRequest::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                FIRST_NAME_REQUIRED.to_string(),
                INVALID_EMAIL.to_string(),
                WEAK_PASSWORD.to_string(),
                USERNAME_REQUIRED.to_string(),
            ]
        );
    }

    #[test]
    fn blank_first_name_is_rejected() {
        let errors = validate_signup(signup("   ", "a@b.com", "abc123", "abcd")).unwrap_err();
        assert_eq!(errors, vec![FIRST_NAME_REQUIRED.to_string()]);
    }

    #[test]
    fn short_username_is_rejected() {
        let errors = validate_signup(signup("A", "a@b.com", "abc123", "abc")).unwrap_err();
        assert_eq!(errors, vec![USERNAME_REQUIRED.to_string()]);
    }

    #[test]
    fn empty_optional_fields_are_dropped() {
        let mut req = signup("A", "a@b.com", "abc123", "abcd");
        req.last_name = Some(String::new());
        req.bio = Some("hello".into());
        req.confirm_password = Some("abc123".into());

        let valid = validate_signup(req).unwrap();
        assert_eq!(valid.last_name, None);
        assert_eq!(valid.bio.as_deref(), Some("hello"));
    }

    #[test]
    fn login_messages() {
        let req = LoginRequest {
            email_id: Some("not-an-email".into()),
            password: Some("short".into()),
        };
        assert_eq!(
            validate_login(&req).unwrap_err(),
            vec![
                LOGIN_EMAIL_REQUIRED.to_string(),
                LOGIN_INVALID_PASSWORD.to_string()
            ]
        );
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.com"));
        assert!(is_email("first.last+tag@sub.example.org"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.com"));
        assert!(!is_email("a@@b.com"));
        assert!(!is_email("a b@c.com"));
        assert!(!is_email("a@b.c"));
        assert!(!is_email("a..b@c.com"));
        assert!(!is_email("a@-b.com"));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email(" A@B.com "), "a@b.com");
        assert_eq!(normalize_email("John.Doe+news@googlemail.com"), "johndoe@gmail.com");
        assert_eq!(normalize_email("me+x@outlook.com"), "me@outlook.com");
        assert_eq!(normalize_email("me-x@yahoo.com"), "me@yahoo.com");
        assert_eq!(normalize_email("first.last@example.com"), "first.last@example.com");
    }
}
