use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::{debug, info, warn};

use qsapien_db::models::UserRow;
use qsapien_types::api::{GetUserRequest, UserProfile, UsernameCheckResponse, UsernameQuery};

use crate::error::ApiError;
use crate::extract::FormOrJson;
use crate::state::AppState;

pub const USER_ID_REQUIRED: &str = "user id must be provided while fetching user object";
pub const FETCH_FAILED: &str = "error occured while fetching user object";
pub const USERNAME_PARAM_REQUIRED: &str = "username is required in request parameter";
pub const USERNAME_CHECK_FAILED: &str = "error occured while checking username existence";

/// POST /user/get: public profile of one user.
pub async fn get_user(
    State(state): State<AppState>,
    FormOrJson(req): FormOrJson<GetUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = req
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::Validation {
            message: "error occured",
            errors: vec![USER_ID_REQUIRED.to_string()],
        })?;
    debug!(%user_id, "get user request");

    let row = match state.run_db(move |db| db.get_user_by_id(&user_id)).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            info!("user object not found");
            return Err(ApiError::BadRequest(FETCH_FAILED.into()));
        }
        Err(e) => {
            warn!("error occured while fetching user object: {}", e);
            return Err(ApiError::BadRequest(FETCH_FAILED.into()));
        }
    };

    Ok(Json(profile_from_row(row)))
}

/// GET /user/check?username=: whether any account uses `username`.
pub async fn check_username(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> (StatusCode, Json<UsernameCheckResponse>) {
    let Some(username) = query.username.filter(|u| !u.is_empty()) else {
        return check_failed(USERNAME_PARAM_REQUIRED);
    };

    match state.run_db(move |db| db.username_exists(&username)).await {
        Ok(exists) => (
            StatusCode::OK,
            Json(UsernameCheckResponse {
                check_success: true,
                is_exist: Some(exists),
                message: None,
            }),
        ),
        Err(e) => {
            warn!("error occured while checking username existence: {}", e);
            check_failed(USERNAME_CHECK_FAILED)
        }
    }
}

fn check_failed(message: &str) -> (StatusCode, Json<UsernameCheckResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(UsernameCheckResponse {
            check_success: false,
            is_exist: None,
            message: Some(message.to_string()),
        }),
    )
}

fn profile_from_row(row: UserRow) -> UserProfile {
    UserProfile {
        name: display_name(&row.first_name, row.last_name.as_deref()),
        first_name: row.first_name,
        last_name: row.last_name,
        location: row.location,
        bio: row.bio,
        contact_no: row.contact_no,
        user_id: row.id,
        email_id: row.email_id,
        credit_points: row.credit_points,
        profile_image_url: row.profile_image_url,
    }
}

fn display_name(first: &str, last: Option<&str>) -> String {
    match last {
        Some(last) if !last.is_empty() => format!("{} {}", first, last).trim().to_string(),
        _ => first.trim().to_string(),
    }
}
