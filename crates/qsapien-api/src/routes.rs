use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::files::{self, MAX_IMAGE_SIZE};
use crate::state::AppState;
use crate::{auth, users};

/// All `/user` routes, with state applied.
pub fn router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route(
            "/upload",
            post(files::upload_profile_image).layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE)),
        )
        .route("/get", post(users::get_user))
        .route("/check", get(users::check_username));

    Router::new().nest("/user", user_routes).with_state(state)
}
