use std::path::Path;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
};
use tracing::{debug, error, info};

use qsapien_types::api::UploadResponse;

use crate::state::AppState;

/// 10 MB upload limit for profile images
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// URL path segment uploaded images are served under.
pub const IMAGE_URL_PREFIX: &str = "profileImages";

pub const UPLOAD_OK: &str = "profile image updated successfully";
pub const UPLOAD_NO_USER: &str = "profile image failed to update.specified user id does not exist";
pub const UPLOAD_NO_FILE: &str = "profile image failed to update.no file was provided";
pub const UPLOAD_FAILED: &str = "internal error occured while updating profile image";

type UploadReply = (StatusCode, Json<UploadResponse>);

struct ImagePart {
    file_name: String,
    bytes: Bytes,
}

/// POST /user/upload: multipart with a `file` part and a `userId` field.
/// Saves the file under its original name in the upload directory (same
/// names overwrite) and points the user's profile image at it.
pub async fn upload_profile_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> UploadReply {
    let mut user_id: Option<String> = None;
    let mut image: Option<ImagePart> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                debug!("malformed multipart body: {}", e);
                return reply(StatusCode::BAD_REQUEST, false, &e.body_text());
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("userId") => match field.text().await {
                Ok(text) => user_id = Some(text),
                Err(e) => return reply(StatusCode::BAD_REQUEST, false, &e.body_text()),
            },
            Some("file") => {
                let file_name = field.file_name().and_then(sanitize_file_name);
                match field.bytes().await {
                    Ok(bytes) => {
                        image = file_name.map(|file_name| ImagePart { file_name, bytes });
                    }
                    Err(e) => return reply(StatusCode::BAD_REQUEST, false, &e.body_text()),
                }
            }
            _ => {}
        }
    }

    let Some(user_id) = user_id.filter(|id| !id.trim().is_empty()) else {
        info!("profile image upload without user id");
        return reply(StatusCode::BAD_REQUEST, false, UPLOAD_NO_USER);
    };
    let Some(image) = image else {
        info!(%user_id, "profile image upload without file");
        return reply(StatusCode::BAD_REQUEST, false, UPLOAD_NO_FILE);
    };

    let dir = &state.settings.upload_dir;
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        error!("Failed to create upload directory {}: {}", dir.display(), e);
        return reply(StatusCode::INTERNAL_SERVER_ERROR, false, UPLOAD_FAILED);
    }

    let file_path = dir.join(&image.file_name);
    if let Err(e) = tokio::fs::write(&file_path, &image.bytes).await {
        error!("Failed to write file {}: {}", file_path.display(), e);
        return reply(StatusCode::INTERNAL_SERVER_ERROR, false, UPLOAD_FAILED);
    }
    debug!("stored {} bytes at {}", image.bytes.len(), file_path.display());

    let url = image_url(&state.settings.api_base_url, &image.file_name);
    match state
        .run_db(move |db| db.set_profile_image_url(&user_id, &url))
        .await
    {
        Ok(true) => {
            info!("profile image updated successfully");
            reply(StatusCode::OK, true, UPLOAD_OK)
        }
        Ok(false) => {
            info!("profile image upload for unknown user");
            reply(StatusCode::BAD_REQUEST, false, UPLOAD_NO_USER)
        }
        Err(e) => {
            error!("error occured while updating profile image: {}", e);
            reply(StatusCode::INTERNAL_SERVER_ERROR, false, UPLOAD_FAILED)
        }
    }
}

fn reply(status: StatusCode, success: bool, message: &str) -> UploadReply {
    (
        status,
        Json(UploadResponse {
            success,
            message: message.to_string(),
        }),
    )
}

pub fn image_url(base_url: &str, file_name: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        IMAGE_URL_PREFIX,
        file_name
    )
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next()?;
    Path::new(last)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
