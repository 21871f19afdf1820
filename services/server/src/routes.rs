//! HTTP routes for the studio backend

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{require_owner_or_admin, session_auth};
use crate::models::{AuthUser, Category, NewPhoto, NewSession, NewUser, PhotoResponse, UserResponse};
use crate::session::{build_session_cookie, clear_session_cookie, generate_token, hash_token,
                     read_session_token};
use crate::state::AppState;
use crate::validation::{validate_email, validate_password, validate_username};

/// Upload size ceiling in bytes (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Transport-level body cap, above the domain ceiling so oversized
/// uploads fail with the domain validation error instead of a bare 413
const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 2 * 1024 * 1024;

/// Request for user registration
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Query parameters for the public portfolio listing
#[derive(Deserialize)]
pub struct PhotoListQuery {
    pub category: Option<String>,
}

/// Create the router for the studio backend
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/user", get(current_user))
        .route("/api/photos/upload", post(upload_photo))
        .route("/api/photos/my", get(my_photos))
        .route("/api/photos/:id", delete(delete_photo))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/photos", get(public_photos))
        .route("/uploads/:filename", get(serve_upload))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "underneath-media",
    }))
}

/// Issue a fresh session for a user and hand back its cookie
async fn open_session(
    state: &AppState,
    user_id: Uuid,
    username: &str,
    is_admin: bool,
    headers: &HeaderMap,
) -> Result<axum_extra::extract::cookie::Cookie<'static>, ApiError> {
    let token = generate_token();
    let session = NewSession {
        token_hash: hash_token(&token),
        user_id,
        username: username.to_string(),
        is_admin,
        expires_at: Utc::now() + Duration::hours(state.config.session_ttl_hours),
    };

    state.session_repository.create(&session).await.map_err(|e| {
        error!("Failed to create session: {}", e);
        ApiError::Internal("Internal server error".to_string())
    })?;

    Ok(build_session_cookie(
        token,
        state.config.session_ttl_hours,
        headers,
    ))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (username, email, password) = match (&payload.username, &payload.email, &payload.password)
    {
        (Some(u), Some(e), Some(p)) if !u.is_empty() && !e.is_empty() && !p.is_empty() => {
            (u.clone(), e.clone(), p.clone())
        }
        _ => {
            return Err(ApiError::Validation(
                "Username, email, and password are required".to_string(),
            ));
        }
    };

    validate_username(&username).map_err(ApiError::Validation)?;
    validate_email(&email).map_err(ApiError::Validation)?;
    validate_password(&password).map_err(ApiError::Validation)?;

    info!("Registration attempt for username: {}", username);

    let taken = state
        .user_repository
        .exists(&username, &email)
        .await
        .map_err(ApiError::from)?;
    if taken {
        return Err(ApiError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let new_user = NewUser {
        username,
        email,
        password,
        full_name: payload.full_name.clone(),
    };

    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(ApiError::from)?;

    let cookie = open_session(&state, user.id, &user.username, user.is_admin, &headers).await?;

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "User created successfully",
            "user": UserResponse::from(&user),
        })),
    ))
}

/// User login endpoint; the identifier matches username or email
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (identifier, password) = match (&payload.username, &payload.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u.clone(), p.clone()),
        _ => {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }
    };

    info!("Login attempt for identifier: {}", identifier);

    // Unknown identifier and wrong password answer identically so the
    // response does not reveal which accounts exist.
    let user = state
        .user_repository
        .find_by_username_or_email(&identifier)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

    let password_matches = state
        .user_repository
        .verify_password(&user, &password)
        .map_err(ApiError::from)?;
    if !password_matches {
        warn!("Failed login for user: {}", user.username);
        return Err(ApiError::Authentication("Invalid credentials".to_string()));
    }

    let cookie = open_session(&state, user.id, &user.username, user.is_admin, &headers).await?;

    info!("User logged in: {}", user.username);

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "user": UserResponse::from(&user),
        })),
    ))
}

/// Logout endpoint; destroying an absent session is still a success
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = read_session_token(&jar) {
        state
            .session_repository
            .delete(&hash_token(&token))
            .await
            .map_err(|e| {
                error!("Failed to destroy session: {}", e);
                ApiError::Internal("Could not log out".to_string())
            })?;
    }

    Ok((
        jar.add(clear_session_cookie(&headers)),
        Json(json!({ "message": "Logout successful" })),
    ))
}

/// Current user endpoint
pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::Authentication("Authentication required".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// Collected multipart fields of an upload request
#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    category: Option<String>,
    title: Option<String>,
    description: Option<String>,
    privacy: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid upload payload: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "photo" => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "upload".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Invalid upload payload: {}", e)))?;
                form.file = Some((original_name, data.to_vec()));
            }
            "category" => form.category = field.text().await.ok(),
            "title" => form.title = field.text().await.ok(),
            "description" => form.description = field.text().await.ok(),
            "privacy" => form.privacy = field.text().await.ok(),
            _ => {}
        }
    }

    Ok(form)
}

/// Whether the bytes are one of the accepted image formats
pub(crate) fn is_allowed_image(bytes: &[u8]) -> bool {
    matches!(
        infer::get(bytes).map(|kind| kind.mime_type()),
        Some("image/jpeg") | Some("image/png") | Some("image/gif")
    )
}

/// Photo upload endpoint
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_upload_form(multipart).await?;

    let (original_name, bytes) = form
        .file
        .ok_or_else(|| ApiError::Validation("No file uploaded".to_string()))?;

    let category = form
        .category
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("Category is required".to_string()))?
        .parse::<Category>()
        .map_err(ApiError::Validation)?;

    // Reject before anything touches the disk so a refused upload leaves
    // neither a row nor an orphaned blob behind.
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::Validation(
            "File exceeds the 10MB size limit".to_string(),
        ));
    }

    if !is_allowed_image(&bytes) {
        return Err(ApiError::Validation(
            "Only JPEG, PNG, and GIF images are allowed".to_string(),
        ));
    }

    let stored = state
        .storage
        .store(&bytes, &original_name)
        .await
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    let new_photo = NewPhoto {
        user_id: auth_user.id,
        filename: stored.filename.clone(),
        original_name: original_name.clone(),
        category,
        title: form
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or(original_name),
        description: form.description.unwrap_or_default(),
        file_path: stored.path.clone(),
        file_size: stored.size,
        is_private: form.privacy.as_deref() == Some("private"),
    };

    let photo = match state.photo_repository.insert(&new_photo).await {
        Ok(photo) => photo,
        Err(e) => {
            // the blob is already on disk; reclaim it before failing
            if let Err(cleanup) = state.storage.remove(&stored.filename).await {
                warn!("Failed to clean up blob after insert error: {}", cleanup);
            }
            error!("Failed to insert photo: {}", e);
            return Err(ApiError::from(e));
        }
    };

    info!(
        "User {} uploaded photo {} ({} bytes)",
        auth_user.username, photo.filename, photo.file_size
    );

    let url = state.storage.url_for(&photo.filename);
    Ok(Json(json!({
        "message": "Photo uploaded successfully",
        "photo": PhotoResponse::new(&photo, &auth_user.username, url),
    })))
}

/// Own photos, private ones included
pub async fn my_photos(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let photos = state
        .photo_repository
        .list_by_owner(auth_user.id)
        .await
        .map_err(ApiError::from)?;

    let response: Vec<PhotoResponse> = photos
        .iter()
        .map(|p| {
            PhotoResponse::new(&p.photo, &p.uploader, state.storage.url_for(&p.photo.filename))
        })
        .collect();

    Ok(Json(response))
}

/// Public portfolio listing with optional category filter
pub async fn public_photos(
    State(state): State<AppState>,
    Query(query): Query<PhotoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = query
        .category
        .filter(|c| !c.is_empty())
        .map(|c| c.parse::<Category>())
        .transpose()
        .map_err(ApiError::Validation)?;

    let photos = state
        .photo_repository
        .list_public(category)
        .await
        .map_err(ApiError::from)?;

    let response: Vec<PhotoResponse> = photos
        .iter()
        .map(|p| {
            PhotoResponse::new(&p.photo, &p.uploader, state.storage.url_for(&p.photo.filename))
        })
        .collect();

    Ok(Json(response))
}

/// Photo deletion endpoint; owner or admin only
pub async fn delete_photo(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let photo = state
        .photo_repository
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Photo not found".to_string()))?;

    require_owner_or_admin(&auth_user, photo.user_id)?;

    // Zero affected rows means a concurrent delete got here first.
    let deleted = state
        .photo_repository
        .delete_by_id(id)
        .await
        .map_err(ApiError::from)?;
    if !deleted {
        return Err(ApiError::NotFound("Photo not found".to_string()));
    }

    // Best-effort blob removal; the metadata row is the source of truth.
    if let Err(e) = state.storage.remove(&photo.filename).await {
        warn!("Failed to remove blob {}: {}", photo.filename, e);
    }

    info!("User {} deleted photo {}", auth_user.username, photo.id);

    Ok(Json(json!({ "message": "Photo deleted successfully" })))
}

/// Content type for a stored blob, derived from its extension
pub(crate) fn content_type_for(filename: &str) -> &'static str {
    match std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Raw blob retrieval endpoint
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    // stored filenames never contain separators; anything else is not ours
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    let file = match tokio::fs::File::open(state.storage.path_for(&filename)).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("File not found".to_string()));
        }
        Err(e) => {
            error!("Failed to open blob {}: {}", filename, e);
            return Err(ApiError::Storage(e.to_string()));
        }
    };

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type_for(&filename))],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const GIF_MAGIC: &[u8] = b"GIF89a";

    #[test]
    fn test_accepted_image_formats() {
        assert!(is_allowed_image(JPEG_MAGIC));
        assert!(is_allowed_image(PNG_MAGIC));
        assert!(is_allowed_image(GIF_MAGIC));
    }

    #[test]
    fn test_rejected_payloads() {
        assert!(!is_allowed_image(b"%PDF-1.7 definitely not an image"));
        assert!(!is_allowed_image(b"<svg xmlns='http://www.w3.org/2000/svg'/>"));
        assert!(!is_allowed_image(b""));
    }

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
