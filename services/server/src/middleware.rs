//! Session authentication middleware and ownership checks

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::AuthUser;
use crate::session::{hash_token, read_session_token};
use crate::state::AppState;

/// Resolve the session cookie into an [`AuthUser`] or reject with 401
///
/// On success the identity lands in request extensions for handlers to
/// pick up; no authentication state is held anywhere else.
pub async fn session_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = read_session_token(&jar)
        .ok_or_else(|| ApiError::Authentication("Authentication required".to_string()))?;

    let auth_user = state
        .session_repository
        .resolve(&hash_token(&token))
        .await
        .map_err(|e| {
            error!("Failed to resolve session: {}", e);
            ApiError::Internal("Internal server error".to_string())
        })?
        .ok_or_else(|| {
            warn!("Rejected request with unknown or expired session");
            ApiError::Authentication("Authentication required".to_string())
        })?;

    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

/// Permit the operation only for the resource owner or an admin
pub fn require_owner_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), ApiError> {
    if user.id == owner_id || user.is_admin {
        Ok(())
    } else {
        warn!(
            "User {} denied access to resource owned by {}",
            user.id, owner_id
        );
        Err(ApiError::Authorization(
            "Not authorized to delete this photo".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(is_admin: bool) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            is_admin,
        }
    }

    #[test]
    fn test_owner_passes() {
        let user = auth_user(false);
        assert!(require_owner_or_admin(&user, user.id).is_ok());
    }

    #[test]
    fn test_admin_passes_for_foreign_resource() {
        let admin = auth_user(true);
        assert!(require_owner_or_admin(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_non_owner_non_admin_is_forbidden() {
        let user = auth_user(false);
        let err = require_owner_or_admin(&user, Uuid::new_v4()).unwrap_err();
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::FORBIDDEN
        );
    }
}
