//! Session model and the resolved request identity

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// New session creation payload
///
/// Only the token digest is persisted; the raw token lives in the
/// client's cookie and never touches the database.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token_hash: String,
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

/// Identity resolved from a valid session cookie
///
/// Inserted into request extensions by the auth middleware. Carries the
/// denormalized username and admin flag so access-control checks do not
/// need another user lookup.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}
