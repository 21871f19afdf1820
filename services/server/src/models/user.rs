//! User model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity
///
/// The password hash stays inside the backend; responses are built from
/// the whitelisted fields only, never by serializing this struct.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload
///
/// Carries the plaintext password from the registration request to the
/// repository, which hashes it before anything touches the database.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Public view of a user, safe to return to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_admin: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            profile_image: user.profile_image.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            full_name: Some("Alice Adams".to_string()),
            profile_image: None,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_never_contains_password_hash() {
        let user = sample_user();
        let response = UserResponse::from(&user);

        let value = serde_json::to_value(&response).expect("serialize user response");
        let text = value.to_string();
        assert!(!text.contains("argon2"));
        assert!(!text.contains("password"));
        assert_eq!(value["username"], "alice");
        assert_eq!(value["fullName"], "Alice Adams");
        assert_eq!(value["isAdmin"], false);
    }
}
