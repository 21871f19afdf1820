//! Photo model, category enumeration and response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Portfolio category a photo is filed under
///
/// The set is closed; anything else in an upload request is rejected as
/// a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Portrait,
    Wedding,
    Event,
    Commercial,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Portrait => "portrait",
            Category::Wedding => "wedding",
            Category::Event => "event",
            Category::Commercial => "commercial",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Category::Portrait),
            "wedding" => Ok(Category::Wedding),
            "event" => Ok(Category::Event),
            "commercial" => Ok(Category::Commercial),
            "other" => Ok(Category::Other),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}

/// Photo entity
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub file_size: i64,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

/// New photo creation payload
///
/// Built by the upload handler once the blob is on disk; `filename` and
/// `file_path` come from the storage adapter.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub user_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub file_size: i64,
    pub is_private: bool,
}

/// A photo joined with its uploader's username for listings
#[derive(Debug, Clone)]
pub struct PhotoWithUploader {
    pub photo: Photo,
    pub uploader: String,
}

/// Client-facing view of a photo
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub url: String,
    pub username: String,
    pub user_id: Uuid,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

impl PhotoResponse {
    pub fn new(photo: &Photo, uploader: &str, url: String) -> Self {
        PhotoResponse {
            id: photo.id,
            filename: photo.filename.clone(),
            original_name: photo.original_name.clone(),
            category: photo.category,
            title: photo.title.clone(),
            description: photo.description.clone(),
            url,
            username: uploader.to_string(),
            user_id: photo.user_id,
            is_private: photo.is_private,
            created_at: photo.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in [
            Category::Portrait,
            Category::Wedding,
            Category::Event,
            Category::Commercial,
            Category::Other,
        ] {
            let parsed: Category = category.as_str().parse().expect("known category");
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Portrait".parse::<Category>(), Ok(Category::Portrait));
        assert_eq!("WEDDING".parse::<Category>(), Ok(Category::Wedding));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!("landscape".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let value = serde_json::to_value(Category::Commercial).expect("serialize");
        assert_eq!(value, serde_json::json!("commercial"));
    }

    #[test]
    fn test_photo_response_shape() {
        let photo = Photo {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "photo-1700000000000-123456789.jpg".to_string(),
            original_name: "sunset.jpg".to_string(),
            category: Category::Portrait,
            title: "sunset.jpg".to_string(),
            description: String::new(),
            file_path: "uploads/photo-1700000000000-123456789.jpg".to_string(),
            file_size: 1024,
            is_private: false,
            created_at: Utc::now(),
        };

        let response = PhotoResponse::new(
            &photo,
            "alice",
            format!("/uploads/{}", photo.filename),
        );
        let value = serde_json::to_value(&response).expect("serialize photo response");

        assert_eq!(value["category"], "portrait");
        assert_eq!(value["username"], "alice");
        assert_eq!(value["originalName"], "sunset.jpg");
        assert_eq!(
            value["url"],
            "/uploads/photo-1700000000000-123456789.jpg"
        );
        assert!(value.get("filePath").is_none());
    }
}
