//! Photo repository for database operations

use anyhow::{Result, anyhow};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Category, NewPhoto, Photo, PhotoWithUploader};

fn photo_from_row(row: &PgRow) -> Result<Photo> {
    let category: String = row.get("category");
    let category = category
        .parse::<Category>()
        .map_err(|e| anyhow!("Corrupt photo row: {}", e))?;

    Ok(Photo {
        id: row.get("id"),
        user_id: row.get("user_id"),
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        category,
        title: row.get("title"),
        description: row.get("description"),
        file_path: row.get("file_path"),
        file_size: row.get("file_size"),
        is_private: row.get("is_private"),
        created_at: row.get("created_at"),
    })
}

fn photo_with_uploader_from_row(row: &PgRow) -> Result<PhotoWithUploader> {
    Ok(PhotoWithUploader {
        photo: photo_from_row(row)?,
        uploader: row.get("uploader"),
    })
}

const PHOTO_COLUMNS: &str = "p.id, p.user_id, p.filename, p.original_name, p.category, \
     p.title, p.description, p.file_path, p.file_size, p.is_private, p.created_at";

/// Photo repository
#[derive(Clone)]
pub struct PhotoRepository {
    pool: PgPool,
}

impl PhotoRepository {
    /// Create a new photo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a photo metadata row for a blob already on disk
    pub async fn insert(&self, new_photo: &NewPhoto) -> Result<Photo> {
        let row = sqlx::query(
            r#"
            INSERT INTO photos (id, user_id, filename, original_name, category, title,
                                description, file_path, file_size, is_private)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, filename, original_name, category, title,
                      description, file_path, file_size, is_private, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_photo.user_id)
        .bind(&new_photo.filename)
        .bind(&new_photo.original_name)
        .bind(new_photo.category.as_str())
        .bind(&new_photo.title)
        .bind(&new_photo.description)
        .bind(&new_photo.file_path)
        .bind(new_photo.file_size)
        .bind(new_photo.is_private)
        .fetch_one(&self.pool)
        .await?;

        photo_from_row(&row)
    }

    /// Find a photo by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Photo>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, filename, original_name, category, title,
                   description, file_path, file_size, is_private, created_at
            FROM photos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| photo_from_row(&row)).transpose()
    }

    /// Public portfolio listing, newest first, optionally narrowed to one
    /// category. Ties on the timestamp are broken by id so the order is
    /// stable across requests.
    pub async fn list_public(&self, category: Option<Category>) -> Result<Vec<PhotoWithUploader>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    r#"
                    SELECT {PHOTO_COLUMNS}, u.username AS uploader
                    FROM photos p
                    JOIN users u ON u.id = p.user_id
                    WHERE p.is_private = FALSE AND p.category = $1
                    ORDER BY p.created_at DESC, p.id DESC
                    "#
                ))
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    SELECT {PHOTO_COLUMNS}, u.username AS uploader
                    FROM photos p
                    JOIN users u ON u.id = p.user_id
                    WHERE p.is_private = FALSE
                    ORDER BY p.created_at DESC, p.id DESC
                    "#
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(photo_with_uploader_from_row).collect()
    }

    /// Every photo owned by a user, private ones included, newest first
    pub async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<PhotoWithUploader>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PHOTO_COLUMNS}, u.username AS uploader
            FROM photos p
            JOIN users u ON u.id = p.user_id
            WHERE p.user_id = $1
            ORDER BY p.created_at DESC, p.id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(photo_with_uploader_from_row).collect()
    }

    /// Delete a photo row. Returns false when the row was already gone,
    /// which is how the loser of two concurrent deletes finds out.
    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM photos WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
