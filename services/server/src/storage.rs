//! Disk-backed blob storage for uploaded photos
//!
//! Uploads land in a single flat directory under server-generated
//! filenames; metadata rows reference blobs by that filename only, so
//! the directory can be moved or re-mounted without touching the
//! database.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::{Rng, thread_rng};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// A blob persisted by [`DiskStorage::store`]
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Server-generated filename, unique within the uploads directory
    pub filename: String,
    /// Path the bytes were written to
    pub path: String,
    /// Size in bytes
    pub size: i64,
}

/// Blob storage rooted at a flat uploads directory
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Open the storage directory, creating it if needed.
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("creating uploads directory {}", root.display()))?;

        Ok(Self { root })
    }

    /// Generate a filename that will not collide with concurrent uploads:
    /// millisecond timestamp plus a random suffix, keeping the original
    /// extension.
    fn unique_filename(original_name: &str) -> String {
        let suffix: u32 = thread_rng().gen_range(0..1_000_000_000);
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        format!("photo-{}-{:09}{}", Utc::now().timestamp_millis(), suffix, ext)
    }

    /// Write `bytes` durably under a fresh filename and return its record.
    ///
    /// On any failure the caller sees an error and no filename, so no
    /// metadata row can end up pointing at a blob that was never written.
    pub async fn store(&self, bytes: &[u8], original_name: &str) -> Result<StoredFile> {
        let filename = Self::unique_filename(original_name);
        let path = self.root.join(&filename);

        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("creating {}", path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("syncing {}", path.display()))?;

        Ok(StoredFile {
            filename,
            path: path.to_string_lossy().into_owned(),
            size: bytes.len() as i64,
        })
    }

    /// Delete a blob. Missing files count as success so deletes stay
    /// idempotent.
    pub async fn remove(&self, filename: &str) -> Result<()> {
        let path = self.root.join(filename);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }

    /// Absolute path of a blob inside the uploads directory.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Public retrieval path for a stored blob.
    pub fn url_for(&self, filename: &str) -> String {
        format!("/uploads/{}", filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn temp_storage() -> DiskStorage {
        let root = std::env::temp_dir().join(format!("underneath-storage-{}", Uuid::new_v4()));
        DiskStorage::init(root).await.expect("init storage")
    }

    #[tokio::test]
    async fn test_store_writes_bytes_and_reports_size() {
        let storage = temp_storage().await;
        let bytes = b"\xFF\xD8\xFF\xE0 not really a jpeg";

        let stored = storage.store(bytes, "shoot.jpg").await.expect("store");

        assert_eq!(stored.size, bytes.len() as i64);
        let on_disk = tokio::fs::read(storage.path_for(&stored.filename))
            .await
            .expect("read back");
        assert_eq!(on_disk, bytes);
    }

    #[tokio::test]
    async fn test_stored_filenames_keep_extension_and_do_not_collide() {
        let storage = temp_storage().await;

        let a = storage.store(b"a", "portrait.PNG").await.expect("store a");
        let b = storage.store(b"b", "portrait.PNG").await.expect("store b");

        assert_ne!(a.filename, b.filename);
        assert!(a.filename.starts_with("photo-"));
        assert!(a.filename.ends_with(".PNG"));
    }

    #[tokio::test]
    async fn test_filename_without_extension_is_accepted() {
        let storage = temp_storage().await;

        let stored = storage.store(b"bytes", "noext").await.expect("store");
        assert!(!stored.filename.contains('.'));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let storage = temp_storage().await;
        let stored = storage.store(b"bytes", "cull.gif").await.expect("store");

        storage.remove(&stored.filename).await.expect("first remove");
        // already gone, still succeeds
        storage.remove(&stored.filename).await.expect("second remove");
        storage
            .remove("photo-0000000000000-000000000.jpg")
            .await
            .expect("remove of never-stored file");
    }

    #[tokio::test]
    async fn test_url_for_maps_into_uploads() {
        let storage = temp_storage().await;
        assert_eq!(
            storage.url_for("photo-17-000000001.jpg"),
            "/uploads/photo-17-000000001.jpg"
        );
    }
}
