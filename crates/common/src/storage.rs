//! Blob storage for featured images and post attachments.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (path relative to the storage root).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Delete a file. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Stored file");

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Generate a unique storage key for an upload under `folder`.
///
/// Keys look like `blog_images/2025/01/31/<ulid>.jpg`; the original file
/// name only contributes its extension.
#[must_use]
pub fn generate_storage_key(folder: &str, original_name: &str) -> String {
    use chrono::Utc;

    let date_path = Utc::now().format("%Y/%m/%d").to_string();

    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!(
        "{}/{}/{}.{}",
        folder.trim_matches('/'),
        date_path,
        ulid::Ulid::new().to_string().to_lowercase(),
        extension
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("blog_images", "Photo.JPG");
        assert!(key.starts_with("blog_images/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key("blog_attachments", "README");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_generate_storage_key_rejects_odd_extension() {
        let key = generate_storage_key("blog_attachments", "evil.p/h");
        assert!(key.ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("quill-storage-{}", ulid::Ulid::new()));
        let storage = LocalStorage::new(dir.clone(), "/media/".to_string());

        let uploaded = storage
            .upload("blog_attachments/a.txt", b"hello", "text/plain")
            .await
            .unwrap();
        assert_eq!(uploaded.url, "/media/blog_attachments/a.txt");
        assert_eq!(uploaded.size, 5);
        let path = dir.join("blog_attachments/a.txt");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        storage.delete("blog_attachments/a.txt").await.unwrap();
        assert!(!path.exists());

        // Deleting twice is fine
        storage.delete("blog_attachments/a.txt").await.unwrap();

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_local_storage_rejects_traversal() {
        let storage = LocalStorage::new(PathBuf::from("/tmp/quill"), "/media".to_string());
        let result = storage.upload("../etc/passwd", b"x", "text/plain").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
