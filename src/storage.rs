//! Local object store for trip uploads.
//!
//! Objects live under `<root>/<trip_id>/<uuid>-<name>` and are served back at
//! `<public_base_url>/<key>`. Keys are always relative and never leave `root`.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    public_base_url: String,
    max_upload_bytes: usize,
}

impl ObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str, max_upload_bytes: usize) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    pub async fn put(&self, trip_id: i64, file_name: &str, bytes: &[u8]) -> Result<StoredObject> {
        if bytes.len() > self.max_upload_bytes {
            return Err(Error::PayloadTooLarge {
                limit: self.max_upload_bytes,
            });
        }
        let name = sanitize_file_name(file_name);
        if name.is_empty() {
            return Err(Error::validation("File name is required"));
        }

        let key = format!("{trip_id}/{}-{name}", Uuid::new_v4().simple());
        let path = self.path_for(&key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        info!("Stored {} bytes at {key}", bytes.len());
        Ok(StoredObject {
            url: self.public_url(&key),
            mime_type: mime_for(&name).to_string(),
            size: bytes.len(),
            key,
        })
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(format!("Object {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Removing an object that is already gone is not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed object {key}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Object {key} already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_all(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::validation(format!("Invalid object key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

/// Keeps the last path segment and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

pub fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path, limit: usize) -> ObjectStore {
        ObjectStore::new(dir, "http://localhost:3000/objects/", limit)
    }

    #[tokio::test]
    async fn put_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);

        let obj = store.put(4, "Hotel Receipt.JPG", b"jpeg bytes").await.unwrap();
        assert!(obj.key.starts_with("4/"));
        assert!(obj.key.ends_with("-Hotel_Receipt.JPG"));
        assert_eq!(obj.mime_type, "image/jpeg");
        assert_eq!(obj.url, format!("http://localhost:3000/objects/{}", obj.key));

        assert_eq!(store.read(&obj.key).await.unwrap(), b"jpeg bytes");

        store.delete(&obj.key).await.unwrap();
        assert!(matches!(store.read(&obj.key).await, Err(Error::NotFound(_))));
        // second delete is a no-op
        store.delete(&obj.key).await.unwrap();
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 4);
        let err = store.put(1, "a.txt", b"12345").await.unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), 1024);
        assert!(matches!(store.read("../secret").await, Err(Error::Validation(_))));
        assert!(matches!(store.read("/etc/passwd").await, Err(Error::Validation(_))));
        assert!(matches!(store.delete("").await, Err(Error::Validation(_))));
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\bill 1.pdf"), "bill_1.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("   "), "");
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for("scan.PDF"), "application/pdf");
        assert_eq!(mime_for("notes"), "application/octet-stream");
        assert_eq!(mime_for("list.csv"), "text/csv");
    }
}
