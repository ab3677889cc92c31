//! Raw upload storage

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{FileReference, Result, StoreError};

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<FileReference>;
    /// Deleting a blob that is already gone is not an error.
    async fn delete(&self, file: &FileReference) -> Result<()>;
    async fn exists(&self, file: &FileReference) -> Result<bool>;
}

fn reference(name: &str, bytes: &[u8]) -> FileReference {
    FileReference {
        name: name.to_string(),
        size: bytes.len() as u64,
        content_hash: blake3::hash(bytes).into(),
    }
}

fn check_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(|c: char| c == '/' || c == '\\' || c.is_control());
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Blobs as files under a single directory.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name))
    }
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Blob(e.to_string())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<FileReference> {
        let final_path = self.path_of(name)?;
        let tmp_path = self.root.join(format!(".tmp_{name}"));

        tokio::fs::create_dir_all(&self.root).await.map_err(io_err)?;
        tokio::fs::write(&tmp_path, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &final_path).await.map_err(io_err)?;

        Ok(reference(name, bytes))
    }

    async fn delete(&self, file: &FileReference) -> Result<()> {
        let path = self.path_of(&file.name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(e)),
        }
    }

    async fn exists(&self, file: &FileReference) -> Result<bool> {
        let path = self.path_of(&file.name)?;
        tokio::fs::try_exists(&path).await.map_err(io_err)
    }
}

/// In-memory blobs (for testing)
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.data.read().await.get(name).cloned()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<FileReference> {
        check_name(name)?;
        self.data.write().await.insert(name.to_string(), bytes.to_vec());
        Ok(reference(name, bytes))
    }

    async fn delete(&self, file: &FileReference) -> Result<()> {
        self.data.write().await.remove(&file.name);
        Ok(())
    }

    async fn exists(&self, file: &FileReference) -> Result<bool> {
        Ok(self.data.read().await.contains_key(&file.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_put_delete() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path().join("datasets"));

        let file = blobs.put("a.csv", b"x,y\n1,2\n").await.unwrap();
        assert_eq!(file.size, 8);
        assert_eq!(file.content_hash, <[u8; 32]>::from(blake3::hash(b"x,y\n1,2\n")));
        assert!(blobs.exists(&file).await.unwrap());
        assert_eq!(std::fs::read(dir.path().join("datasets/a.csv")).unwrap(), b"x,y\n1,2\n");

        blobs.delete(&file).await.unwrap();
        assert!(!blobs.exists(&file).await.unwrap());
        // second delete is a no-op
        blobs.delete(&file).await.unwrap();
    }

    #[tokio::test]
    async fn test_names_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path());

        for name in ["../evil.csv", "a/b.csv", "", ".hidden"] {
            let err = blobs.put(name, b"x").await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidName(_)), "{name}");
        }
    }
}
