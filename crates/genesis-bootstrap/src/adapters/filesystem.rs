//! Filesystem adapter on `tokio::fs`

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::ports::Filesystem;

/// Local filesystem
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioFilesystem;

impl TokioFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Filesystem for TokioFilesystem {
    async fn remove_all(&self, path: &Path) -> io::Result<()> {
        let metadata = match fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let result = if metadata.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };

        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_missing_path_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        TokioFilesystem
            .remove_all(&dir.path().join("does-not-exist"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_all_deletes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join(".earth");
        let fs = TokioFilesystem::new();
        fs.write(&home.join("config/genesis.json"), b"{}").await.unwrap();
        fs.write(&home.join("data/priv_validator_state.json"), b"{}")
            .await
            .unwrap();

        fs.remove_all(&home).await.unwrap();

        assert!(!home.exists());
    }

    #[tokio::test]
    async fn test_remove_all_deletes_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("genesis.json");
        let fs = TokioFilesystem::new();
        fs.write(&file, b"{}").await.unwrap();

        fs.remove_all(&file).await.unwrap();

        assert!(!file.exists());
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a/b/c.json");
        let fs = TokioFilesystem::new();

        fs.write(&file, b"{\"x\":1}").await.unwrap();

        assert_eq!(fs.read(&file).await.unwrap(), b"{\"x\":1}");
    }
}
