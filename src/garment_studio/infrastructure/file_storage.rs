use super::error::InfrastructureError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Flat blob store rooted at one directory (uploaded 3D models live here).
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, InfrastructureError> {
        let valid = !name.is_empty()
            && !name.contains('/')
            && !name.contains('\\')
            && !name.contains("..")
            && !name.starts_with('.');
        if !valid {
            return Err(InfrastructureError::FileStorageError(format!(
                "Invalid blob name: {}",
                name
            )));
        }
        Ok(self.root.join(name))
    }

    pub async fn save(&self, name: &str, data: &[u8]) -> Result<PathBuf, InfrastructureError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.root).await?;
        let mut file = File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        debug!(path = %path.display(), bytes = data.len(), "blob saved");
        Ok(path)
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, InfrastructureError> {
        let path = self.path_for(name)?;
        Ok(fs::read(path).await?)
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.path_for(name) {
            Ok(path) => fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("garment_studio_test_{}", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_read_roundtrip() {
        let root = temp_dir();
        let storage = LocalFileStorage::new(&root);
        let path = storage.save("shirt.glb", b"glTF....").await.unwrap();
        assert!(path.starts_with(&root));
        assert_eq!(storage.read("shirt.glb").await.unwrap(), b"glTF....".to_vec());
        assert!(storage.exists("shirt.glb").await);
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let storage = LocalFileStorage::new(temp_dir());
        for name in ["../secret", "a/b.glb", "", ".hidden"] {
            let err = storage.save(name, b"x").await.unwrap_err();
            assert!(matches!(err, InfrastructureError::FileStorageError(_)));
        }
        assert!(!storage.exists("../secret").await);
    }

    #[tokio::test]
    async fn test_read_missing_blob() {
        let storage = LocalFileStorage::new(temp_dir());
        let err = storage.read("missing.glb").await.unwrap_err();
        assert!(matches!(err, InfrastructureError::IoError(_)));
    }
}
