use super::error::InfrastructureError;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Saved garment ids, written through to a JSON array on disk.
pub struct JsonFileFavorites {
    path: PathBuf,
    ids: RwLock<BTreeSet<u64>>,
}

impl JsonFileFavorites {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InfrastructureError> {
        let path = path.into();
        let ids = match fs::read(&path).await {
            Ok(bytes) => {
                let ids: BTreeSet<u64> = serde_json::from_slice(&bytes)?;
                info!(path = %path.display(), count = ids.len(), "favorites loaded");
                ids
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            ids: RwLock::new(ids),
        })
    }

    pub async fn ids(&self) -> BTreeSet<u64> {
        self.ids.read().await.clone()
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.ids.read().await.contains(&id)
    }

    /// Returns whether the id was newly added.
    pub async fn add(&self, id: u64) -> Result<bool, InfrastructureError> {
        let mut ids = self.ids.write().await;
        if !ids.insert(id) {
            return Ok(false);
        }
        if let Err(e) = self.persist(&ids).await {
            ids.remove(&id);
            return Err(e);
        }
        debug!(id, "favorite added");
        Ok(true)
    }

    /// Returns whether the id was present.
    pub async fn remove(&self, id: u64) -> Result<bool, InfrastructureError> {
        let mut ids = self.ids.write().await;
        if !ids.remove(&id) {
            return Ok(false);
        }
        if let Err(e) = self.persist(&ids).await {
            ids.insert(id);
            return Err(e);
        }
        debug!(id, "favorite removed");
        Ok(true)
    }

    async fn persist(&self, ids: &BTreeSet<u64>) -> Result<(), InfrastructureError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec(ids)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::file_storage::temp_dir;

    #[tokio::test]
    async fn test_add_remove_and_reopen() {
        let dir = temp_dir();
        let path = dir.join("favorites.json");
        let favorites = JsonFileFavorites::open(&path).await.unwrap();
        assert!(favorites.ids().await.is_empty());

        assert!(favorites.add(3).await.unwrap());
        assert!(!favorites.add(3).await.unwrap());
        assert!(favorites.add(1).await.unwrap());
        assert!(favorites.remove(1).await.unwrap());
        assert!(!favorites.remove(1).await.unwrap());

        let reopened = JsonFileFavorites::open(&path).await.unwrap();
        assert_eq!(reopened.ids().await.into_iter().collect::<Vec<_>>(), vec![3]);
        assert!(reopened.contains(3).await);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("favorites.json");
        std::fs::write(&path, b"{\"ids\": 1}").unwrap();
        assert!(matches!(
            JsonFileFavorites::open(&path).await,
            Err(InfrastructureError::JsonError(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}
