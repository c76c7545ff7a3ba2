use super::error::InfrastructureError;
use crate::domain::garment::{category_counts, seed_collection, CategoryCount, Garment, GarmentCategory, NewGarment};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Garment catalog kept in memory and written through to a JSON file.
pub struct JsonFileCatalog {
    path: PathBuf,
    garments: RwLock<Vec<Garment>>,
}

impl JsonFileCatalog {
    /// Reads the catalog file, or starts from the built-in collection when
    /// there is none yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InfrastructureError> {
        let path = path.into();
        let garments = match fs::read(&path).await {
            Ok(bytes) => {
                let garments: Vec<Garment> = serde_json::from_slice(&bytes)?;
                info!(path = %path.display(), count = garments.len(), "garment catalog loaded");
                garments
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "no garment catalog yet, starting from the default collection");
                seed_collection()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            garments: RwLock::new(garments),
        })
    }

    pub async fn list(&self, category: Option<GarmentCategory>) -> Vec<Garment> {
        let garments = self.garments.read().await;
        garments
            .iter()
            .filter(|g| category.map_or(true, |c| g.category == c))
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: u64) -> Option<Garment> {
        self.garments.read().await.iter().find(|g| g.id == id).cloned()
    }

    pub async fn categories(&self) -> Vec<CategoryCount> {
        category_counts(&self.garments.read().await)
    }

    pub async fn insert(&self, new_garment: NewGarment) -> Result<Garment, InfrastructureError> {
        new_garment.validate()?;

        let mut garments = self.garments.write().await;
        let id = garments.iter().map(|g| g.id).max().unwrap_or(0) + 1;
        let garment = new_garment.into_garment(id);
        garments.push(garment.clone());

        if let Err(e) = self.persist(&garments).await {
            garments.pop();
            return Err(e);
        }
        info!(id, name = %garment.name, "garment added to catalog");
        Ok(garment)
    }

    async fn persist(&self, garments: &[Garment]) -> Result<(), InfrastructureError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(garments)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}
