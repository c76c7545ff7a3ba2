use std::sync::Arc;
use tracing::info;

use super::error::ApplicationError;
use crate::domain::garment::{CategoryCount, Garment, GarmentCategory, NewGarment};
use crate::domain::model_asset::{ModelAsset, ModelFormat};
use crate::infrastructure::favorites_store::JsonFileFavorites;
use crate::infrastructure::file_storage::LocalFileStorage;
use crate::infrastructure::garment_catalog::JsonFileCatalog;

/// Garment catalog, the shopper's favorites, and the 3D model files garments
/// point at.
pub struct CatalogService {
    catalog: Arc<JsonFileCatalog>,
    favorites: Arc<JsonFileFavorites>,
    models: Arc<LocalFileStorage>,
}

impl CatalogService {
    pub fn new(
        catalog: Arc<JsonFileCatalog>,
        favorites: Arc<JsonFileFavorites>,
        models: Arc<LocalFileStorage>,
    ) -> Self {
        Self {
            catalog,
            favorites,
            models,
        }
    }

    pub async fn list(&self, category: Option<GarmentCategory>) -> Vec<Garment> {
        self.catalog.list(category).await
    }

    pub async fn get(&self, id: u64) -> Result<Garment, ApplicationError> {
        self.catalog
            .get(id)
            .await
            .ok_or_else(|| ApplicationError::NotFound(format!("garment {}", id)))
    }

    pub async fn categories(&self) -> Vec<CategoryCount> {
        self.catalog.categories().await
    }

    /// Favorited garments, optionally narrowed to one category.
    pub async fn favorites(&self, category: Option<GarmentCategory>) -> Vec<Garment> {
        let ids = self.favorites.ids().await;
        self.catalog
            .list(category)
            .await
            .into_iter()
            .filter(|g| ids.contains(&g.id))
            .collect()
    }

    pub async fn add_favorite(&self, id: u64) -> Result<Garment, ApplicationError> {
        let garment = self.get(id).await?;
        if self.favorites.add(id).await? {
            info!(id, "garment favorited");
        }
        Ok(garment)
    }

    pub async fn remove_favorite(&self, id: u64) -> Result<(), ApplicationError> {
        if !self.favorites.remove(id).await? {
            return Err(ApplicationError::NotFound(format!("favorite {}", id)));
        }
        info!(id, "garment unfavorited");
        Ok(())
    }

    /// Flips the favorite flag; returns whether the garment is now a favorite.
    pub async fn toggle_favorite(&self, id: u64) -> Result<bool, ApplicationError> {
        if self.favorites.contains(id).await {
            self.remove_favorite(id).await?;
            Ok(false)
        } else {
            self.add_favorite(id).await?;
            Ok(true)
        }
    }

    pub async fn add_garment(&self, new_garment: NewGarment) -> Result<Garment, ApplicationError> {
        if let Some(model_path) = new_garment.model_path.as_deref() {
            if !self.models.exists(model_path).await {
                return Err(ApplicationError::BadRequest(format!(
                    "model {} has not been uploaded",
                    model_path
                )));
            }
        }
        Ok(self.catalog.insert(new_garment).await?)
    }

    /// Stores an uploaded glTF/GLB file under a fresh name.
    pub async fn upload_model(
        &self,
        file_name: &str,
        data: &[u8],
    ) -> Result<ModelAsset, ApplicationError> {
        let format = ModelFormat::from_file_name(file_name)?;
        format.validate_content(data)?;

        let name = format!("{}.{}", uuid::Uuid::new_v4(), format.extension());
        self.models.save(&name, data).await?;
        info!(original = file_name, stored = %name, bytes = data.len(), "model uploaded");

        Ok(ModelAsset {
            path: name,
            format,
            size_bytes: data.len() as u64,
        })
    }

    /// Model bytes and their content type.
    pub async fn read_model(&self, name: &str) -> Result<(Vec<u8>, &'static str), ApplicationError> {
        let format = ModelFormat::from_file_name(name)?;
        if !self.models.exists(name).await {
            return Err(ApplicationError::NotFound(format!("model {}", name)));
        }
        let data = self.models.read(name).await?;
        Ok((data, format.content_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::infrastructure::file_storage::temp_dir;
    use std::path::PathBuf;

    const GLB: &[u8] = b"glTF\x02\x00\x00\x00\x0c\x00\x00\x00";

    async fn service() -> (CatalogService, PathBuf) {
        let dir = temp_dir();
        let catalog = JsonFileCatalog::open(dir.join("garments.json")).await.unwrap();
        let favorites = JsonFileFavorites::open(dir.join("favorites.json")).await.unwrap();
        let models = LocalFileStorage::new(dir.join("models"));
        (
            CatalogService::new(Arc::new(catalog), Arc::new(favorites), Arc::new(models)),
            dir,
        )
    }

    fn new_garment(model_path: Option<String>) -> NewGarment {
        NewGarment {
            name: "Oxford Shirt".to_string(),
            category: GarmentCategory::Shirt,
            price: 4999,
            image_url: "https://example.com/oxford.png".to_string(),
            description: String::new(),
            sizes: vec!["L".to_string()],
            colors: vec!["blue".to_string()],
            model_path,
        }
    }

    #[tokio::test]
    async fn test_upload_and_read_model() {
        let (service, dir) = service().await;
        let asset = service.upload_model("Shirt.GLB", GLB).await.unwrap();
        assert_eq!(asset.format, ModelFormat::Glb);
        assert!(asset.path.ends_with(".glb"));
        assert_eq!(asset.size_bytes, GLB.len() as u64);

        let (data, content_type) = service.read_model(&asset.path).await.unwrap();
        assert_eq!(data, GLB.to_vec());
        assert_eq!(content_type, "model/gltf-binary");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_extension() {
        let (service, _dir) = service().await;
        let err = service.upload_model("shirt.obj", b"o shirt").await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::DomainError(DomainError::UnsupportedModelFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_gltf() {
        let (service, _dir) = service().await;
        let err = service.upload_model("shirt.gltf", br#"{"scenes": []}"#).await.unwrap_err();
        assert!(matches!(err, ApplicationError::DomainError(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_read_missing_model() {
        let (service, _dir) = service().await;
        let err = service.read_model("nothing.glb").await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_garment_requires_uploaded_model() {
        let (service, dir) = service().await;
        let err = service
            .add_garment(new_garment(Some("missing.glb".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::BadRequest(_)));

        let asset = service.upload_model("oxford.glb", GLB).await.unwrap();
        let garment = service.add_garment(new_garment(Some(asset.path.clone()))).await.unwrap();
        assert_eq!(garment.model_path, Some(asset.path));
        assert_eq!(service.get(garment.id).await.unwrap().name, "Oxford Shirt");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_get_unknown_garment() {
        let (service, _dir) = service().await;
        assert!(matches!(service.get(1234).await, Err(ApplicationError::NotFound(_))));
        assert_eq!(service.list(Some(GarmentCategory::Shirt)).await.len(), 3);
        assert_eq!(service.categories().await[0].id, "all");
    }

    #[tokio::test]
    async fn test_favorites_filter_by_category() {
        let (service, dir) = service().await;
        service.add_favorite(1).await.unwrap();
        service.add_favorite(2).await.unwrap();
        assert!(service.toggle_favorite(4).await.unwrap());

        let all: Vec<u64> = service.favorites(None).await.iter().map(|g| g.id).collect();
        assert_eq!(all, vec![1, 2, 4]);
        let shirts = service.favorites(Some(GarmentCategory::Shirt)).await;
        assert!(shirts.iter().all(|g| g.category == GarmentCategory::Shirt));
        assert!(shirts.iter().any(|g| g.id == 2));

        assert!(!service.toggle_favorite(4).await.unwrap());
        service.remove_favorite(1).await.unwrap();
        let all: Vec<u64> = service.favorites(None).await.iter().map(|g| g.id).collect();
        assert_eq!(all, vec![2]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_favorite_unknown_garment() {
        let (service, _dir) = service().await;
        assert!(matches!(service.add_favorite(999).await, Err(ApplicationError::NotFound(_))));
        assert!(matches!(service.remove_favorite(5).await, Err(ApplicationError::NotFound(_))));
        assert!(service.favorites(None).await.is_empty());
    }
}
