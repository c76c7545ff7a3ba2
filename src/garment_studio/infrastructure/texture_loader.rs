use super::compositor::decode_rgba;
use super::error::InfrastructureError;
use super::external_image_fetcher::{truncate_for_log, DefaultExternalImageFetcher};
use crate::domain::image::Texture;
use std::sync::Arc;
use tracing::debug;

/// Turns a design source (http(s) or data URL) into a texture.
pub struct DefaultTextureLoader {
    fetcher: Arc<DefaultExternalImageFetcher>,
}

impl DefaultTextureLoader {
    pub fn new(fetcher: Arc<DefaultExternalImageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn load(&self, source: &str) -> Result<Texture, InfrastructureError> {
        debug!(source = truncate_for_log(source), "loading design texture");
        let bytes = self.fetcher.fetch_image_from_url(source).await?;

        let (image, format) = tokio::task::spawn_blocking(move || decode_rgba(&bytes))
            .await
            .map_err(|e| InfrastructureError::ImageProcessingError(format!("texture decode task failed: {}", e)))??;
        debug!(?format, width = image.width(), height = image.height(), "design texture decoded");

        Ok(Texture::new(image))
    }
}
