use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::error::ApplicationError;
use crate::domain::compositor_trait::{CompositeResult, TryOnCompositor};
use crate::domain::image::Image as DomainImage;
use crate::infrastructure::compositor::decode_rgba;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::external_image_fetcher::{truncate_for_log, DefaultExternalImageFetcher};
use crate::infrastructure::garment_catalog::JsonFileCatalog;

#[derive(Debug, Clone)]
pub enum TryOnOutcome {
    Composited(CompositeResult),
    /// Compositing failed; the caller shows the unprocessed photo instead.
    Fallback { original: DomainImage, reason: String },
}

impl TryOnOutcome {
    pub fn image(&self) -> &DomainImage {
        match self {
            TryOnOutcome::Composited(result) => &result.processed_image,
            TryOnOutcome::Fallback { original, .. } => original,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TryOnOutcome::Fallback { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TryOnOutcome::Composited(_) => "composited",
            TryOnOutcome::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Default)]
struct LatestResult {
    sequence: u64,
    image: Option<DomainImage>,
}

pub struct TryOnService {
    compositor: Arc<dyn TryOnCompositor + Send + Sync>,
    image_fetcher: Arc<DefaultExternalImageFetcher>,
    catalog: Arc<JsonFileCatalog>,
    latest: Mutex<LatestResult>,
    sequence: AtomicU64,
}

impl TryOnService {
    pub fn new(
        compositor: Arc<dyn TryOnCompositor + Send + Sync>,
        image_fetcher: Arc<DefaultExternalImageFetcher>,
        catalog: Arc<JsonFileCatalog>,
    ) -> Self {
        Self {
            compositor,
            image_fetcher,
            catalog,
            latest: Mutex::new(LatestResult::default()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Image of the most recent try-on, composited or not.
    pub fn latest(&self) -> Option<DomainImage> {
        self.latest.lock().ok().and_then(|latest| latest.image.clone())
    }

    fn store_latest(&self, sequence: u64, image: &DomainImage) -> bool {
        let Ok(mut latest) = self.latest.lock() else {
            return false;
        };
        // 古いリクエストの結果で新しい結果を上書きしない
        if sequence < latest.sequence {
            return false;
        }
        latest.sequence = sequence;
        latest.image = Some(image.clone());
        true
    }

    pub async fn try_on(
        &self,
        user_photo: Vec<u8>,
        clothing_image: Vec<u8>,
    ) -> Result<TryOnOutcome, ApplicationError> {
        self.run(user_photo, Ok(clothing_image)).await
    }

    pub async fn try_on_from_sources(
        &self,
        user_source: &str,
        clothing_source: &str,
    ) -> Result<TryOnOutcome, ApplicationError> {
        info!(
            user = truncate_for_log(user_source),
            clothing = truncate_for_log(clothing_source),
            "try-on requested"
        );
        let user_photo = self.image_fetcher.fetch_image_from_url(user_source).await?;
        let clothing = self
            .image_fetcher
            .fetch_image_from_url(clothing_source)
            .await
            .map_err(|e| format!("could not load clothing image: {}", e));
        self.run(user_photo, clothing).await
    }

    pub async fn try_on_garment(
        &self,
        user_source: &str,
        garment_id: u64,
    ) -> Result<TryOnOutcome, ApplicationError> {
        let garment = self
            .catalog
            .get(garment_id)
            .await
            .ok_or_else(|| ApplicationError::NotFound(format!("garment {}", garment_id)))?;
        self.try_on_from_sources(user_source, &garment.image_url).await
    }

    async fn run(
        &self,
        user_photo: Vec<u8>,
        clothing_image: Result<Vec<u8>, String>,
    ) -> Result<TryOnOutcome, ApplicationError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let compositor = Arc::clone(&self.compositor);

        let (original, composite) = tokio::task::spawn_blocking(move || {
            let (user_image, format) = decode_rgba(&user_photo)?;
            let original = DomainImage::new(user_photo, user_image.width(), user_image.height(), format);

            let composite = clothing_image.and_then(|bytes| {
                let (clothing, _) = decode_rgba(&bytes).map_err(|e| format!("could not decode clothing image: {}", e))?;
                compositor.composite(&user_image, &clothing).map_err(|e| e.to_string())
            });
            Ok::<_, InfrastructureError>((original, composite))
        })
        .await
        .map_err(|e| ApplicationError::TryOnFailed(format!("try-on task failed: {}", e)))??;

        let outcome = match composite {
            Ok(result) => {
                info!(
                    sequence,
                    segments = result.segment_count,
                    "try-on composited"
                );
                TryOnOutcome::Composited(result)
            }
            Err(reason) => {
                warn!(sequence, %reason, "try-on failed, falling back to the original photo");
                TryOnOutcome::Fallback { original, reason }
            }
        };

        if !self.store_latest(sequence, outcome.image()) {
            warn!(sequence, "a newer try-on already finished, result not kept");
        }
        Ok(outcome)
    }
}
