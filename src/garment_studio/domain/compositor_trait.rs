use crate::domain::image::Image as DomainImage;
use crate::infrastructure::error::InfrastructureError;
use image::RgbaImage;

/// Everything one try-on pass produces. Replaced by the next attempt.
#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub processed_image: DomainImage,
    /// Pixels of the composited output canvas.
    pub body_mask: RgbaImage,
    /// Pixels of the clothing layer before it was blended.
    pub clothing_mask: RgbaImage,
    pub segment_count: usize,
}

// ユーザー写真と服の画像から合成画像を作る
#[cfg_attr(test, mockall::automock)]
pub trait TryOnCompositor {
    fn composite(
        &self,
        user_image: &RgbaImage,
        clothing_image: &RgbaImage,
    ) -> Result<CompositeResult, InfrastructureError>;
}
