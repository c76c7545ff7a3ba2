use crate::domain::compositing::{
    blend_source_over, fit_within, CompositorSettings, OverlayMode, TorsoBox,
};
use crate::domain::compositor_trait::{CompositeResult, TryOnCompositor};
use crate::domain::image::Image as DomainImage;
use crate::domain::segmentation::Segmenter;
use super::error::InfrastructureError;
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Rgba, RgbaImage};
use imageproc::map::map_colors2;
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Virtual try-on: shrinks the photo, asks the segmenter about it, then lays
/// the clothing image over the torso box with a fixed opacity.
pub struct DefaultCompositor {
    segmenter: Arc<dyn Segmenter + Send + Sync>,
    settings: CompositorSettings,
}

impl DefaultCompositor {
    pub fn new(segmenter: Arc<dyn Segmenter + Send + Sync>, settings: CompositorSettings) -> Self {
        Self { segmenter, settings }
    }
}

impl TryOnCompositor for DefaultCompositor {
    fn composite(
        &self,
        user_image: &RgbaImage,
        clothing_image: &RgbaImage,
    ) -> Result<CompositeResult, InfrastructureError> {
        ensure_not_empty(user_image, "user photo")?;
        ensure_not_empty(clothing_image, "clothing image")?;

        let canvas = resize_if_needed(user_image, self.settings.max_dimension);
        let (width, height) = canvas.dimensions();

        // セグメンテーションが失敗したら合成全体を失敗させる
        let segmentation = self.segmenter.segment(&canvas)?;
        debug!(segments = segmentation.len(), "segmentation result received");

        let mut clothing_layer =
            render_clothing_layer(clothing_image, width, height, &self.settings.torso_box);

        if let OverlayMode::SegmentMasked { labels } = &self.settings.overlay {
            match segmentation.union_mask(labels, width, height) {
                Some(mask) => clothing_layer = gate_by_mask(&clothing_layer, &mask),
                None => warn!(
                    wanted = ?labels,
                    found = ?segmentation.labels(),
                    "no matching segment, keeping the whole torso box"
                ),
            }
        }

        let opacity = self.settings.opacity;
        let output: RgbaImage = map_colors2(&*canvas, &clothing_layer, |dst, src| {
            blend_source_over(dst, src, opacity)
        });

        let png = encode_png(&output)?;
        info!(width, height, bytes = png.len(), "try-on composite finished");

        Ok(CompositeResult {
            processed_image: DomainImage::new(png, width, height, ImageFormat::Png),
            body_mask: output,
            clothing_mask: clothing_layer,
            segment_count: segmentation.len(),
        })
    }
}

fn ensure_not_empty(image: &RgbaImage, what: &str) -> Result<(), InfrastructureError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(InfrastructureError::ImageProcessingError(format!(
            "{} has no pixels",
            what
        )));
    }
    Ok(())
}

/// Shrinks photos whose longer edge exceeds `max`; anything smaller is
/// borrowed unchanged.
pub fn resize_if_needed(image: &RgbaImage, max: u32) -> Cow<'_, RgbaImage> {
    let (width, height) = image.dimensions();
    let target = fit_within(width, height, max);
    if target == (width, height) {
        return Cow::Borrowed(image);
    }
    debug!(from = ?(width, height), to = ?target, "resizing photo");
    Cow::Owned(imageops::resize(image, target.0, target.1, FilterType::Triangle))
}

/// Transparent canvas with the clothing stretched into the torso box.
pub fn render_clothing_layer(
    clothing: &RgbaImage,
    width: u32,
    height: u32,
    torso_box: &TorsoBox,
) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    if let Some(rect) = torso_box.pixel_rect(width, height) {
        let scaled = imageops::resize(clothing, rect.width(), rect.height(), FilterType::Triangle);
        imageops::replace(&mut layer, &scaled, rect.left() as i64, rect.top() as i64);
    }
    layer
}

fn gate_by_mask(layer: &RgbaImage, mask: &GrayImage) -> RgbaImage {
    map_colors2(layer, mask, |px, m| {
        let alpha = (px[3] as u16 * m[0] as u16 + 127) / 255;
        Rgba([px[0], px[1], px[2], alpha as u8])
    })
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, InfrastructureError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Decodes any format the image crate can guess from the bytes.
pub fn decode_rgba(bytes: &[u8]) -> Result<(RgbaImage, ImageFormat), InfrastructureError> {
    let reader = image::io::Reader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or_else(|| {
        InfrastructureError::DecodingError("Unrecognized image format".to_string())
    })?;
    let image = reader.decode()?.to_rgba8();
    Ok((image, format))
}
