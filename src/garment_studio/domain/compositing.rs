use image::Rgba;
use imageproc::rect::Rect;

use crate::domain::error::DomainError;

/// Longest edge the user photo is allowed to keep before segmentation.
pub const MAX_IMAGE_DIMENSION: u32 = 1024;
pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.8;

/// Region of the canvas the clothing image is stretched into, in normalized
/// canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsoBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for TorsoBox {
    fn default() -> Self {
        Self {
            left: 0.2,
            top: 0.15,
            width: 0.6,
            height: 0.5,
        }
    }
}

impl TorsoBox {
    /// Pixel rectangle for a canvas of the given size, or `None` when the box
    /// collapses to nothing (tiny canvases).
    pub fn pixel_rect(&self, canvas_width: u32, canvas_height: u32) -> Option<Rect> {
        let w = canvas_width as f64;
        let h = canvas_height as f64;
        let x = (w * self.left).floor() as i32;
        let y = (h * self.top).floor() as i32;
        let width = (w * self.width).floor() as u32;
        let height = (h * self.height).floor() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Rect::at(x, y).of_size(width, height))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayMode {
    /// Clothing fills the torso box regardless of what the segmenter found.
    FixedBox,
    /// Clothing is only kept where one of the listed segment labels covers the pixel.
    SegmentMasked { labels: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositorSettings {
    pub max_dimension: u32,
    pub opacity: f32,
    pub torso_box: TorsoBox,
    pub overlay: OverlayMode,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            max_dimension: MAX_IMAGE_DIMENSION,
            opacity: DEFAULT_OVERLAY_OPACITY,
            torso_box: TorsoBox::default(),
            overlay: OverlayMode::FixedBox,
        }
    }
}

impl CompositorSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_dimension == 0 {
            return Err(DomainError::InvalidInput(
                "max image dimension must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(DomainError::InvalidInput(format!(
                "overlay opacity must be within 0..=1, got {}",
                self.opacity
            )));
        }
        if let OverlayMode::SegmentMasked { labels } = &self.overlay {
            if labels.is_empty() {
                return Err(DomainError::InvalidInput(
                    "mask overlay needs at least one segment label".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Target size for a photo so that neither edge exceeds `max`, keeping the
/// aspect ratio. Photos already within bounds keep their size.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    if width > height {
        let scaled = (height as f64 * max as f64 / width as f64).round() as u32;
        (max, scaled.max(1))
    } else {
        let scaled = (width as f64 * max as f64 / height as f64).round() as u32;
        (scaled.max(1), max)
    }
}

/// Straight-alpha source-over with an extra global alpha applied to `src`.
pub fn blend_source_over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let src_alpha = (src[3] as f32 / 255.0) * opacity;
    if src_alpha <= 0.0 {
        return dst;
    }
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value =
            (src[c] as f32 * src_alpha + dst[c] as f32 * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within_keeps_small_images() {
        assert_eq!(fit_within(800, 600, 1024), (800, 600));
        assert_eq!(fit_within(1024, 1024, 1024), (1024, 1024));
        assert_eq!(fit_within(1, 1023, 1024), (1, 1023));
    }

    #[test]
    fn test_fit_within_scales_longest_edge_to_max() {
        assert_eq!(fit_within(2048, 1024, 1024), (1024, 512));
        assert_eq!(fit_within(1000, 3000, 1024), (341, 1024));
        assert_eq!(fit_within(4000, 4000, 1024), (1024, 1024));

        let (w, h) = fit_within(3000, 1999, 1024);
        assert_eq!(w, 1024);
        let original_ratio = 3000.0 / 1999.0;
        let ratio = w as f64 / h as f64;
        assert!((ratio - original_ratio).abs() < 0.01);
    }

    #[test]
    fn test_fit_within_never_collapses_an_edge() {
        assert_eq!(fit_within(5000, 1, 1024), (1024, 1));
    }

    #[test]
    fn test_torso_box_pixel_rect() {
        let rect = TorsoBox::default().pixel_rect(100, 200).unwrap();
        assert_eq!(rect.left(), 20);
        assert_eq!(rect.top(), 30);
        assert_eq!(rect.width(), 60);
        assert_eq!(rect.height(), 100);
    }

    #[test]
    fn test_torso_box_floors_like_canvas_math() {
        let rect = TorsoBox::default().pixel_rect(333, 101).unwrap();
        assert_eq!(rect.left(), 66);
        assert_eq!(rect.top(), 15);
        assert_eq!(rect.width(), 199);
        assert_eq!(rect.height(), 50);
    }

    #[test]
    fn test_torso_box_empty_on_tiny_canvas() {
        assert!(TorsoBox::default().pixel_rect(1, 1).is_none());
    }

    #[test]
    fn test_blend_source_over_with_global_alpha() {
        let red = Rgba([255, 0, 0, 255]);
        let blue = Rgba([0, 0, 255, 255]);
        assert_eq!(blend_source_over(red, blue, 0.8), Rgba([51, 0, 204, 255]));
    }

    #[test]
    fn test_blend_ignores_transparent_source() {
        let red = Rgba([255, 0, 0, 255]);
        assert_eq!(blend_source_over(red, Rgba([0, 0, 0, 0]), 0.8), red);
    }

    #[test]
    fn test_blend_onto_transparent_destination() {
        let out = blend_source_over(Rgba([0, 0, 0, 0]), Rgba([10, 20, 30, 255]), 0.8);
        assert_eq!(out, Rgba([10, 20, 30, 204]));
    }

    #[test]
    fn test_settings_validation() {
        assert!(CompositorSettings::default().validate().is_ok());

        let bad_opacity = CompositorSettings {
            opacity: 1.5,
            ..CompositorSettings::default()
        };
        assert!(matches!(bad_opacity.validate(), Err(DomainError::InvalidInput(_))));

        let no_labels = CompositorSettings {
            overlay: OverlayMode::SegmentMasked { labels: vec![] },
            ..CompositorSettings::default()
        };
        assert!(no_labels.validate().is_err());
    }
}
