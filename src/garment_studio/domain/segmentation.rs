use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};

use crate::infrastructure::error::InfrastructureError;

/// One labelled region reported by the segmentation model.
#[derive(Debug, Clone)]
pub struct Segment {
    pub label: String,
    pub score: Option<f32>,
    pub mask: GrayImage,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentationResult {
    pub segments: Vec<Segment>,
}

impl SegmentationResult {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.label.as_str()).collect()
    }

    /// Union of the masks whose label is listed (case-insensitive), scaled to
    /// `width` x `height`. `None` when no segment matches.
    pub fn union_mask(&self, labels: &[String], width: u32, height: u32) -> Option<GrayImage> {
        let mut matched = self
            .segments
            .iter()
            .filter(|s| labels.iter().any(|l| l.eq_ignore_ascii_case(&s.label)))
            .peekable();
        matched.peek()?;

        let mut union = GrayImage::new(width, height);
        for segment in matched {
            let mask = if segment.mask.dimensions() == (width, height) {
                segment.mask.clone()
            } else {
                imageops::resize(&segment.mask, width, height, FilterType::Triangle)
            };
            for (dst, src) in union.pixels_mut().zip(mask.pixels()) {
                *dst = Luma([dst[0].max(src[0])]);
            }
        }
        Some(union)
    }
}

// 外部の推論モデルを差し替えられるようにトレイトで切り出す
#[cfg_attr(test, mockall::automock)]
pub trait Segmenter {
    fn segment(&self, image: &RgbaImage) -> Result<SegmentationResult, InfrastructureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(label: &str, mask: GrayImage) -> Segment {
        Segment {
            label: label.to_string(),
            score: Some(0.9),
            mask,
        }
    }

    #[test]
    fn test_union_mask_none_without_matching_label() {
        let result = SegmentationResult::new(vec![segment("wall", GrayImage::new(2, 2))]);
        assert!(result.union_mask(&["person".to_string()], 2, 2).is_none());
    }

    #[test]
    fn test_union_mask_combines_matching_segments() {
        let mut left = GrayImage::new(2, 1);
        left.put_pixel(0, 0, Luma([255]));
        let mut right = GrayImage::new(2, 1);
        right.put_pixel(1, 0, Luma([128]));
        let mut ignored = GrayImage::new(2, 1);
        ignored.put_pixel(1, 0, Luma([255]));

        let result = SegmentationResult::new(vec![
            segment("Person", left),
            segment("upper-clothes", right),
            segment("sky", ignored),
        ]);
        let labels = vec!["person".to_string(), "upper-clothes".to_string()];
        let mask = result.union_mask(&labels, 2, 1).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn test_union_mask_is_scaled_to_canvas() {
        let mut full = GrayImage::new(4, 4);
        for p in full.pixels_mut() {
            *p = Luma([255]);
        }
        let result = SegmentationResult::new(vec![segment("person", full)]);
        let mask = result.union_mask(&["person".to_string()], 8, 2).unwrap();
        assert_eq!(mask.dimensions(), (8, 2));
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_labels_listed_in_order() {
        let result = SegmentationResult::new(vec![
            segment("person", GrayImage::new(1, 1)),
            segment("floor", GrayImage::new(1, 1)),
        ]);
        assert_eq!(result.labels(), vec!["person", "floor"]);
        assert_eq!(result.len(), 2);
        assert!(!result.is_empty());
    }
}
