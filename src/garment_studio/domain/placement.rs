//! Slider positions of the placement editor and the placement values they
//! stand for. All transforms are linear and clamp the slider to its range.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::ops::RangeInclusive;

pub const POSITION_SLIDER_RANGE: RangeInclusive<f32> = -100.0..=100.0;
pub const SCALE_SLIDER_RANGE: RangeInclusive<f32> = 10.0..=200.0;
pub const ROTATION_SLIDER_RANGE: RangeInclusive<f32> = 0.0..=100.0;

const SLIDER_UNITS_PER_OFFSET: f32 = 50.0;
const SLIDER_UNITS_PER_SCALE: f32 = 50.0;

/// Where a design is drawn on its garment face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignPlacement {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// Radians.
    pub rotation: f32,
}

impl Default for DesignPlacement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.2,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// Raw slider values as the editor reports them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementSliders {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
}

fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

pub fn offset_from_slider(value: f32) -> f32 {
    clamp_to(value, &POSITION_SLIDER_RANGE) / SLIDER_UNITS_PER_OFFSET
}

pub fn offset_to_slider(offset: f32) -> f32 {
    offset * SLIDER_UNITS_PER_OFFSET
}

pub fn scale_from_slider(value: f32) -> f32 {
    clamp_to(value, &SCALE_SLIDER_RANGE) / SLIDER_UNITS_PER_SCALE
}

pub fn scale_to_slider(scale: f32) -> f32 {
    scale * SLIDER_UNITS_PER_SCALE
}

/// Size readout shown next to the scale slider; 100 % is the design's natural size.
pub fn scale_to_percent(scale: f32) -> f32 {
    scale * 100.0
}

pub fn scale_from_percent(percent: f32) -> f32 {
    percent / 100.0
}

pub fn rotation_from_slider(value: f32) -> f32 {
    clamp_to(value, &ROTATION_SLIDER_RANGE) / 100.0 * PI * 2.0
}

pub fn rotation_to_slider(rotation: f32) -> f32 {
    rotation / (PI * 2.0) * 100.0
}

pub fn rotation_to_degrees(rotation: f32) -> i32 {
    (rotation / PI * 180.0).round() as i32
}

impl From<PlacementSliders> for DesignPlacement {
    fn from(sliders: PlacementSliders) -> Self {
        Self {
            x: offset_from_slider(sliders.x),
            y: offset_from_slider(sliders.y),
            scale: scale_from_slider(sliders.scale),
            rotation: rotation_from_slider(sliders.rotation),
        }
    }
}

impl From<DesignPlacement> for PlacementSliders {
    fn from(placement: DesignPlacement) -> Self {
        Self {
            x: offset_to_slider(placement.x),
            y: offset_to_slider(placement.y),
            scale: scale_to_slider(placement.scale),
            rotation: rotation_to_slider(placement.rotation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_offset_mapping() {
        assert_eq!(offset_from_slider(-100.0), -2.0);
        assert_eq!(offset_from_slider(0.0), 0.0);
        assert_eq!(offset_from_slider(100.0), 2.0);
        assert_eq!(offset_from_slider(10.0), 0.2);
    }

    #[test]
    fn test_scale_mapping() {
        assert_eq!(scale_from_slider(50.0), 1.0);
        assert_eq!(scale_from_slider(200.0), 4.0);
        assert_eq!(scale_from_slider(100.0), 2.0);
        assert_eq!(scale_from_percent(100.0), 1.0);
        assert_eq!(scale_to_percent(1.0), 100.0);
    }

    #[test]
    fn test_slider_values_are_clamped() {
        assert_eq!(offset_from_slider(250.0), 2.0);
        assert_eq!(scale_from_slider(0.0), 0.2);
        assert_eq!(scale_from_slider(1000.0), 4.0);
        assert!(approx(rotation_from_slider(-5.0), 0.0));
    }

    #[test]
    fn test_rotation_mapping() {
        assert!(approx(rotation_from_slider(25.0), PI / 2.0));
        assert!(approx(rotation_from_slider(100.0), PI * 2.0));
        assert_eq!(rotation_to_degrees(rotation_from_slider(25.0)), 90);
    }

    #[test]
    fn test_transforms_are_idempotent() {
        let sliders = PlacementSliders {
            x: 30.0,
            y: -40.0,
            scale: 75.0,
            rotation: 12.0,
        };
        let first = DesignPlacement::from(sliders);
        let second = DesignPlacement::from(sliders);
        assert_eq!(first, second);
    }

    #[test]
    fn test_transforms_invert_within_range() {
        let sliders = PlacementSliders {
            x: -73.0,
            y: 55.0,
            scale: 135.0,
            rotation: 62.0,
        };
        let back = PlacementSliders::from(DesignPlacement::from(sliders));
        assert!(approx(back.x, sliders.x));
        assert!(approx(back.y, sliders.y));
        assert!(approx(back.scale, sliders.scale));
        assert!(approx(back.rotation, sliders.rotation));
    }

    #[test]
    fn test_default_placement_is_reset_value() {
        let placement = DesignPlacement::default();
        assert_eq!(placement.x, 0.0);
        assert_eq!(placement.y, 0.2);
        assert_eq!(placement.scale, 1.0);
        assert_eq!(placement.rotation, 0.0);
        assert!(approx(PlacementSliders::from(placement).y, 10.0));
    }
}
