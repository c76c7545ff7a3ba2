use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::error::ApplicationError;
use crate::domain::compositing::{
    CompositorSettings, OverlayMode, DEFAULT_OVERLAY_OPACITY, MAX_IMAGE_DIMENSION,
};

/// Garment studio server: virtual try-on, design editing and the garment catalog.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "GARMENT_STUDIO_BIND", default_value = "0.0.0.0:3300")]
    pub bind: SocketAddr,

    /// Directory with the built front end
    #[arg(long, env = "GARMENT_STUDIO_STATIC_DIR", default_value = "frontend/build")]
    pub static_dir: PathBuf,

    /// Directory for the garment catalog and uploaded models
    #[arg(long, env = "GARMENT_STUDIO_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Endpoint of the segmentation service; without it no segmentation runs
    #[arg(long, env = "GARMENT_STUDIO_SEGMENTATION_URL")]
    pub segmentation_url: Option<String>,

    /// Bearer token for the segmentation service
    #[arg(long, env = "GARMENT_STUDIO_SEGMENTATION_TOKEN", hide_env_values = true)]
    pub segmentation_token: Option<String>,

    #[arg(long, env = "GARMENT_STUDIO_SEGMENTATION_TIMEOUT_SECS", default_value_t = 60)]
    pub segmentation_timeout_secs: u64,

    /// Photos larger than this (either edge) are scaled down before compositing
    #[arg(long, env = "GARMENT_STUDIO_MAX_IMAGE_DIMENSION", default_value_t = MAX_IMAGE_DIMENSION)]
    pub max_image_dimension: u32,

    /// Opacity of the clothing overlay (0.0 - 1.0)
    #[arg(long, env = "GARMENT_STUDIO_OVERLAY_OPACITY", default_value_t = DEFAULT_OVERLAY_OPACITY)]
    pub overlay_opacity: f32,

    /// Keep the clothing only where the segmenter found one of the mask labels
    #[arg(long, env = "GARMENT_STUDIO_MASK_OVERLAY")]
    pub mask_overlay: bool,

    /// Segment labels that count as the body when masking the overlay
    #[arg(
        long,
        env = "GARMENT_STUDIO_MASK_LABELS",
        value_delimiter = ',',
        default_value = "person"
    )]
    pub mask_labels: Vec<String>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "GARMENT_STUDIO_BODY_LIMIT", default_value_t = 20 * 1024 * 1024)]
    pub body_limit: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "GARMENT_STUDIO_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn segmentation_timeout(&self) -> Duration {
        Duration::from_secs(self.segmentation_timeout_secs)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("garments.json")
    }

    pub fn favorites_path(&self) -> PathBuf {
        self.data_dir.join("favorites.json")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    pub fn compositor_settings(&self) -> Result<CompositorSettings, ApplicationError> {
        let overlay = if self.mask_overlay {
            OverlayMode::SegmentMasked {
                labels: self.mask_labels.clone(),
            }
        } else {
            OverlayMode::FixedBox
        };
        let settings = CompositorSettings {
            max_dimension: self.max_image_dimension,
            opacity: self.overlay_opacity,
            overlay,
            ..CompositorSettings::default()
        };
        settings
            .validate()
            .map_err(|e| ApplicationError::ConfigurationError(e.to_string()))?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["garment_studio"]).unwrap();
        assert_eq!(config.bind, "0.0.0.0:3300".parse::<SocketAddr>().unwrap());
        assert_eq!(config.static_dir, PathBuf::from("frontend/build"));
        assert_eq!(config.catalog_path(), PathBuf::from("data/garments.json"));
        assert_eq!(config.favorites_path(), PathBuf::from("data/favorites.json"));
        assert_eq!(config.segmentation_timeout(), Duration::from_secs(60));
        assert_eq!(config.body_limit, 20 * 1024 * 1024);

        let settings = config.compositor_settings().unwrap();
        assert_eq!(settings, CompositorSettings::default());
    }

    #[test]
    fn test_mask_overlay_labels() {
        let config = Config::try_parse_from([
            "garment_studio",
            "--mask-overlay",
            "--mask-labels",
            "upper-clothes,person",
        ])
        .unwrap();
        assert_eq!(
            config.compositor_settings().unwrap().overlay,
            OverlayMode::SegmentMasked {
                labels: vec!["upper-clothes".to_string(), "person".to_string()]
            }
        );
    }

    #[test]
    fn test_invalid_opacity_is_rejected() {
        let config =
            Config::try_parse_from(["garment_studio", "--overlay-opacity", "1.5"]).unwrap();
        assert!(matches!(
            config.compositor_settings(),
            Err(ApplicationError::ConfigurationError(_))
        ));
    }
}
