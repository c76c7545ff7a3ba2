use image::{ImageFormat, RgbaImage};
use serde::Serialize;

/// An encoded raster together with the metadata probed while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl Image {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: ImageFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            _ => "application/octet-stream",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrap {
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sampler {
    pub wrap: Wrap,
    pub min_filter: Filter,
    pub mag_filter: Filter,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            wrap: Wrap::ClampToEdge,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
        }
    }
}

/// A decoded design, ready to be mapped onto a garment face.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: RgbaImage,
    pub sampler: Sampler,
    // デザインは上下反転させずにそのまま貼る
    pub flip_y: bool,
}

impl Texture {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            sampler: Sampler::default(),
            flip_y: false,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
