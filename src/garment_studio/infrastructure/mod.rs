pub mod axum_handler;
pub mod compositor;
pub mod error;
pub mod external_image_fetcher;
pub mod favorites_store;
pub mod file_storage;
pub mod garment_catalog;
pub mod segmenter;
pub mod texture_loader;
