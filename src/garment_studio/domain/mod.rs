pub mod compositing;
pub mod compositor_trait;
pub mod design_side;
pub mod error;
pub mod garment;
pub mod image;
pub mod model_asset;
pub mod placement;
pub mod segmentation;
pub mod texture_state;
