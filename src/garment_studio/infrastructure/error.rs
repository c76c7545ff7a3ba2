use thiserror::Error;
use crate::domain::error::DomainError;

#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("Image processing failed: {0}")]
    ImageProcessingError(String),

    #[error("Segmentation failed: {0}")]
    SegmentationError(String),

    #[error("File storage error: {0}")]
    FileStorageError(String),

    #[error("External API call failed: {0}")]
    ExternalApiError(String),

    #[error("Data decoding failed: {0}")]
    DecodingError(String),

    #[error("Underlying image library error: {0}")]
    ImageLibError(#[from] image::ImageError),

    #[error("Underlying I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // カタログやモデル保存のバリデーションで発生する
    #[error("Domain Error Wrapper: {0}")]
    DomainErrorWrapper(#[from] DomainError),
}
