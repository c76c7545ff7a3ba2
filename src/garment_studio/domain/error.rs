use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported 3D model format: {0}")]
    UnsupportedModelFormat(String),
}
