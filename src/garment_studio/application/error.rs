use thiserror::Error;
use crate::domain::error::DomainError; // ドメインエラーをラップするため
use crate::infrastructure::error::InfrastructureError;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Try-on failed: {0}")]
    TryOnFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Domain error occurred: {0}")]
    DomainError(#[from] DomainError),

    #[error("Infrastructure error occurred: {0}")]
    InfrastructureError(#[from] InfrastructureError),

    #[error("Underlying error: {source:?}")]
    AnyhowError {
        #[from]
        source: anyhow::Error,
    }
}

use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::error;

impl ApplicationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplicationError::TryOnFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApplicationError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApplicationError::NotFound(_) => StatusCode::NOT_FOUND,
            ApplicationError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApplicationError::DomainError(_) => StatusCode::BAD_REQUEST,
            ApplicationError::InfrastructureError(infra_err) => match infra_err {
                InfrastructureError::ExternalApiError(_)
                | InfrastructureError::ReqwestError(_)
                | InfrastructureError::SegmentationError(_) => StatusCode::BAD_GATEWAY,
                InfrastructureError::DecodingError(_)
                | InfrastructureError::Base64DecodeError(_) => StatusCode::BAD_REQUEST,
                InfrastructureError::ImageLibError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                InfrastructureError::DomainErrorWrapper(_) => StatusCode::BAD_REQUEST,
                InfrastructureError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApplicationError::AnyhowError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            ApplicationError::AnyhowError { source } => {
                error!(error = ?source, "unhandled error");
                "An unexpected error occurred.".to_string()
            }
            ApplicationError::InfrastructureError(infra_err) => {
                error!(error = ?infra_err, "infrastructure error");
                infra_err.to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
