use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::error::DomainError;

const GLB_MAGIC: &[u8; 4] = b"glTF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Glb,
    Gltf,
}

impl ModelFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, DomainError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("glb") => Ok(ModelFormat::Glb),
            Some("gltf") => Ok(ModelFormat::Gltf),
            _ => Err(DomainError::UnsupportedModelFormat(file_name.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ModelFormat::Glb => "glb",
            ModelFormat::Gltf => "gltf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ModelFormat::Glb => "model/gltf-binary",
            ModelFormat::Gltf => "model/gltf+json",
        }
    }

    /// Cheap sanity check of the payload before it is stored.
    pub fn validate_content(&self, data: &[u8]) -> Result<(), DomainError> {
        match self {
            ModelFormat::Glb => {
                if data.len() < 12 || &data[..4] != GLB_MAGIC {
                    return Err(DomainError::InvalidInput(
                        "binary glTF must start with the glTF magic header".to_string(),
                    ));
                }
                Ok(())
            }
            ModelFormat::Gltf => {
                let document: serde_json::Value = serde_json::from_slice(data).map_err(|e| {
                    DomainError::InvalidInput(format!("glTF document is not valid JSON: {}", e))
                })?;
                if document.get("asset").is_none() {
                    return Err(DomainError::InvalidInput(
                        "glTF document has no asset member".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// A 3D model file held by the blob store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAsset {
    pub path: String,
    pub format: ModelFormat,
    pub size_bytes: u64,
}
