use super::error::InfrastructureError;
use std::time::Duration;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads raw image bytes from an http(s) URL or an inline `data:` URL.
pub struct DefaultExternalImageFetcher {
    client: reqwest::Client,
}

impl DefaultExternalImageFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    pub async fn fetch_image_from_url(&self, url: &str) -> Result<Vec<u8>, InfrastructureError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(InfrastructureError::DecodingError(format!(
                "Unsupported image source: {}",
                truncate_for_log(url)
            )));
        }

        debug!(url, "fetching remote image");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InfrastructureError::ExternalApiError(format!(
                "GET {} returned {}",
                url, status
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for DefaultExternalImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn decode_data_url(url: &str) -> Result<Vec<u8>, InfrastructureError> {
    let (header, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| InfrastructureError::DecodingError("Invalid data URL: missing comma".to_string()))?;
    if header.ends_with(";base64") {
        Ok(base64::decode(payload.trim())?)
    } else {
        // base64 でない data URL はパーセントエンコードされている
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

/// Data URLs can be megabytes long; keep log lines readable.
pub fn truncate_for_log(source: &str) -> &str {
    match source.char_indices().nth(50) {
        Some((idx, _)) => &source[..idx],
        None => source,
    }
}
