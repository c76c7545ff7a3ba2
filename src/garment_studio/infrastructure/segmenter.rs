use super::error::InfrastructureError;
use crate::domain::segmentation::{Segment, SegmentationResult, Segmenter};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, RgbaImage};
use serde::Deserialize;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};

// 推論エンドポイントへ送る画像の JPEG 品質
const UPLOAD_JPEG_QUALITY: u8 = 80;

#[derive(Deserialize)]
struct RawSegment {
    label: String,
    #[serde(default)]
    score: Option<f32>,
    mask: String,
}

/// Client for a hosted image-segmentation model. The endpoint receives the
/// photo as JPEG and answers with `[{ label, score, mask }]`, where `mask` is
/// a base64 encoded grayscale PNG.
///
/// `segment` blocks on the tokio runtime it is called from, so call it from
/// the blocking pool (`spawn_blocking`), never from an async task.
pub struct HttpSegmenter {
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpSegmenter {
    pub fn new(endpoint: String, token: Option<String>, timeout: Duration) -> Self {
        Self {
            endpoint,
            token,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, body: Vec<u8>) -> Result<SegmentationResult, InfrastructureError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(InfrastructureError::ExternalApiError(format!(
                "segmentation endpoint returned {}: {}",
                status, detail
            )));
        }
        parse_segmentation_response(&response.bytes().await?)
    }
}

impl Segmenter for HttpSegmenter {
    fn segment(&self, image: &RgbaImage) -> Result<SegmentationResult, InfrastructureError> {
        let body = encode_jpeg(image, UPLOAD_JPEG_QUALITY)?;
        debug!(
            endpoint = %self.endpoint,
            bytes = body.len(),
            "sending photo to segmentation model"
        );

        let handle = Handle::try_current().map_err(|e| {
            InfrastructureError::SegmentationError(format!("no async runtime for segmentation: {}", e))
        })?;
        let result = handle.block_on(self.request(body))?;
        info!(segments = result.len(), labels = ?result.labels(), "segmentation finished");
        Ok(result)
    }
}

/// Stand-in used when no segmentation endpoint is configured.
pub struct NoopSegmenter;

impl Segmenter for NoopSegmenter {
    fn segment(&self, image: &RgbaImage) -> Result<SegmentationResult, InfrastructureError> {
        debug!(
            width = image.width(),
            height = image.height(),
            "segmentation disabled, returning empty result"
        );
        Ok(SegmentationResult::default())
    }
}

pub fn parse_segmentation_response(body: &[u8]) -> Result<SegmentationResult, InfrastructureError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_array() {
        return Err(InfrastructureError::SegmentationError(
            "Invalid segmentation result".to_string(),
        ));
    }
    let raw: Vec<RawSegment> = serde_json::from_value(value)?;

    let segments = raw
        .into_iter()
        .map(|segment| -> Result<Segment, InfrastructureError> {
            let encoded = match segment.mask.split_once(',') {
                Some((header, payload)) if header.starts_with("data:") => payload,
                _ => segment.mask.as_str(),
            };
            let bytes = base64::decode(encoded.trim())?;
            let mask = image::load_from_memory(&bytes)?.to_luma8();
            Ok(Segment {
                label: segment.label,
                score: segment.score,
                mask,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SegmentationResult::new(segments))
}

pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, InfrastructureError> {
    // JPEG にはアルファがないので RGB に落とす
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Router};
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;
    use std::sync::Arc;

    fn mask_png_base64(width: u32, height: u32, value: u8) -> String {
        let mask = GrayImage::from_pixel(width, height, Luma([value]));
        let mut buffer = Cursor::new(Vec::new());
        mask.write_to(&mut buffer, ImageFormat::Png).unwrap();
        base64::encode(buffer.into_inner())
    }

    #[test]
    fn test_parse_segmentation_response() {
        let body = serde_json::json!([
            { "label": "person", "score": 0.97, "mask": mask_png_base64(4, 3, 255) },
            { "label": "wall", "score": null, "mask": format!("data:image/png;base64,{}", mask_png_base64(4, 3, 0)) }
        ]);
        let result = parse_segmentation_response(body.to_string().as_bytes()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.segments[0].label, "person");
        assert_eq!(result.segments[0].score, Some(0.97));
        assert_eq!(result.segments[0].mask.dimensions(), (4, 3));
        assert_eq!(result.segments[0].mask.get_pixel(0, 0)[0], 255);
        assert_eq!(result.segments[1].score, None);
    }

    #[test]
    fn test_parse_accepts_empty_array() {
        let result = parse_segmentation_response(b"[]").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_segmentation_response(br#"{"error":"model loading"}"#).unwrap_err();
        assert!(matches!(err, InfrastructureError::SegmentationError(_)));
    }

    #[test]
    fn test_parse_rejects_broken_mask() {
        let body = br#"[{"label":"person","mask":"AQID"}]"#;
        let err = parse_segmentation_response(body).unwrap_err();
        assert!(matches!(err, InfrastructureError::ImageLibError(_)));
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([10, 200, 30, 128]));
        let bytes = encode_jpeg(&image, UPLOAD_JPEG_QUALITY).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
    }

    fn serve(app: Router) -> std::net::SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
        tokio::spawn(server);
        addr
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_segment_posts_jpeg_with_token() {
        let app = Router::new().route(
            "/segment",
            post(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .map_or(false, |v| v == "Bearer secret");
                let jpeg = headers
                    .get("content-type")
                    .map_or(false, |v| v == "image/jpeg");
                let label = if authorized && jpeg { "person" } else { "rejected" };
                serde_json::json!([{ "label": label, "score": 0.9, "mask": mask_png_base64(2, 2, 255) }])
                    .to_string()
            }),
        );
        let addr = serve(app);
        let segmenter = Arc::new(HttpSegmenter::new(
            format!("http://{}/segment", addr),
            Some("secret".to_string()),
            Duration::from_secs(5),
        ));

        let worker = Arc::clone(&segmenter);
        let result = tokio::task::spawn_blocking(move || worker.segment(&RgbaImage::new(6, 4)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.labels(), vec!["person"]);
        // 最後の参照を非同期タスク上で手放してもパニックしない
        drop(segmenter);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_segment_reports_http_errors() {
        let app = Router::new().route(
            "/segment",
            post(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "model loading") }),
        );
        let addr = serve(app);
        let segmenter = Arc::new(HttpSegmenter::new(
            format!("http://{}/segment", addr),
            None,
            Duration::from_secs(5),
        ));

        let worker = Arc::clone(&segmenter);
        let err = tokio::task::spawn_blocking(move || worker.segment(&RgbaImage::new(2, 2)))
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, InfrastructureError::ExternalApiError(ref m) if m.contains("model loading")));
    }

    #[test]
    fn test_segment_outside_runtime_is_an_error() {
        let segmenter = HttpSegmenter::new("http://127.0.0.1:9/segment".to_string(), None, Duration::from_secs(1));
        let err = segmenter.segment(&RgbaImage::new(2, 2)).unwrap_err();
        assert!(matches!(err, InfrastructureError::SegmentationError(_)));
    }

    #[test]
    fn test_noop_segmenter_returns_nothing() {
        let result = NoopSegmenter.segment(&RgbaImage::new(2, 2)).unwrap();
        assert!(result.is_empty());
    }
}
