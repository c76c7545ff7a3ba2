use crate::application::catalog_service::CatalogService;
use crate::application::design_service::DesignService;
use crate::application::error::ApplicationError;
use crate::application::try_on_service::{TryOnOutcome, TryOnService};
use crate::domain::design_side::DesignSide;
use crate::domain::garment::{GarmentCategory, NewGarment};
use crate::domain::image::Image as DomainImage;
use crate::domain::placement::PlacementSliders;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Json, Multipart, Path, Query, State},
    http::{header, header::HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const TRY_ON_HEADER: &str = "x-try-on";
const TRY_ON_REASON_HEADER: &str = "x-try-on-reason";
const MAX_REASON_LEN: usize = 200;

#[derive(Clone)]
pub struct AppState {
    pub try_on_service: Arc<TryOnService>,
    pub design_service: Arc<DesignService>,
    pub catalog_service: Arc<CatalogService>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TryOnRequest {
    pub user_photo: String,
    pub clothing_image: Option<String>,
    pub garment_id: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub struct GarmentQuery {
    pub category: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct FavoriteToggle {
    pub id: u64,
    pub favorite: bool,
}

#[derive(Deserialize, Debug)]
pub struct DesignSourceRequest {
    pub source: Option<String>,
}

pub fn router(state: Arc<AppState>, static_dir: &std::path::Path, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(vec![HeaderName::from_static("content-type")])
        .expose_headers(vec![
            HeaderName::from_static(TRY_ON_HEADER),
            HeaderName::from_static(TRY_ON_REASON_HEADER),
        ]);

    Router::new()
        .route("/try-on", post(try_on_handler))
        .route("/try-on/upload", post(try_on_upload_handler))
        .route("/try-on/preview", get(preview_handler))
        .route("/try-on/download", get(download_handler))
        .route("/garments", get(list_garments_handler).post(add_garment_handler))
        .route("/garments/categories", get(categories_handler))
        .route("/garments/:id", get(get_garment_handler))
        .route(
            "/garments/:id/favorite",
            put(add_favorite_handler).delete(remove_favorite_handler),
        )
        .route("/garments/:id/favorite/toggle", post(toggle_favorite_handler))
        .route("/favorites", get(favorites_handler))
        .route("/models", post(upload_model_handler))
        .route("/models/:name", get(get_model_handler))
        .route("/designs", get(designs_handler))
        .route("/designs/:side", put(set_design_handler))
        .route("/designs/:side/texture", get(design_texture_handler))
        .route("/designs/:side/placement", put(set_placement_handler))
        .route("/designs/:side/placement/reset", post(reset_placement_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Header values must be visible ASCII; anything else becomes '?'.
fn header_safe(reason: &str) -> String {
    reason
        .chars()
        .take(MAX_REASON_LEN)
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}

fn try_on_response(outcome: &TryOnOutcome) -> Result<impl IntoResponse, ApplicationError> {
    let image = outcome.image();
    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, image.content_type())
        .header(TRY_ON_HEADER, outcome.kind());
    if let TryOnOutcome::Fallback { reason, .. } = outcome {
        builder = builder.header(TRY_ON_REASON_HEADER, header_safe(reason));
    }
    builder
        .body(Body::from(image.data.clone()))
        .map_err(|e| ApplicationError::TryOnFailed(format!("Failed to build try-on response: {}", e)))
}

fn latest_result(state: &AppState) -> Result<DomainImage, ApplicationError> {
    state
        .try_on_service
        .latest()
        .ok_or_else(|| ApplicationError::NotFound("no try-on result yet".to_string()))
}

/// `all` (or nothing) means no filter.
fn parse_category(query: &GarmentQuery) -> Result<Option<GarmentCategory>, ApplicationError> {
    match query.category.as_deref() {
        None | Some("") | Some("all") => Ok(None),
        Some(id) => GarmentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == id)
            .map(Some)
            .ok_or_else(|| ApplicationError::BadRequest(format!("unknown category: {}", id))),
    }
}

fn parse_side(side: &str) -> Result<DesignSide, ApplicationError> {
    Ok(side.parse::<DesignSide>()?)
}

pub async fn try_on_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TryOnRequest>,
) -> Result<impl IntoResponse, ApplicationError> {
    let outcome = match (request.clothing_image.as_deref(), request.garment_id) {
        (Some(clothing), _) if !clothing.trim().is_empty() => {
            state
                .try_on_service
                .try_on_from_sources(&request.user_photo, clothing)
                .await?
        }
        (_, Some(garment_id)) => {
            state
                .try_on_service
                .try_on_garment(&request.user_photo, garment_id)
                .await?
        }
        _ => {
            return Err(ApplicationError::BadRequest(
                "either clothingImage or garmentId is required".to_string(),
            ))
        }
    };
    try_on_response(&outcome)
}

pub async fn try_on_upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApplicationError> {
    let mut photo = None;
    let mut clothing = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApplicationError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApplicationError::BadRequest(format!("Failed to read multipart field: {}", e)))?;
        match name.as_deref() {
            Some("photo") => photo = Some(data.to_vec()),
            Some("clothing") => clothing = Some(data.to_vec()),
            _ => {}
        }
    }

    let photo = photo.ok_or_else(|| ApplicationError::BadRequest("missing photo field".to_string()))?;
    let clothing =
        clothing.ok_or_else(|| ApplicationError::BadRequest("missing clothing field".to_string()))?;
    let outcome = state.try_on_service.try_on(photo, clothing).await?;
    try_on_response(&outcome)
}

pub async fn preview_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApplicationError> {
    let image = latest_result(&state)?;
    Response::builder()
        .header(header::CONTENT_TYPE, image.content_type())
        .body(Body::from(image.data))
        .map_err(|e| ApplicationError::TryOnFailed(format!("Failed to build preview response: {}", e)))
}

pub async fn download_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApplicationError> {
    let image = latest_result(&state)?;
    let disposition = format!("attachment; filename=\"try-on.{}\"", image.file_extension());
    Response::builder()
        .header(header::CONTENT_TYPE, image.content_type())
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(image.data))
        .map_err(|e| ApplicationError::TryOnFailed(format!("Failed to build download response: {}", e)))
}

pub async fn list_garments_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GarmentQuery>,
) -> Result<impl IntoResponse, ApplicationError> {
    let category = parse_category(&query)?;
    Ok(Json(state.catalog_service.list(category).await))
}

pub async fn favorites_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GarmentQuery>,
) -> Result<impl IntoResponse, ApplicationError> {
    let category = parse_category(&query)?;
    Ok(Json(state.catalog_service.favorites(category).await))
}

pub async fn add_favorite_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApplicationError> {
    Ok(Json(state.catalog_service.add_favorite(id).await?))
}

pub async fn remove_favorite_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApplicationError> {
    state.catalog_service.remove_favorite(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_favorite_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApplicationError> {
    let favorite = state.catalog_service.toggle_favorite(id).await?;
    Ok(Json(FavoriteToggle { id, favorite }))
}

pub async fn categories_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog_service.categories().await)
}

pub async fn get_garment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApplicationError> {
    Ok(Json(state.catalog_service.get(id).await?))
}

pub async fn add_garment_handler(
    State(state): State<Arc<AppState>>,
    Json(new_garment): Json<NewGarment>,
) -> Result<impl IntoResponse, ApplicationError> {
    let garment = state.catalog_service.add_garment(new_garment).await?;
    Ok((StatusCode::CREATED, Json(garment)))
}

pub async fn upload_model_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApplicationError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApplicationError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApplicationError::BadRequest(format!("Failed to read multipart field: {}", e)))?;
        let asset = state.catalog_service.upload_model(&file_name, &data).await?;
        return Ok((StatusCode::CREATED, Json(asset)));
    }
    Err(ApplicationError::BadRequest("missing file field".to_string()))
}

pub async fn get_model_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApplicationError> {
    let (data, content_type) = state.catalog_service.read_model(&name).await?;
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(data))
        .map_err(|e| ApplicationError::TryOnFailed(format!("Failed to build model response: {}", e)))
}

pub async fn designs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApplicationError> {
    Ok(Json(state.design_service.states()?))
}

pub async fn set_design_handler(
    State(state): State<Arc<AppState>>,
    Path(side): Path<String>,
    Json(request): Json<DesignSourceRequest>,
) -> Result<impl IntoResponse, ApplicationError> {
    let side = parse_side(&side)?;
    Ok(Json(state.design_service.set_design(side, request.source).await?))
}

pub async fn design_texture_handler(
    State(state): State<Arc<AppState>>,
    Path(side): Path<String>,
) -> Result<impl IntoResponse, ApplicationError> {
    let png = state.design_service.texture_png(parse_side(&side)?)?;
    Response::builder()
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(png))
        .map_err(|e| ApplicationError::TryOnFailed(format!("Failed to build texture response: {}", e)))
}

pub async fn set_placement_handler(
    State(state): State<Arc<AppState>>,
    Path(side): Path<String>,
    Json(sliders): Json<PlacementSliders>,
) -> Result<impl IntoResponse, ApplicationError> {
    let side = parse_side(&side)?;
    state.design_service.set_placement_from_sliders(side, sliders)?;
    Ok(Json(state.design_service.state(side)?))
}

pub async fn reset_placement_handler(
    State(state): State<Arc<AppState>>,
    Path(side): Path<String>,
) -> Result<impl IntoResponse, ApplicationError> {
    let side = parse_side(&side)?;
    state.design_service.reset_placement(side)?;
    Ok(Json(state.design_service.state(side)?))
}
