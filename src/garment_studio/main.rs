mod application;
mod config;
mod domain;
mod infrastructure;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use application::catalog_service::CatalogService;
use application::design_service::DesignService;
use application::try_on_service::TryOnService;
use config::Config;
use domain::segmentation::Segmenter;
use infrastructure::axum_handler::{router, AppState};
use infrastructure::compositor::DefaultCompositor;
use infrastructure::external_image_fetcher::DefaultExternalImageFetcher;
use infrastructure::favorites_store::JsonFileFavorites;
use infrastructure::file_storage::LocalFileStorage;
use infrastructure::garment_catalog::JsonFileCatalog;
use infrastructure::segmenter::{HttpSegmenter, NoopSegmenter};
use infrastructure::texture_loader::DefaultTextureLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = config.compositor_settings()?;
    let segmenter: Arc<dyn Segmenter + Send + Sync> = match &config.segmentation_url {
        Some(url) => {
            info!(%url, "using remote segmentation");
            Arc::new(HttpSegmenter::new(
                url.clone(),
                config.segmentation_token.clone(),
                config.segmentation_timeout(),
            ))
        }
        None => {
            info!("no segmentation service configured, compositing without masks");
            Arc::new(NoopSegmenter)
        }
    };
    let compositor = Arc::new(DefaultCompositor::new(segmenter, settings));

    let image_fetcher = Arc::new(DefaultExternalImageFetcher::new());
    let catalog = Arc::new(
        JsonFileCatalog::open(config.catalog_path())
            .await
            .context("failed to open the garment catalog")?,
    );
    let favorites = Arc::new(
        JsonFileFavorites::open(config.favorites_path())
            .await
            .context("failed to open favorites")?,
    );
    let models = Arc::new(LocalFileStorage::new(config.models_dir()));
    info!(models = %models.root().display(), "model storage ready");

    let app_state = Arc::new(AppState {
        try_on_service: Arc::new(TryOnService::new(
            compositor,
            Arc::clone(&image_fetcher),
            Arc::clone(&catalog),
        )),
        design_service: Arc::new(DesignService::new(Arc::new(DefaultTextureLoader::new(
            image_fetcher,
        )))),
        catalog_service: Arc::new(CatalogService::new(catalog, favorites, models)),
    });

    let app = router(app_state, &config.static_dir, config.body_limit);

    // サーバーの開始
    info!(bind = %config.bind, "garment studio listening");
    axum::Server::bind(&config.bind)
        .serve(app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
