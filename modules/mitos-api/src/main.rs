use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mitos_common::AppConfig;
use mitos_query::{MemoCache, MythQueryService};
use mitos_store::connect_store;

mod rest;

pub struct AppState {
    pub service: MythQueryService,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mitos=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    let store = connect_store(&config).await?;
    let service = MythQueryService::new(store, Arc::new(MemoCache::new()));

    let state = Arc::new(AppState { service });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // REST API
        .route("/api/myths", get(rest::api_list_myths))
        .route("/api/myths/{slug}", get(rest::api_myth_detail))
        .route("/api/myths/{slug}/related", get(rest::api_related_myths))
        .route("/api/taxonomy", get(rest::api_taxonomy))
        .route("/api/featured", get(rest::api_featured_myths))
        .route("/api/diverse", get(rest::api_diverse_myths))
        .route("/api/regions/{slug}/myths", get(rest::api_myths_by_region))
        .route("/api/stats", get(rest::api_home_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("api: listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
