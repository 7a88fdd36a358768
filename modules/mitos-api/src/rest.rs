use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::json;

use mitos_common::{ListMythsParams, RecommendationSource};

use crate::AppState;

// --- Query structs ---

/// Raw listing parameters as they arrive on the query string. Everything
/// is accepted as text and normalized here, so the filter layer only ever
/// sees canonical scalar-or-absent values.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    region: Option<String>,
    community: Option<String>,
    tag: Option<String>,
    q: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl ListQuery {
    fn into_params(self) -> ListMythsParams {
        ListMythsParams {
            region: self.region,
            community: self.community,
            tag: self.tag,
            q: self.q,
            limit: parse_lenient(self.limit),
            offset: parse_lenient(self.offset),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    limit: Option<String>,
    seed: Option<String>,
}

impl SelectionQuery {
    fn limit(&self) -> Option<i64> {
        parse_lenient(self.limit.clone())
    }

    /// Explicit seed, or today's day-of-year so the selection rotates
    /// daily on its own.
    fn seed(&self) -> i64 {
        parse_lenient(self.seed.clone()).unwrap_or_else(|| i64::from(Utc::now().ordinal()))
    }
}

/// Non-numeric input means "not provided"; the service applies defaults.
fn parse_lenient(value: Option<String>) -> Option<i64> {
    value.and_then(|s| s.trim().parse().ok())
}

fn not_found() -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response()
}

// --- Handlers ---

pub async fn api_list_myths(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    Json(state.service.list_myths(&query.into_params()).await)
}

pub async fn api_myth_detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> axum::response::Response {
    match state.service.myth_by_slug(&slug).await {
        Some(myth) => Json(myth).into_response(),
        None => not_found(),
    }
}

pub async fn api_related_myths(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> axum::response::Response {
    let Some(myth) = state.service.myth_by_slug(&slug).await else {
        return not_found();
    };
    let related = state
        .service
        .recommended(RecommendationSource::from(&myth), query.limit())
        .await;
    Json(related).into_response()
}

pub async fn api_taxonomy(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.taxonomy().await)
}

pub async fn api_featured_myths(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> impl IntoResponse {
    Json(
        state
            .service
            .featured_with_images(query.limit(), query.seed())
            .await,
    )
}

pub async fn api_diverse_myths(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> impl IntoResponse {
    Json(state.service.diverse(query.limit(), query.seed()).await)
}

pub async fn api_myths_by_region(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<SelectionQuery>,
) -> impl IntoResponse {
    Json(
        state
            .service
            .myths_by_region(&slug, query.limit(), query.seed())
            .await,
    )
}

pub async fn api_home_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.home_stats().await)
}
