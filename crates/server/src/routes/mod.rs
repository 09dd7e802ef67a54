pub mod assistants;
pub mod documents;
pub mod mileage;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::state::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    let api = Router::new()
        .route("/typhoon-ocr", post(documents::typhoon_ocr))
        .route("/mileage-ocr", post(mileage::mileage_ocr))
        .route("/mileage", post(mileage::mileage))
        .route("/reconcile", post(mileage::reconcile_trip))
        .route("/extract", post(mileage::extract))
        .route("/document-summary", post(documents::document_summary))
        .route("/smart-summary", post(documents::smart_summary))
        .route("/chat", post(assistants::chat))
        .route("/image-analyze", post(assistants::image_analyze))
        .route("/deepseek", post(assistants::deepseek))
        .route("/gemini", post(assistants::gemini))
        .route("/upload", post(upload::upload));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
