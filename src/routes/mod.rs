use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod catalog;
pub mod favorites;
pub mod lists;
pub mod recommendations;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(catalog::home))
        .route("/categories", get(catalog::list_categories))
        .route("/categories/:slug", get(catalog::category_page))
        .route("/trending/:scope", get(catalog::trending))
        .route("/discover/:kind", get(catalog::discover))
        .route("/popular/:kind", get(catalog::popular))
        .route("/search", get(catalog::search))
        .route("/titles/:kind/:id", get(catalog::details))
        .route("/titles/:kind/:id/similar", get(catalog::similar))
        .route("/titles/:kind/:id/credits", get(catalog::credits))
        .route("/titles/:kind/:id/embed", get(catalog::embed))
        .route("/favorites", get(favorites::list).post(favorites::add))
        .route(
            "/favorites/:kind/:id",
            get(favorites::status).delete(favorites::remove),
        )
        .route("/lists", post(lists::create))
        .route(
            "/lists/:id",
            get(lists::get).put(lists::switch).delete(lists::remove),
        )
        .route("/lists/:id/more", post(lists::more))
        .route("/recommendations", post(recommendations::recommend))
}

/// `?page=N`, 1-based
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
