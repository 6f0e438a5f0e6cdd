//! Web front end for barcode lookups
//!
//! Serves the lookup page and a small JSON API on top of the shared catalog.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::catalog::{CatalogStatus, ProductCatalog, ProductRecord, ReloadOutcome};
use crate::price::{format_price, PriceFormat};

/// Shared application state (catalog + display convention)
#[derive(Clone)]
struct AppState {
    catalog: Arc<ProductCatalog>,
    format: PriceFormat,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    fn err(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.into()),
        })
    }
}

/// Product as returned by the lookup endpoint
#[derive(Serialize)]
struct ProductView {
    name: String,
    code: String,
    /// Normalized amount as a number
    amount: f64,
    /// Two-decimal amount, `.` separated
    price: String,
    /// Amount in the configured display convention
    display_price: String,
}

impl ProductView {
    fn new(record: &ProductRecord, format: &PriceFormat) -> Self {
        Self {
            name: record.name.clone(),
            code: record.code.clone(),
            amount: record.price_value(),
            price: format_price(record),
            display_price: format.render(record),
        }
    }
}

#[derive(Serialize)]
struct RefreshData {
    records: usize,
}

/// GET / - Serve the lookup page
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// GET /api/lookup/{code}
async fn lookup_handler(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.catalog.lookup(&code) {
        Some(record) => ApiResponse::ok(ProductView::new(&record, &state.format)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            ApiResponse::<ProductView>::err(format!("Product not found ({})", code.trim())),
        )
            .into_response(),
    }
}

/// POST /api/refresh
async fn refresh_handler(State(state): State<AppState>) -> Response {
    match state.catalog.reload().await {
        Ok(ReloadOutcome::Loaded(records)) => ApiResponse::ok(RefreshData { records }).into_response(),
        Ok(ReloadOutcome::AlreadyInProgress) => (
            StatusCode::ACCEPTED,
            ApiResponse::<RefreshData>::err("A reload is already running"),
        )
            .into_response(),
        Err(e) => {
            log::error!("Refresh failed ({}): {}", e.kind(), e);
            (
                StatusCode::BAD_GATEWAY,
                ApiResponse::<RefreshData>::err(e.to_string()),
            )
                .into_response()
        }
    }
}

/// GET /api/status
async fn status_handler(State(state): State<AppState>) -> Json<ApiResponse<CatalogStatus>> {
    ApiResponse::ok(state.catalog.status())
}

/// Build the web server router
pub fn create_router(catalog: Arc<ProductCatalog>, format: PriceFormat) -> Router {
    let state = AppState { catalog, format };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/lookup/{code}", get(lookup_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/status", get(status_handler))
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 (all interfaces) so handheld devices on the shop network
/// can reach it.
pub async fn serve(
    catalog: Arc<ProductCatalog>,
    format: PriceFormat,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(catalog, format);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Web UI listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;
