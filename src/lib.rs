pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod queries;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
}

/// Uniform JSON envelope for successful responses. Errors are rendered by
/// `ServiceError`'s `IntoResponse` impl instead.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::reports::dashboard))
        .route("/inventory", get(handlers::inventory::inventory_summary))
        .route(
            "/inventory/export",
            get(handlers::inventory::export_inventory_csv),
        )
        .route("/locations", get(handlers::inventory::list_locations))
        .route("/items", get(handlers::inventory::list_items))
        .route(
            "/items/by-number/:number",
            get(handlers::inventory::get_item_by_number),
        )
        .route(
            "/reports/expirations",
            get(handlers::reports::expiration_report),
        )
        .route("/reports/low-stock", get(handlers::reports::low_stock_report))
        .route(
            "/counts",
            post(handlers::counts::start_count).delete(handlers::counts::clear_all_counts),
        )
        .route("/counts/:id", delete(handlers::counts::clear_count))
        .route("/counts/:id/records", post(handlers::counts::add_record))
        .route(
            "/counts/:id/records/:record_id",
            put(handlers::counts::set_record_quantity),
        )
        .route(
            "/counts/:id/records/:record_id/duplicate",
            post(handlers::counts::duplicate_record),
        )
        .route(
            "/counts/:id/items",
            post(handlers::counts::create_item_with_record),
        )
        .route(
            "/counts/:id/items/:item_id",
            delete(handlers::counts::remove_record),
        )
        .route("/imports/preview", post(handlers::imports::preview_import))
        .route("/imports/commit", post(handlers::imports::commit_import))
        .route("/admin/locations", post(handlers::admin::create_location))
        .route(
            "/admin/locations/:id",
            put(handlers::admin::update_location).delete(handlers::admin::delete_location),
        )
        .route("/admin/items", post(handlers::admin::create_item))
        .route(
            "/admin/items/:id",
            put(handlers::admin::update_item).delete(handlers::admin::delete_item),
        )
        .route(
            "/admin/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/admin/users/:id",
            put(handlers::admin::update_user).delete(handlers::admin::delete_user),
        )
        .route("/admin/audit", get(handlers::admin::audit_log))
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
