use axum::extract::{Path, Query as UrlQuery, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::auth::AuthContext;
use crate::entities::{items, locations};
use crate::errors::ServiceError;
use crate::queries::report_queries::InventorySummaryQuery;
use crate::queries::Query;
use crate::services::exports;
use crate::{ApiResponse, AppState};

pub async fn inventory_summary(
    State(state): State<AppState>,
    ctx: AuthContext,
    UrlQuery(query): UrlQuery<InventorySummaryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let rows = query.execute(&state.db).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// Same rows as the summary, rendered as a CSV attachment.
pub async fn export_inventory_csv(
    State(state): State<AppState>,
    ctx: AuthContext,
    UrlQuery(query): UrlQuery<InventorySummaryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let rows = query.execute(&state.db).await?;
    let body = exports::render_inventory_csv(&rows)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory.csv\"",
            ),
        ],
        body,
    ))
}

pub async fn list_locations(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let locations = locations::Entity::find_active().all(&*state.db).await?;
    Ok(Json(ApiResponse::success(locations)))
}

pub async fn list_items(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let items = items::Entity::find_active().all(&*state.db).await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn get_item_by_number(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(number): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let item = items::Entity::find_active_by_number(&number)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item number {} not found", number)))?;
    Ok(Json(ApiResponse::success(item)))
}
