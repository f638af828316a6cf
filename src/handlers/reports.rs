use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::auth::AuthContext;
use crate::errors::ServiceError;
use crate::queries::report_queries::ExpirationReportQuery;
use crate::queries::status_queries::{DashboardQuery, LowStockQuery};
use crate::queries::Query;
use crate::{ApiResponse, AppState};

pub async fn dashboard(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let stats = DashboardQuery::default().execute(&state.db).await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn expiration_report(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let report = ExpirationReportQuery::default().execute(&state.db).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn low_stock_report(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let rows = LowStockQuery::default().execute(&state.db).await?;
    Ok(Json(ApiResponse::success(rows)))
}
