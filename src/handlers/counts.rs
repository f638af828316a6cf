use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::commands::counts::{
    AddRecordCommand, ClearAllCountsCommand, ClearCountCommand, CreateItemWithRecordCommand,
    DuplicateRecordCommand, RemoveRecordCommand, SetRecordQuantityCommand, StartCountCommand,
};
use crate::commands::Command;
use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct StartCountRequest {
    pub location_id: i32,
    pub notes: Option<String>,
}

pub async fn start_count(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<StartCountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = StartCountCommand {
        location_id: payload.location_id,
        notes: payload.notes,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

#[derive(Debug, Deserialize)]
pub struct AddRecordRequest {
    pub item_id: i32,
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    pub section: Option<String>,
}

pub async fn add_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(count_id): Path<i32>,
    Json(payload): Json<AddRecordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = AddRecordCommand {
        count_id,
        item_id: payload.item_id,
        quantity: payload.quantity,
        expiration_date: payload.expiration_date,
        lot_number: payload.lot_number,
        section: payload.section,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

#[derive(Debug, Deserialize)]
pub struct SetRecordQuantityRequest {
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    pub section: Option<String>,
}

pub async fn set_record_quantity(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((count_id, record_id)): Path<(i32, i32)>,
    Json(payload): Json<SetRecordQuantityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = SetRecordQuantityCommand {
        count_id,
        record_id,
        quantity: payload.quantity,
        expiration_date: payload.expiration_date,
        lot_number: payload.lot_number,
        section: payload.section,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    match updated {
        Some(record) => Ok(Json(ApiResponse::success(record)).into_response()),
        None => Ok(Json(ApiResponse::<()>::message("Record removed")).into_response()),
    }
}

pub async fn remove_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((count_id, item_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ServiceError> {
    RemoveRecordCommand { count_id, item_id }
        .execute(state.db.clone(), &ctx)
        .await?;
    Ok(Json(ApiResponse::<()>::message("Record removed")))
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRecordRequest {
    pub target_item_id: i32,
}

pub async fn duplicate_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((count_id, source_record_id)): Path<(i32, i32)>,
    Json(payload): Json<DuplicateRecordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = DuplicateRecordCommand {
        count_id,
        source_record_id,
        target_item_id: payload.target_item_id,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}

#[derive(Debug, Deserialize)]
pub struct CreateItemWithRecordRequest {
    pub name: String,
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub required_quantity: i32,
    #[serde(default)]
    pub minimum_threshold: i32,
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    pub section: Option<String>,
}

pub async fn create_item_with_record(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(count_id): Path<i32>,
    Json(payload): Json<CreateItemWithRecordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = CreateItemWithRecordCommand {
        count_id,
        name: payload.name,
        item_number: payload.item_number,
        manufacturer: payload.manufacturer,
        is_required: payload.is_required,
        required_quantity: payload.required_quantity,
        minimum_threshold: payload.minimum_threshold,
        quantity: payload.quantity,
        expiration_date: payload.expiration_date,
        lot_number: payload.lot_number,
        section: payload.section,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

pub async fn clear_count(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(count_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let records_cleared = ClearCountCommand { count_id }
        .execute(state.db.clone(), &ctx)
        .await?;
    Ok(Json(ApiResponse::<()>::message(format!(
        "Count cleared ({} records)",
        records_cleared
    ))))
}

pub async fn clear_all_counts(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ServiceError> {
    let result = ClearAllCountsCommand::default()
        .execute(state.db.clone(), &ctx)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
