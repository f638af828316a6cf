use axum::extract::{Path, Query as UrlQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::commands::admin::{
    CreateItemCommand, CreateLocationCommand, CreateUserCommand, DeleteItemCommand,
    DeleteLocationCommand, DeleteUserCommand, UpdateItemCommand, UpdateLocationCommand,
    UpdateUserCommand,
};
use crate::commands::Command;
use crate::entities::locations::LocationType;
use crate::entities::users;
use crate::errors::ServiceError;
use crate::queries::audit_queries::AuditLogQuery;
use crate::queries::Query;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub description: Option<String>,
    pub location_type: LocationType,
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub has_sections: bool,
}

pub async fn create_location(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = CreateLocationCommand {
        name: payload.name,
        description: payload.description,
        location_type: payload.location_type,
        vehicle_id: payload.vehicle_id,
        has_sections: payload.has_sections,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location_type: Option<LocationType>,
    pub vehicle_id: Option<String>,
    pub has_sections: Option<bool>,
}

pub async fn update_location(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = UpdateLocationCommand {
        id,
        name: payload.name,
        description: payload.description,
        location_type: payload.location_type,
        vehicle_id: payload.vehicle_id,
        has_sections: payload.has_sections,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok(Json(ApiResponse::success(location)))
}

pub async fn delete_location(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    DeleteLocationCommand { id }
        .execute(state.db.clone(), &ctx)
        .await?;
    Ok(Json(ApiResponse::<()>::message("Location deleted")))
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub required_quantity: i32,
    #[serde(default)]
    pub minimum_threshold: i32,
}

pub async fn create_item(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = CreateItemCommand {
        name: payload.name,
        item_number: payload.item_number,
        manufacturer: payload.manufacturer,
        is_required: payload.is_required,
        required_quantity: payload.required_quantity,
        minimum_threshold: payload.minimum_threshold,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    pub is_required: Option<bool>,
    pub required_quantity: Option<i32>,
    pub minimum_threshold: Option<i32>,
}

pub async fn update_item(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = UpdateItemCommand {
        id,
        name: payload.name,
        item_number: payload.item_number,
        manufacturer: payload.manufacturer,
        is_required: payload.is_required,
        required_quantity: payload.required_quantity,
        minimum_threshold: payload.minimum_threshold,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok(Json(ApiResponse::success(item)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    DeleteItemCommand { id }
        .execute(state.db.clone(), &ctx)
        .await?;
    Ok(Json(ApiResponse::<()>::message("Item deleted")))
}

pub async fn list_users(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_admin()?;
    let users = users::Entity::find_active().all(&*state.db).await?;
    Ok(Json(ApiResponse::success(users)))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

pub async fn create_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = CreateUserCommand {
        username: payload.username,
        email: payload.email,
        is_admin: payload.is_admin,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

pub async fn update_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = UpdateUserCommand {
        id,
        username: payload.username,
        email: payload.email,
        is_admin: payload.is_admin,
    }
    .execute(state.db.clone(), &ctx)
    .await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    DeleteUserCommand { id }
        .execute(state.db.clone(), &ctx)
        .await?;
    Ok(Json(ApiResponse::<()>::message("User deleted")))
}

pub async fn audit_log(
    State(state): State<AppState>,
    ctx: AuthContext,
    UrlQuery(query): UrlQuery<AuditLogQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_admin()?;
    let page = query.execute(&state.db).await?;
    Ok(Json(ApiResponse::success(page)))
}
