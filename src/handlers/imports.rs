use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::AuthContext;
use crate::errors::ServiceError;
use crate::services::imports::{
    self, CountRow, DuplicateDecision, ItemImportPreview, ParsedUpload, UploadSchema,
};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PreviewResponse {
    Items {
        schema: UploadSchema,
        preview: ItemImportPreview,
    },
    Counts {
        schema: UploadSchema,
        rows: Vec<CountRow>,
    },
}

/// Parse and classify an upload without writing anything. Item uploads
/// come back split into new rows and staged duplicates awaiting a
/// decision; count uploads come back as parsed rows.
pub async fn preview_import(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<UploadRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    ctx.require_user()?;
    let parsed = imports::parse_upload(&payload.filename, &payload.content)?;
    let response = match parsed {
        ParsedUpload::Items(rows) => PreviewResponse::Items {
            schema: UploadSchema::ItemDefinitions,
            preview: imports::preview_item_import(&state.db, rows).await?,
        },
        ParsedUpload::Counts(rows) => PreviewResponse::Counts {
            schema: UploadSchema::CountRows,
            rows,
        },
    };
    Ok(Json(ApiResponse::success(response)))
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub filename: String,
    pub content: String,
    /// Duplicate resolutions keyed by the original item number. Only
    /// meaningful for item-definition uploads.
    #[serde(default)]
    pub decisions: HashMap<String, DuplicateDecision>,
}

pub async fn commit_import(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(payload): Json<CommitRequest>,
) -> Result<axum::response::Response, ServiceError> {
    ctx.require_user()?;
    let parsed = imports::parse_upload(&payload.filename, &payload.content)?;
    match parsed {
        ParsedUpload::Items(rows) => {
            let summary =
                imports::commit_item_import(&state.db, &ctx, rows, &payload.decisions).await?;
            Ok(Json(ApiResponse::success(summary)).into_response())
        }
        ParsedUpload::Counts(rows) => {
            let summary = imports::commit_count_import(&state.db, &ctx, rows).await?;
            Ok(Json(ApiResponse::success(summary)).into_response())
        }
    }
}
