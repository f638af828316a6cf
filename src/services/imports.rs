use chrono::{NaiveDate, Utc};
use csv::ReaderBuilder;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};

use crate::auth::AuthContext;
use crate::entities::audit_events::AuditAction;
use crate::entities::{inventory_records, items, locations};
use crate::errors::ServiceError;
use crate::services::audit;

/// Two recognized upload schemas, inferred from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSchema {
    ItemDefinitions,
    CountRows,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinitionRow {
    pub name: String,
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    pub is_required: bool,
    pub required_quantity: i32,
    pub minimum_threshold: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountRow {
    pub location_id: i32,
    pub item_number: String,
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub enum ParsedUpload {
    Items(Vec<ItemDefinitionRow>),
    Counts(Vec<CountRow>),
}

/// How to resolve an incoming item definition whose item number matches
/// an existing active item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDecision {
    /// Overwrite the existing item's fields in place.
    Replace,
    /// Append `-1`, `-2`, ... to the incoming number until unique, then
    /// insert as a new item.
    Add,
}

#[derive(Debug, Serialize)]
pub struct DuplicateItem {
    pub existing_item_id: i32,
    pub incoming: ItemDefinitionRow,
}

#[derive(Debug, Serialize)]
pub struct ItemImportPreview {
    pub new_items: Vec<ItemDefinitionRow>,
    pub duplicates: Vec<DuplicateItem>,
}

#[derive(Debug, Default, Serialize)]
pub struct ItemImportSummary {
    pub created: usize,
    pub replaced: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct CountImportSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

fn delimiter_for(filename: &str) -> Result<u8, ServiceError> {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "csv" => Ok(b','),
        "tsv" | "txt" => Ok(b'\t'),
        _ => Err(ServiceError::ImportError(format!(
            "Unsupported file type: {}",
            filename
        ))),
    }
}

fn header_index(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn cell<'a>(fields: &'a [String], index: Option<usize>) -> &'a str {
    index.map(|i| fields[i].trim()).unwrap_or("")
}

fn optional_text(value: &str) -> Option<String> {
    match value {
        "" | "N/A" => None,
        other => Some(other.to_string()),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "yes" | "true" | "1" | "y")
}

fn parse_quantity(value: &str, field: &str, row: usize) -> Result<i32, ServiceError> {
    if value.is_empty() {
        return Ok(0);
    }
    let quantity: i32 = value.parse().map_err(|_| {
        ServiceError::ImportError(format!("Row {}: invalid {} '{}'", row, field, value))
    })?;
    if quantity < 0 {
        return Err(ServiceError::ImportError(format!(
            "Row {}: {} cannot be negative",
            row, field
        )));
    }
    Ok(quantity)
}

fn parse_expiration(value: &str, row: usize) -> Result<Option<NaiveDate>, ServiceError> {
    match value {
        "" | "N/A" | "No Expiry" => Ok(None),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ServiceError::ImportError(format!("Row {}: invalid expiration date '{}'", row, other))
            }),
    }
}

/// Parse a delimited upload into typed rows. The delimiter comes from the
/// file extension; the first row must be a recognized header. Row numbers
/// in errors count the header as row 1.
pub fn parse_upload(filename: &str, content: &str) -> Result<ParsedUpload, ServiceError> {
    let delimiter = delimiter_for(filename)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ServiceError::ImportError(e.to_string()))?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    let headers = rows
        .first()
        .cloned()
        .ok_or_else(|| ServiceError::ImportError("Upload is empty".to_string()))?;

    // Uniform column count; a ragged row aborts the whole upload.
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.len() != headers.len() {
            return Err(ServiceError::ImportError(format!(
                "Row {}: expected {} columns, found {}",
                i + 1,
                headers.len(),
                row.len()
            )));
        }
    }

    let name_col = header_index(&headers, "Item Name");
    let number_col = header_index(&headers, "Item Number");
    let location_col = header_index(&headers, "Location ID");
    let quantity_col = header_index(&headers, "Quantity");

    if name_col.is_some() && number_col.is_some() {
        let manufacturer_col = header_index(&headers, "Manufacturer");
        let required_col = header_index(&headers, "Required by State Standards");
        let required_qty_col = header_index(&headers, "Required Quantity");
        let threshold_col = header_index(&headers, "Minimum Threshold");

        let mut parsed = Vec::new();
        for (i, fields) in rows.iter().enumerate().skip(1) {
            let row_number = i + 1;
            let name = cell(fields, name_col).to_string();
            if name.is_empty() {
                return Err(ServiceError::ImportError(format!(
                    "Row {}: item name is required",
                    row_number
                )));
            }
            parsed.push(ItemDefinitionRow {
                name,
                item_number: optional_text(cell(fields, number_col)),
                manufacturer: optional_text(cell(fields, manufacturer_col)),
                is_required: parse_flag(cell(fields, required_col)),
                required_quantity: parse_quantity(
                    cell(fields, required_qty_col),
                    "required quantity",
                    row_number,
                )?,
                minimum_threshold: parse_quantity(
                    cell(fields, threshold_col),
                    "minimum threshold",
                    row_number,
                )?,
            });
        }
        return Ok(ParsedUpload::Items(parsed));
    }

    if location_col.is_some() && number_col.is_some() && quantity_col.is_some() {
        let expiration_col = header_index(&headers, "Expiration Date");
        let lot_col = header_index(&headers, "Lot Number");

        let mut parsed = Vec::new();
        for (i, fields) in rows.iter().enumerate().skip(1) {
            let row_number = i + 1;
            let location_id = cell(fields, location_col).parse().map_err(|_| {
                ServiceError::ImportError(format!(
                    "Row {}: invalid location id '{}'",
                    row_number,
                    cell(fields, location_col)
                ))
            })?;
            let item_number = cell(fields, number_col).to_string();
            if item_number.is_empty() {
                return Err(ServiceError::ImportError(format!(
                    "Row {}: item number is required",
                    row_number
                )));
            }
            parsed.push(CountRow {
                location_id,
                item_number,
                quantity: parse_quantity(cell(fields, quantity_col), "quantity", row_number)?,
                expiration_date: parse_expiration(cell(fields, expiration_col), row_number)?,
                lot_number: optional_text(cell(fields, lot_col)),
            });
        }
        return Ok(ParsedUpload::Counts(parsed));
    }

    Err(ServiceError::ImportError(
        "Unrecognized column headers".to_string(),
    ))
}

/// Classify item-definition rows against the active catalog. Duplicates
/// (by item number) are staged for a decision, never applied here.
pub async fn preview_item_import(
    db: &DatabaseConnection,
    rows: Vec<ItemDefinitionRow>,
) -> Result<ItemImportPreview, ServiceError> {
    let mut preview = ItemImportPreview {
        new_items: Vec::new(),
        duplicates: Vec::new(),
    };
    for row in rows {
        let existing = match &row.item_number {
            Some(number) => items::Entity::find_active_by_number(number).one(db).await?,
            None => None,
        };
        match existing {
            Some(item) => preview.duplicates.push(DuplicateItem {
                existing_item_id: item.id,
                incoming: row,
            }),
            None => preview.new_items.push(row),
        }
    }
    Ok(preview)
}

async fn next_available_number<C: sea_orm::ConnectionTrait>(
    conn: &C,
    base: &str,
) -> Result<String, ServiceError> {
    let mut suffix = 1;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if items::Entity::find_active_by_number(&candidate)
            .one(conn)
            .await?
            .is_none()
        {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

/// Apply item-definition rows in one transaction. Duplicates must carry a
/// decision keyed by their original item number; an undecided duplicate
/// aborts the whole batch.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn commit_item_import(
    db: &DatabaseConnection,
    ctx: &AuthContext,
    rows: Vec<ItemDefinitionRow>,
    decisions: &HashMap<String, DuplicateDecision>,
) -> Result<ItemImportSummary, ServiceError> {
    let txn = db.begin().await?;
    let now = Utc::now().naive_utc();
    let mut summary = ItemImportSummary::default();

    for row in rows {
        let existing = match &row.item_number {
            Some(number) => items::Entity::find_active_by_number(number).one(&txn).await?,
            None => None,
        };

        if let Some(existing) = existing {
            let number = row.item_number.clone().unwrap_or_default();
            match decisions.get(&number) {
                Some(DuplicateDecision::Replace) => {
                    let before = serde_json::to_value(&existing).unwrap_or_default();
                    let mut active: items::ActiveModel = existing.into();
                    active.name = Set(row.name.clone());
                    active.manufacturer = Set(row.manufacturer.clone());
                    active.is_required = Set(row.is_required);
                    active.required_quantity = Set(row.required_quantity);
                    active.minimum_threshold = Set(row.minimum_threshold);
                    let updated = active.update(&txn).await?;

                    audit::record_event(
                        &txn,
                        ctx,
                        AuditAction::Update,
                        "items",
                        Some(updated.id),
                        Some(before),
                        Some(serde_json::to_value(&updated).unwrap_or_default()),
                    )
                    .await?;
                    summary.replaced += 1;
                }
                Some(DuplicateDecision::Add) => {
                    let new_number = next_available_number(&txn, &number).await?;
                    let item = insert_item(&txn, &row, Some(new_number), now).await?;
                    audit_item_create(&txn, ctx, &item).await?;
                    summary.created += 1;
                }
                None => {
                    return Err(ServiceError::ImportError(format!(
                        "Unresolved duplicate item number {}",
                        number
                    )));
                }
            }
        } else {
            let item = insert_item(&txn, &row, row.item_number.clone(), now).await?;
            audit_item_create(&txn, ctx, &item).await?;
            summary.created += 1;
        }
    }

    txn.commit().await?;
    info!(
        created = summary.created,
        replaced = summary.replaced,
        "Committed item import"
    );
    Ok(summary)
}

async fn insert_item<C: sea_orm::ConnectionTrait>(
    conn: &C,
    row: &ItemDefinitionRow,
    item_number: Option<String>,
    now: chrono::NaiveDateTime,
) -> Result<items::Model, ServiceError> {
    let item = items::ActiveModel {
        name: Set(row.name.clone()),
        item_number: Set(item_number),
        manufacturer: Set(row.manufacturer.clone()),
        is_required: Set(row.is_required),
        required_quantity: Set(row.required_quantity),
        minimum_threshold: Set(row.minimum_threshold),
        is_active: Set(true),
        created_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(item)
}

async fn audit_item_create<C: sea_orm::ConnectionTrait>(
    conn: &C,
    ctx: &AuthContext,
    item: &items::Model,
) -> Result<(), ServiceError> {
    audit::record_event(
        conn,
        ctx,
        AuditAction::Create,
        "items",
        Some(item.id),
        None,
        Some(serde_json::to_value(item).unwrap_or_default()),
    )
    .await
}

/// Apply count rows in one transaction. Every row's item number and
/// location must resolve before anything is written; a row matching an
/// existing active line by (item, location, expiration, lot) replaces its
/// quantity, otherwise a new line is inserted. A zero-quantity row
/// soft-deletes its matching line, same as zeroing it during a count,
/// and is a no-op when nothing matches.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn commit_count_import(
    db: &DatabaseConnection,
    ctx: &AuthContext,
    rows: Vec<CountRow>,
) -> Result<CountImportSummary, ServiceError> {
    let txn = db.begin().await?;
    let now = Utc::now().naive_utc();

    // Validate every reference first so nothing is written on failure.
    let mut resolved = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let row_number = i + 2;
        let item = items::Entity::find_active_by_number(&row.item_number)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ImportError(format!(
                    "Row {}: unknown item number {}",
                    row_number, row.item_number
                ))
            })?;
        locations::Entity::find_active()
            .filter(locations::Column::Id.eq(row.location_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ImportError(format!(
                    "Row {}: unknown location id {}",
                    row_number, row.location_id
                ))
            })?;
        resolved.push((item.id, row.clone()));
    }

    let mut summary = CountImportSummary::default();
    for (item_id, row) in resolved {
        let existing = inventory_records::Entity::find_active()
            .filter(inventory_records::tuple_condition(
                item_id,
                row.location_id,
                row.expiration_date,
                row.lot_number.as_deref(),
                None,
            ))
            .one(&txn)
            .await?;

        if let Some(existing) = existing {
            let before = audit::record_snapshot(&existing);
            let mut active: inventory_records::ActiveModel = existing.clone().into();
            if row.quantity == 0 {
                active.is_active = Set(false);
                active.deleted_at = Set(Some(now));
                let removed = active.update(&txn).await?;

                audit::record_event(
                    &txn,
                    ctx,
                    AuditAction::Delete,
                    "inventory_records",
                    Some(removed.id),
                    Some(before),
                    None,
                )
                .await?;
                summary.removed += 1;
                continue;
            }
            active.quantity = Set(row.quantity);
            let updated = active.update(&txn).await?;

            audit::record_event(
                &txn,
                ctx,
                AuditAction::Update,
                "inventory_records",
                Some(updated.id),
                Some(before),
                Some(audit::record_snapshot(&updated)),
            )
            .await?;
            summary.updated += 1;
        } else if row.quantity == 0 {
            // Nothing on hand and nothing recorded; no line to write.
        } else {
            let record = inventory_records::ActiveModel {
                item_id: Set(item_id),
                location_id: Set(row.location_id),
                section: Set(None),
                quantity: Set(row.quantity),
                expiration_date: Set(row.expiration_date),
                lot_number: Set(row.lot_number.clone()),
                is_active: Set(true),
                created_at: Set(now),
                deleted_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            audit::record_event(
                &txn,
                ctx,
                AuditAction::Create,
                "inventory_records",
                Some(record.id),
                None,
                Some(audit::record_snapshot(&record)),
            )
            .await?;
            summary.created += 1;
        }
    }

    txn.commit().await?;
    info!(
        created = summary.created,
        updated = summary.updated,
        removed = summary.removed,
        "Committed count import"
    );
    Ok(summary)
}
