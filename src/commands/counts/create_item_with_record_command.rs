use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::AuthContext;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::audit_events::AuditAction;
use crate::entities::{inventory_counts, inventory_records, items};
use crate::errors::ServiceError;
use crate::services::audit;

/// Create a brand-new catalog item and its first stock line in one
/// transaction, for supplies encountered mid-walkthrough that are not in
/// the catalog yet.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateItemWithRecordCommand {
    #[validate(range(min = 1))]
    pub count_id: i32,
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub required_quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub minimum_threshold: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    #[validate(length(max = 5))]
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateItemWithRecordResult {
    pub item: items::Model,
    pub record: inventory_records::Model,
}

#[async_trait]
impl Command for CreateItemWithRecordCommand {
    type Result = CreateItemWithRecordResult;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_user()?;
        let txn = db.begin().await?;
        let now = Utc::now().naive_utc();

        let count = inventory_counts::Entity::find_active()
            .filter(inventory_counts::Column::Id.eq(self.count_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Count {} not found", self.count_id)))?;

        if let Some(number) = &self.item_number {
            let taken = items::Entity::find_active_by_number(number).one(&txn).await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Item number {} already exists",
                    number
                )));
            }
        }

        let item = items::ActiveModel {
            name: Set(self.name.clone()),
            item_number: Set(self.item_number.clone()),
            manufacturer: Set(self.manufacturer.clone()),
            is_required: Set(self.is_required),
            required_quantity: Set(self.required_quantity),
            minimum_threshold: Set(self.minimum_threshold),
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
            "items",
            Some(item.id),
            None,
            Some(serde_json::json!({
                "name": item.name,
                "item_number": item.item_number,
                "minimum_threshold": item.minimum_threshold,
            })),
        )
        .await?;

        let record = inventory_records::ActiveModel {
            item_id: Set(item.id),
            location_id: Set(count.location_id),
            section: Set(self.section.clone()),
            quantity: Set(self.quantity),
            expiration_date: Set(self.expiration_date),
            lot_number: Set(self.lot_number.clone()),
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
        txn.commit().await?;
        info!(item_id = item.id, record_id = record.id, "Created item with stock line");
        Ok(CreateItemWithRecordResult { item, record })
    }
}
