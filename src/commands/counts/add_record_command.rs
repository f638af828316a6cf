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

/// Add a stock line to the count's location. When an active record already
/// exists for the same (item, location, expiration, lot, section) tuple the
/// quantities are merged rather than inserting a duplicate.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddRecordCommand {
    #[validate(range(min = 1))]
    pub count_id: i32,
    #[validate(range(min = 1))]
    pub item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    #[validate(length(max = 5))]
    pub section: Option<String>,
}

#[async_trait]
impl Command for AddRecordCommand {
    type Result = inventory_records::Model;

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

        items::Entity::find_active()
            .filter(items::Column::Id.eq(self.item_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", self.item_id)))?;

        let existing = inventory_records::Entity::find_active()
            .filter(inventory_records::tuple_condition(
                self.item_id,
                count.location_id,
                self.expiration_date,
                self.lot_number.as_deref(),
                self.section.as_deref(),
            ))
            .one(&txn)
            .await?;

        let result = if let Some(existing) = existing {
            let merged = existing.quantity.checked_add(self.quantity).ok_or_else(|| {
                ServiceError::ValidationError("Quantity exceeds the supported range".to_string())
            })?;
            let before = audit::record_snapshot(&existing);
            let mut active: inventory_records::ActiveModel = existing.clone().into();
            active.quantity = Set(merged);
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
            updated
        } else {
            let inserted = inventory_records::ActiveModel {
                item_id: Set(self.item_id),
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
                Some(inserted.id),
                None,
                Some(audit::record_snapshot(&inserted)),
            )
            .await?;
            inserted
        };

        txn.commit().await?;
        info!(
            record_id = result.id,
            item_id = self.item_id,
            quantity = result.quantity,
            "Added stock line to count"
        );
        Ok(result)
    }
}
