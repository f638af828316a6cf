use async_trait::async_trait;
use chrono::Utc;
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

/// Copy quantity/expiration/lot/section from an existing line onto another
/// item. Speeds up entering near-identical lines during a walkthrough.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DuplicateRecordCommand {
    #[validate(range(min = 1))]
    pub count_id: i32,
    #[validate(range(min = 1))]
    pub source_record_id: i32,
    #[validate(range(min = 1))]
    pub target_item_id: i32,
}

#[async_trait]
impl Command for DuplicateRecordCommand {
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

        let count = inventory_counts::Entity::find_active()
            .filter(inventory_counts::Column::Id.eq(self.count_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Count {} not found", self.count_id)))?;

        let source = inventory_records::Entity::find_active()
            .filter(inventory_records::Column::Id.eq(self.source_record_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Inventory record {} not found",
                    self.source_record_id
                ))
            })?;

        if source.location_id != count.location_id {
            return Err(ServiceError::Forbidden(
                "Record does not belong to this count's location".to_string(),
            ));
        }

        items::Entity::find_active()
            .filter(items::Column::Id.eq(self.target_item_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Item {} not found", self.target_item_id))
            })?;

        let inserted = inventory_records::ActiveModel {
            item_id: Set(self.target_item_id),
            location_id: Set(count.location_id),
            section: Set(source.section.clone()),
            quantity: Set(source.quantity),
            expiration_date: Set(source.expiration_date),
            lot_number: Set(source.lot_number.clone()),
            is_active: Set(true),
            created_at: Set(Utc::now().naive_utc()),
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
        txn.commit().await?;
        info!(
            record_id = inserted.id,
            source_record_id = self.source_record_id,
            "Duplicated stock line"
        );
        Ok(inserted)
    }
}
