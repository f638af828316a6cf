use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::AuthContext;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::audit_events::AuditAction;
use crate::entities::{inventory_counts, inventory_records};
use crate::errors::ServiceError;
use crate::services::audit;

/// Remove an item's stock line from the count's location. When several
/// active lines exist for the item the oldest (lowest id) is removed.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RemoveRecordCommand {
    #[validate(range(min = 1))]
    pub count_id: i32,
    #[validate(range(min = 1))]
    pub item_id: i32,
}

#[async_trait]
impl Command for RemoveRecordCommand {
    type Result = ();

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

        let record = inventory_records::Entity::find_active_at_location(count.location_id)
            .filter(inventory_records::Column::ItemId.eq(self.item_id))
            .order_by_asc(inventory_records::Column::Id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No active record for item {} at this location",
                    self.item_id
                ))
            })?;

        let before = audit::record_snapshot(&record);
        let mut active: inventory_records::ActiveModel = record.clone().into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(Utc::now().naive_utc()));
        active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Delete,
            "inventory_records",
            Some(record.id),
            Some(before),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(record_id = record.id, item_id = self.item_id, "Removed stock line");
        Ok(())
    }
}
