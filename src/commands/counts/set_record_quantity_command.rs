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
use crate::entities::{inventory_counts, inventory_records};
use crate::errors::ServiceError;
use crate::services::audit;

/// Overwrite a stock line during a count. Quantity zero removes the line
/// (soft delete); any positive quantity updates it in place.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SetRecordQuantityCommand {
    #[validate(range(min = 1))]
    pub count_id: i32,
    #[validate(range(min = 1))]
    pub record_id: i32,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    #[validate(length(max = 5))]
    pub section: Option<String>,
}

#[async_trait]
impl Command for SetRecordQuantityCommand {
    type Result = Option<inventory_records::Model>;

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

        let record = inventory_records::Entity::find_active()
            .filter(inventory_records::Column::Id.eq(self.record_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory record {} not found", self.record_id))
            })?;

        if record.location_id != count.location_id {
            return Err(ServiceError::Forbidden(
                "Record does not belong to this count's location".to_string(),
            ));
        }

        let before = audit::record_snapshot(&record);
        let mut active: inventory_records::ActiveModel = record.clone().into();

        if self.quantity == 0 {
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
            info!(record_id = record.id, "Removed inventory record (quantity zero)");
            return Ok(None);
        }

        active.quantity = Set(self.quantity);
        active.expiration_date = Set(self.expiration_date);
        active.lot_number = Set(self.lot_number.clone());
        active.section = Set(self.section.clone());
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
        txn.commit().await?;
        info!(
            record_id = updated.id,
            quantity = updated.quantity,
            "Updated inventory record"
        );
        Ok(Some(updated))
    }
}
