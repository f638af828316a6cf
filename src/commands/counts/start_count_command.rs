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
use crate::entities::{inventory_counts, inventory_records, locations};
use crate::errors::ServiceError;
use crate::services::audit;

/// Begin a new count session at a location. If a prior session exists,
/// every active record at the location is duplicated as a fresh row so
/// edits during the new session never touch history.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct StartCountCommand {
    #[validate(range(min = 1))]
    pub location_id: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartCountResult {
    pub count: inventory_counts::Model,
    pub records_copied: usize,
}

#[async_trait]
impl Command for StartCountCommand {
    type Result = StartCountResult;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let user_id = ctx.require_user()?;
        let txn = db.begin().await?;
        let now = Utc::now().naive_utc();

        locations::Entity::find_active()
            .filter(locations::Column::Id.eq(self.location_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", self.location_id))
            })?;

        let prior = inventory_counts::Entity::find_latest_for_location(self.location_id)
            .one(&txn)
            .await?;

        let count = inventory_counts::ActiveModel {
            location_id: Set(self.location_id),
            user_id: Set(user_id),
            counted_at: Set(now),
            notes: Set(self.notes.clone()),
            is_active: Set(true),
            created_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut records_copied = 0;
        if let Some(prior) = prior {
            let existing = inventory_records::Entity::find_active_at_location(self.location_id)
                .all(&txn)
                .await?;
            for source in &existing {
                inventory_records::ActiveModel {
                    item_id: Set(source.item_id),
                    location_id: Set(source.location_id),
                    section: Set(source.section.clone()),
                    quantity: Set(source.quantity),
                    expiration_date: Set(source.expiration_date),
                    lot_number: Set(source.lot_number.clone()),
                    is_active: Set(true),
                    created_at: Set(now),
                    deleted_at: Set(None),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
            records_copied = existing.len();

            audit::record_event(
                &txn,
                ctx,
                AuditAction::Copy,
                "inventory_counts",
                Some(count.id),
                None,
                Some(serde_json::json!({
                    "source_count_id": prior.id,
                    "records_copied": records_copied,
                })),
            )
            .await?;
        }

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Create,
            "inventory_counts",
            Some(count.id),
            None,
            Some(serde_json::json!({
                "location_id": count.location_id,
                "counted_at": count.counted_at,
                "notes": count.notes,
            })),
        )
        .await?;

        txn.commit().await?;
        info!(
            count_id = count.id,
            location_id = self.location_id,
            records_copied,
            "Started inventory count"
        );
        Ok(StartCountResult {
            count,
            records_copied,
        })
    }
}
