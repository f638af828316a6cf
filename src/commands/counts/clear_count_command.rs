use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
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

/// Admin-only: soft-delete one count session and every active record at
/// its location. One audit event for the whole operation.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ClearCountCommand {
    #[validate(range(min = 1))]
    pub count_id: i32,
}

#[async_trait]
impl Command for ClearCountCommand {
    type Result = u64;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;
        let now = Utc::now().naive_utc();

        let count = inventory_counts::Entity::find_active()
            .filter(inventory_counts::Column::Id.eq(self.count_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Count {} not found", self.count_id)))?;

        let records_cleared = inventory_records::Entity::find_active_at_location(count.location_id)
            .count(&txn)
            .await?;

        inventory_records::Entity::update_many()
            .col_expr(inventory_records::Column::IsActive, Expr::value(false))
            .col_expr(inventory_records::Column::DeletedAt, Expr::value(now))
            .filter(inventory_records::Column::LocationId.eq(count.location_id))
            .filter(inventory_records::Column::IsActive.eq(true))
            .filter(inventory_records::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        let mut active: inventory_counts::ActiveModel = count.clone().into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(now));
        active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Delete,
            "inventory_counts",
            Some(count.id),
            Some(serde_json::json!({
                "location_id": count.location_id,
                "records_cleared": records_cleared,
            })),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(count_id = count.id, records_cleared, "Cleared count");
        Ok(records_cleared)
    }
}
