use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::AuthContext;
use crate::commands::Command;
use crate::db::DbPool;
use crate::entities::audit_events::AuditAction;
use crate::entities::{inventory_counts, inventory_records};
use crate::errors::ServiceError;
use crate::services::audit;

/// Admin-only: soft-delete every active count session and every active
/// inventory record. A bulk operation logged as a single CLEAR_ALL event
/// with the before-counts; no per-row events are emitted.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClearAllCountsCommand {}

#[derive(Debug, Serialize)]
pub struct ClearAllCountsResult {
    pub counts_cleared: u64,
    pub records_cleared: u64,
}

#[async_trait]
impl Command for ClearAllCountsCommand {
    type Result = ClearAllCountsResult;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        ctx.require_admin()?;
        let txn = db.begin().await?;
        let now = Utc::now().naive_utc();

        let counts_cleared = inventory_counts::Entity::find_active().count(&txn).await?;
        let records_cleared = inventory_records::Entity::find_active().count(&txn).await?;

        inventory_records::Entity::update_many()
            .col_expr(inventory_records::Column::IsActive, Expr::value(false))
            .col_expr(inventory_records::Column::DeletedAt, Expr::value(now))
            .filter(inventory_records::Column::IsActive.eq(true))
            .filter(inventory_records::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        inventory_counts::Entity::update_many()
            .col_expr(inventory_counts::Column::IsActive, Expr::value(false))
            .col_expr(inventory_counts::Column::DeletedAt, Expr::value(now))
            .filter(inventory_counts::Column::IsActive.eq(true))
            .filter(inventory_counts::Column::DeletedAt.is_null())
            .exec(&txn)
            .await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::ClearAll,
            "inventory_counts",
            None,
            Some(serde_json::json!({
                "active_counts": counts_cleared,
                "active_records": records_cleared,
            })),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(counts_cleared, records_cleared, "Cleared all counts");
        Ok(ClearAllCountsResult {
            counts_cleared,
            records_cleared,
        })
    }
}
