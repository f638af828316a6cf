use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::entities::audit_events;
use crate::errors::ServiceError;
use crate::queries::Query;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Serialize)]
pub struct AuditPage {
    pub events: Vec<audit_events::Model>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// Paged audit trail, newest first. Admin-only; the handler enforces the
/// capability before running this.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuditLogQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub table_name: Option<String>,
    pub action: Option<String>,
}

#[async_trait]
impl Query for AuditLogQuery {
    type Result = AuditPage;

    #[instrument(skip(self, db))]
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let mut select = audit_events::Entity::find()
            .order_by_desc(audit_events::Column::LoggedAt)
            .order_by_desc(audit_events::Column::Id);
        if let Some(table_name) = &self.table_name {
            select = select.filter(audit_events::Column::TableName.eq(table_name.as_str()));
        }
        if let Some(action) = &self.action {
            select = select.filter(audit_events::Column::Action.eq(action.as_str()));
        }

        let paginator = select.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let events = paginator.fetch_page(page - 1).await?;

        Ok(AuditPage {
            events,
            page,
            per_page,
            total,
        })
    }
}
