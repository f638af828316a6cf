use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;

pub mod audit_queries;
pub mod report_queries;
pub mod status_queries;

/// A read-only operation over the store. Queries never mutate and never
/// emit audit events.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}
