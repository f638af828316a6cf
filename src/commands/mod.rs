use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::db::DbPool;
use crate::errors::ServiceError;

pub mod admin;
pub mod counts;

/// A validated, strongly-typed mutating operation. Every command runs
/// inside its own transaction and writes its audit events on the same
/// transaction, so a failed audit write rolls the mutation back.
#[async_trait]
pub trait Command: Send + Sync {
    type Result: Send + Sync;

    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError>;
}
