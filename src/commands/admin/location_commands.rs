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
use crate::entities::locations::{self, LocationType};
use crate::errors::ServiceError;
use crate::services::audit;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateLocationCommand {
    #[validate(length(min = 1, message = "Location name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub location_type: LocationType,
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub has_sections: bool,
}

#[async_trait]
impl Command for CreateLocationCommand {
    type Result = locations::Model;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;

        let location = locations::ActiveModel {
            name: Set(self.name.clone()),
            description: Set(self.description.clone()),
            location_type: Set(self.location_type.to_string()),
            vehicle_id: Set(self.vehicle_id.clone()),
            has_sections: Set(self.has_sections),
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
            "locations",
            Some(location.id),
            None,
            Some(serde_json::to_value(&location).unwrap_or_default()),
        )
        .await?;
        txn.commit().await?;
        info!(location_id = location.id, "Created location");
        Ok(location)
    }
}

/// Fields left as `None` are not modified.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateLocationCommand {
    #[validate(range(min = 1))]
    pub id: i32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location_type: Option<LocationType>,
    pub vehicle_id: Option<String>,
    pub has_sections: Option<bool>,
}

#[async_trait]
impl Command for UpdateLocationCommand {
    type Result = locations::Model;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;

        let location = locations::Entity::find_active()
            .filter(locations::Column::Id.eq(self.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", self.id)))?;

        let before = serde_json::to_value(&location).unwrap_or_default();
        let mut active: locations::ActiveModel = location.into();
        if let Some(name) = &self.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &self.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(location_type) = self.location_type {
            active.location_type = Set(location_type.to_string());
        }
        if let Some(vehicle_id) = &self.vehicle_id {
            active.vehicle_id = Set(Some(vehicle_id.clone()));
        }
        if let Some(has_sections) = self.has_sections {
            active.has_sections = Set(has_sections);
        }
        let updated = active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Update,
            "locations",
            Some(updated.id),
            Some(before),
            Some(serde_json::to_value(&updated).unwrap_or_default()),
        )
        .await?;
        txn.commit().await?;
        info!(location_id = updated.id, "Updated location");
        Ok(updated)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteLocationCommand {
    #[validate(range(min = 1))]
    pub id: i32,
}

#[async_trait]
impl Command for DeleteLocationCommand {
    type Result = ();

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;

        let location = locations::Entity::find_active()
            .filter(locations::Column::Id.eq(self.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", self.id)))?;

        let before = serde_json::to_value(&location).unwrap_or_default();
        let mut active: locations::ActiveModel = location.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(Utc::now().naive_utc()));
        active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Delete,
            "locations",
            Some(self.id),
            Some(before),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(location_id = self.id, "Deleted location");
        Ok(())
    }
}
