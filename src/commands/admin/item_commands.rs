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
use crate::entities::items;
use crate::errors::ServiceError;
use crate::services::audit;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateItemCommand {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub required_quantity: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub minimum_threshold: i32,
}

#[async_trait]
impl Command for CreateItemCommand {
    type Result = items::Model;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;

        if let Some(number) = &self.item_number {
            if items::Entity::find_active_by_number(number)
                .one(&txn)
                .await?
                .is_some()
            {
                return Err(ServiceError::Conflict(format!(
                    "Item number {} already exists",
                    number
                )));
            }
        }

        let item = items::ActiveModel {
            name: Set(self.name.clone()),
            item_number: Set(self.item_number.clone()),
            manufacturer: Set(self.manufacturer.clone()),
            is_required: Set(self.is_required),
            required_quantity: Set(self.required_quantity),
            minimum_threshold: Set(self.minimum_threshold),
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
            "items",
            Some(item.id),
            None,
            Some(serde_json::to_value(&item).unwrap_or_default()),
        )
        .await?;
        txn.commit().await?;
        info!(item_id = item.id, "Created item");
        Ok(item)
    }
}

/// Fields left as `None` are not modified.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateItemCommand {
    #[validate(range(min = 1))]
    pub id: i32,
    pub name: Option<String>,
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    pub is_required: Option<bool>,
    #[validate(range(min = 0))]
    pub required_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub minimum_threshold: Option<i32>,
}

#[async_trait]
impl Command for UpdateItemCommand {
    type Result = items::Model;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;

        let item = items::Entity::find_active()
            .filter(items::Column::Id.eq(self.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", self.id)))?;

        if let Some(number) = &self.item_number {
            let taken = items::Entity::find_active_by_number(number)
                .filter(items::Column::Id.ne(self.id))
                .one(&txn)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Item number {} already exists",
                    number
                )));
            }
        }

        let before = serde_json::to_value(&item).unwrap_or_default();
        let mut active: items::ActiveModel = item.into();
        if let Some(name) = &self.name {
            active.name = Set(name.clone());
        }
        if let Some(number) = &self.item_number {
            active.item_number = Set(Some(number.clone()));
        }
        if let Some(manufacturer) = &self.manufacturer {
            active.manufacturer = Set(Some(manufacturer.clone()));
        }
        if let Some(is_required) = self.is_required {
            active.is_required = Set(is_required);
        }
        if let Some(required_quantity) = self.required_quantity {
            active.required_quantity = Set(required_quantity);
        }
        if let Some(minimum_threshold) = self.minimum_threshold {
            active.minimum_threshold = Set(minimum_threshold);
        }
        let updated = active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Update,
            "items",
            Some(updated.id),
            Some(before),
            Some(serde_json::to_value(&updated).unwrap_or_default()),
        )
        .await?;
        txn.commit().await?;
        info!(item_id = updated.id, "Updated item");
        Ok(updated)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteItemCommand {
    #[validate(range(min = 1))]
    pub id: i32,
}

#[async_trait]
impl Command for DeleteItemCommand {
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

        let item = items::Entity::find_active()
            .filter(items::Column::Id.eq(self.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", self.id)))?;

        let before = serde_json::to_value(&item).unwrap_or_default();
        let mut active: items::ActiveModel = item.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(Utc::now().naive_utc()));
        active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Delete,
            "items",
            Some(self.id),
            Some(before),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(item_id = self.id, "Deleted item");
        Ok(())
    }
}
