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
use crate::entities::users;
use crate::errors::ServiceError;
use crate::services::audit;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateUserCommand {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[async_trait]
impl Command for CreateUserCommand {
    type Result = users::Model;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;

        let taken = users::Entity::find_active()
            .filter(users::Column::Username.eq(self.username.as_str()))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Username {} already exists",
                self.username
            )));
        }

        let user = users::ActiveModel {
            username: Set(self.username.clone()),
            email: Set(self.email.clone()),
            is_admin: Set(self.is_admin),
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
            "users",
            Some(user.id),
            None,
            Some(serde_json::json!({
                "username": user.username,
                "is_admin": user.is_admin,
            })),
        )
        .await?;
        txn.commit().await?;
        info!(user_id = user.id, "Created user");
        Ok(user)
    }
}

/// Fields left as `None` are not modified.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateUserCommand {
    #[validate(range(min = 1))]
    pub id: i32,
    pub username: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

#[async_trait]
impl Command for UpdateUserCommand {
    type Result = users::Model;

    #[instrument(skip(self, db))]
    async fn execute(
        &self,
        db: Arc<DbPool>,
        ctx: &AuthContext,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        ctx.require_admin()?;
        let txn = db.begin().await?;

        let user = users::Entity::find_active()
            .filter(users::Column::Id.eq(self.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", self.id)))?;

        let before = serde_json::to_value(&user).unwrap_or_default();
        let mut active: users::ActiveModel = user.into();
        if let Some(username) = &self.username {
            active.username = Set(username.clone());
        }
        if let Some(email) = &self.email {
            active.email = Set(email.clone());
        }
        if let Some(is_admin) = self.is_admin {
            active.is_admin = Set(is_admin);
        }
        let updated = active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Update,
            "users",
            Some(updated.id),
            Some(before),
            Some(serde_json::to_value(&updated).unwrap_or_default()),
        )
        .await?;
        txn.commit().await?;
        info!(user_id = updated.id, "Updated user");
        Ok(updated)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteUserCommand {
    #[validate(range(min = 1))]
    pub id: i32,
}

#[async_trait]
impl Command for DeleteUserCommand {
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

        let user = users::Entity::find_active()
            .filter(users::Column::Id.eq(self.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", self.id)))?;

        let before = serde_json::to_value(&user).unwrap_or_default();
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(false);
        active.deleted_at = Set(Some(Utc::now().naive_utc()));
        active.update(&txn).await?;

        audit::record_event(
            &txn,
            ctx,
            AuditAction::Delete,
            "users",
            Some(self.id),
            Some(before),
            None,
        )
        .await?;
        txn.commit().await?;
        info!(user_id = self.id, "Deleted user");
        Ok(())
    }
}
