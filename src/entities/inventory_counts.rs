use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;
use serde::{Deserialize, Serialize};

/// A count session: one physical walkthrough of a location. Records are
/// scoped to the most recent active count per location by `counted_at`
/// ordering; there is no record-to-count foreign key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_counts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub location_id: i32,
    pub user_id: i32,
    pub counted_at: NaiveDateTime,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    pub fn find_active() -> Select<Entity> {
        Self::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::DeletedAt.is_null())
    }

    /// The current count for a location, i.e. the newest active session.
    pub fn find_latest_for_location(location_id: i32) -> Select<Entity> {
        Self::find_active()
            .filter(Column::LocationId.eq(location_id))
            .order_by_desc(Column::CountedAt)
            .order_by_desc(Column::Id)
    }
}
