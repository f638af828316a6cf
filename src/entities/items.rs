use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// External catalog number; unique among active items (enforced at the
    /// command layer so soft-deleted items can keep their old number).
    pub item_number: Option<String>,
    pub manufacturer: Option<String>,
    pub is_required: bool,
    pub required_quantity: i32,
    pub minimum_threshold: i32,
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

    /// Lookup by external item number among active items.
    pub fn find_active_by_number(number: &str) -> Select<Entity> {
        Self::find_active().filter(Column::ItemNumber.eq(number))
    }
}
