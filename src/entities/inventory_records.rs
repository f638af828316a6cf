use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;
use sea_orm::Condition;
use serde::{Deserialize, Serialize};

/// One current stock line at a location: an item with a quantity and,
/// optionally, an expiration date, lot number, and section code.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_id: i32,
    pub location_id: i32,
    pub section: Option<String>,
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
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

    pub fn find_active_at_location(location_id: i32) -> Select<Entity> {
        Self::find_active().filter(Column::LocationId.eq(location_id))
    }
}

/// Filter for the identity tuple (item, location, expiration, lot, section).
/// At most one active record may exist per tuple; `None` matches NULL.
pub fn tuple_condition(
    item_id: i32,
    location_id: i32,
    expiration_date: Option<NaiveDate>,
    lot_number: Option<&str>,
    section: Option<&str>,
) -> Condition {
    let mut cond = Condition::all()
        .add(Column::ItemId.eq(item_id))
        .add(Column::LocationId.eq(location_id));

    cond = match expiration_date {
        Some(date) => cond.add(Column::ExpirationDate.eq(date)),
        None => cond.add(Column::ExpirationDate.is_null()),
    };
    cond = match lot_number {
        Some(lot) => cond.add(Column::LotNumber.eq(lot)),
        None => cond.add(Column::LotNumber.is_null()),
    };
    match section {
        Some(section) => cond.add(Column::Section.eq(section)),
        None => cond.add(Column::Section.is_null()),
    }
}
