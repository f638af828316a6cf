use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Location kind. Only supply rooms participate in aggregate low-stock
/// thresholding; ambulances and go-bags are field units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Ambulance,
    SupplyRoom,
    GoBag,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub location_type: String,
    pub vehicle_id: Option<String>,
    pub has_sections: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_supply_room(&self) -> bool {
        self.location_type == LocationType::SupplyRoom.to_string()
    }
}

impl Entity {
    pub fn find_active() -> Select<Entity> {
        Self::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::DeletedAt.is_null())
    }
}
