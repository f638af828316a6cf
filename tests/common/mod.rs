use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use medsupply_api::entities::locations::LocationType;
use medsupply_api::entities::{inventory_records, items, locations, users};
use medsupply_api::migrator::Migrator;

/// Fresh in-memory SQLite database with the full schema applied. One
/// connection max so every query sees the same in-memory store.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    Arc::new(db)
}

pub async fn seed_user(db: &DatabaseConnection, username: &str, is_admin: bool) -> users::Model {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.org", username)),
        is_admin: Set(is_admin),
        is_active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn seed_location(
    db: &DatabaseConnection,
    name: &str,
    location_type: LocationType,
) -> locations::Model {
    locations::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        location_type: Set(location_type.to_string()),
        vehicle_id: Set(None),
        has_sections: Set(false),
        is_active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert location")
}

pub async fn seed_item(
    db: &DatabaseConnection,
    name: &str,
    item_number: Option<&str>,
    minimum_threshold: i32,
) -> items::Model {
    items::ActiveModel {
        name: Set(name.to_string()),
        item_number: Set(item_number.map(|n| n.to_string())),
        manufacturer: Set(None),
        is_required: Set(false),
        required_quantity: Set(0),
        minimum_threshold: Set(minimum_threshold),
        is_active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert item")
}

pub async fn seed_record(
    db: &DatabaseConnection,
    item_id: i32,
    location_id: i32,
    quantity: i32,
    expiration_date: Option<NaiveDate>,
) -> inventory_records::Model {
    inventory_records::ActiveModel {
        item_id: Set(item_id),
        location_id: Set(location_id),
        section: Set(None),
        quantity: Set(quantity),
        expiration_date: Set(expiration_date),
        lot_number: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert inventory record")
}
