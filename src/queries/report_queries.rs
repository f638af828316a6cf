use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

use crate::entities::{inventory_counts, inventory_records, items, locations};
use crate::errors::ServiceError;
use crate::queries::status_queries::{record_status, RecordStatus};
use crate::queries::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    LowStock,
    Expired,
    ExpiringSoon,
}

impl StatusFilter {
    fn matches(self, status: RecordStatus) -> bool {
        matches!(
            (self, status),
            (StatusFilter::LowStock, RecordStatus::LowStock)
                | (StatusFilter::Expired, RecordStatus::Expired)
                | (StatusFilter::ExpiringSoon, RecordStatus::ExpiringSoon)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummaryRow {
    pub record_id: i32,
    pub location_id: i32,
    pub location_name: String,
    pub section: Option<String>,
    pub item_id: i32,
    pub item_name: String,
    pub item_number: Option<String>,
    pub quantity: i32,
    pub expiration_date: Option<NaiveDate>,
    pub lot_number: Option<String>,
    /// Date of the newest count session at the row's location, if any.
    pub last_inventory_date: Option<NaiveDate>,
    pub status: RecordStatus,
}

/// One row per active stock line, joined with item and location names.
/// Free-text search covers item name, location name, lot number, and
/// section; all filters compose by conjunction.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InventorySummaryQuery {
    pub q: Option<String>,
    pub location_id: Option<i32>,
    pub status: Option<StatusFilter>,
}

#[async_trait]
impl Query for InventorySummaryQuery {
    type Result = Vec<InventorySummaryRow>;

    #[instrument(skip(self, db))]
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let today = Utc::now().date_naive();
        let records = inventory_records::Entity::find_active().all(db).await?;
        let items: HashMap<i32, items::Model> = items::Entity::find_active()
            .all(db)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();
        let locations: HashMap<i32, locations::Model> = locations::Entity::find_active()
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        // Newest count timestamp per location scopes the "current" view.
        let mut last_counted: HashMap<i32, NaiveDate> = HashMap::new();
        for count in inventory_counts::Entity::find_active().all(db).await? {
            let date = count.counted_at.date();
            last_counted
                .entry(count.location_id)
                .and_modify(|d| {
                    if date > *d {
                        *d = date;
                    }
                })
                .or_insert(date);
        }

        let needle = self.q.as_ref().map(|q| q.to_lowercase());
        let mut rows = Vec::new();
        for record in records {
            let (item, location) = match (
                items.get(&record.item_id),
                locations.get(&record.location_id),
            ) {
                (Some(item), Some(location)) => (item, location),
                // Records pointing at soft-deleted items/locations drop out
                // of the summary with their parent.
                _ => continue,
            };
            if let Some(location_id) = self.location_id {
                if record.location_id != location_id {
                    continue;
                }
            }
            let status = record_status(record.quantity, record.expiration_date, today);
            if let Some(filter) = self.status {
                if !filter.matches(status) {
                    continue;
                }
            }
            if let Some(needle) = &needle {
                let lot = record.lot_number.as_deref().unwrap_or("");
                let section = record.section.as_deref().unwrap_or("");
                let hit = item.name.to_lowercase().contains(needle)
                    || location.name.to_lowercase().contains(needle)
                    || lot.to_lowercase().contains(needle)
                    || section.to_lowercase().contains(needle);
                if !hit {
                    continue;
                }
            }
            rows.push(InventorySummaryRow {
                record_id: record.id,
                location_id: record.location_id,
                location_name: location.name.clone(),
                section: record.section.clone(),
                item_id: record.item_id,
                item_name: item.name.clone(),
                item_number: item.item_number.clone(),
                quantity: record.quantity,
                expiration_date: record.expiration_date,
                lot_number: record.lot_number.clone(),
                last_inventory_date: last_counted.get(&record.location_id).copied(),
                status,
            });
        }

        rows.sort_by(|a, b| {
            a.location_name
                .cmp(&b.location_name)
                .then_with(|| a.section.cmp(&b.section))
                .then_with(|| a.item_name.cmp(&b.item_name))
        });
        Ok(rows)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpirationRow {
    pub location_name: String,
    pub item_name: String,
    pub quantity: i32,
    pub expiration_date: NaiveDate,
    pub lot_number: Option<String>,
}

/// Non-overlapping forward windows, in days from today.
const EXPIRATION_WINDOWS: [(i64, i64); 4] = [(0, 30), (31, 60), (61, 90), (91, 180)];

#[derive(Debug, Serialize)]
pub struct ExpirationReport {
    pub expired: Vec<ExpirationRow>,
    pub within_30_days: Vec<ExpirationRow>,
    pub within_31_to_60_days: Vec<ExpirationRow>,
    pub within_61_to_90_days: Vec<ExpirationRow>,
    pub within_91_to_180_days: Vec<ExpirationRow>,
}

/// Time-bucketed expiration report over all active dated stock lines.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExpirationReportQuery {}

#[async_trait]
impl Query for ExpirationReportQuery {
    type Result = ExpirationReport;

    #[instrument(skip(self, db))]
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let today = Utc::now().date_naive();
        let records = inventory_records::Entity::find_active().all(db).await?;
        let items: HashMap<i32, String> = items::Entity::find_active()
            .all(db)
            .await?
            .into_iter()
            .map(|i| (i.id, i.name))
            .collect();
        let locations: HashMap<i32, String> = locations::Entity::find_active()
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.id, l.name))
            .collect();

        let mut buckets: [Vec<ExpirationRow>; 5] = Default::default();
        for record in records {
            let expiration_date = match record.expiration_date {
                Some(date) => date,
                None => continue,
            };
            let (item_name, location_name) = match (
                items.get(&record.item_id),
                locations.get(&record.location_id),
            ) {
                (Some(item), Some(location)) => (item.clone(), location.clone()),
                _ => continue,
            };
            let row = ExpirationRow {
                location_name,
                item_name,
                quantity: record.quantity,
                expiration_date,
                lot_number: record.lot_number,
            };
            let bucket = if expiration_date < today {
                Some(0)
            } else {
                EXPIRATION_WINDOWS
                    .iter()
                    .position(|(from, to)| {
                        expiration_date >= today + Duration::days(*from)
                            && expiration_date <= today + Duration::days(*to)
                    })
                    .map(|i| i + 1)
            };
            if let Some(bucket) = bucket {
                buckets[bucket].push(row);
            }
        }
        for bucket in &mut buckets {
            bucket.sort_by_key(|row| row.expiration_date);
        }

        let [expired, b30, b60, b90, b180] = buckets;
        Ok(ExpirationReport {
            expired,
            within_30_days: b30,
            within_31_to_60_days: b60,
            within_61_to_90_days: b90,
            within_91_to_180_days: b180,
        })
    }
}
