use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strum::Display;
use tracing::instrument;

use crate::entities::{inventory_records, items, locations};
use crate::errors::ServiceError;
use crate::queries::Query;

/// Window for the "expiring soon" classification.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Per-line low quantity floor, independent of any item threshold.
pub const RECORD_LOW_QUANTITY: i32 = 2;

/// Status label attached to a single stock line. Evaluated in precedence
/// order: a low quantity wins over expiry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[strum(serialize = "Low Stock")]
    LowStock,
    #[strum(serialize = "Expired")]
    Expired,
    #[strum(serialize = "Expiring Soon")]
    ExpiringSoon,
    #[strum(serialize = "Good")]
    Good,
}

/// Classify one stock line as of `today`.
pub fn record_status(quantity: i32, expiration: Option<NaiveDate>, today: NaiveDate) -> RecordStatus {
    if quantity <= RECORD_LOW_QUANTITY {
        return RecordStatus::LowStock;
    }
    match expiration {
        Some(date) if date < today => RecordStatus::Expired,
        Some(date) if date <= today + Duration::days(EXPIRING_SOON_DAYS) => {
            RecordStatus::ExpiringSoon
        }
        _ => RecordStatus::Good,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LowStockRow {
    pub item_id: i32,
    pub item_name: String,
    pub item_number: Option<String>,
    pub minimum_threshold: i32,
    pub required_quantity: i32,
    pub total_quantity: i64,
}

/// Items at or below their aggregate threshold across supply rooms only.
/// Field units (ambulances, go-bags) never count toward resupply levels,
/// and items with a zero threshold are never reported.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LowStockQuery {}

#[async_trait]
impl Query for LowStockQuery {
    type Result = Vec<LowStockRow>;

    #[instrument(skip(self, db))]
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let items = items::Entity::find_active().all(db).await?;
        let locations = locations::Entity::find_active().all(db).await?;
        let records = inventory_records::Entity::find_active().all(db).await?;

        let supply_rooms: HashSet<i32> = locations
            .iter()
            .filter(|l| l.is_supply_room())
            .map(|l| l.id)
            .collect();

        let mut totals: HashMap<i32, i64> = HashMap::new();
        for record in &records {
            if supply_rooms.contains(&record.location_id) {
                *totals.entry(record.item_id).or_insert(0) += record.quantity as i64;
            }
        }

        let mut rows: Vec<LowStockRow> = items
            .into_iter()
            .filter(|item| item.minimum_threshold > 0)
            .filter_map(|item| {
                let total = totals.get(&item.id).copied().unwrap_or(0);
                if total <= item.minimum_threshold as i64 {
                    Some(LowStockRow {
                        item_id: item.id,
                        item_name: item.name,
                        item_number: item.item_number,
                        minimum_threshold: item.minimum_threshold,
                        required_quantity: item.required_quantity,
                        total_quantity: total,
                    })
                } else {
                    None
                }
            })
            .collect();
        rows.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        Ok(rows)
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub location_count: usize,
    pub item_count: usize,
    pub record_count: usize,
    pub expired_count: usize,
    pub expiring_soon_count: usize,
    pub low_stock_count: usize,
    pub alerts: Vec<String>,
}

/// Headline numbers and alert banners for the landing page.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DashboardQuery {}

#[async_trait]
impl Query for DashboardQuery {
    type Result = DashboardStats;

    #[instrument(skip(self, db))]
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let today = Utc::now().date_naive();
        let locations = locations::Entity::find_active().all(db).await?;
        let items = items::Entity::find_active().all(db).await?;
        let records = inventory_records::Entity::find_active().all(db).await?;

        let expired_count = records
            .iter()
            .filter(|r| matches!(r.expiration_date, Some(d) if d < today))
            .count();
        let horizon = today + Duration::days(EXPIRING_SOON_DAYS);
        let expiring_soon_count = records
            .iter()
            .filter(|r| matches!(r.expiration_date, Some(d) if d >= today && d <= horizon))
            .count();
        let low_stock_count = LowStockQuery::default().execute(db).await?.len();

        // Alert order is fixed: expired, then expiring soon, then low stock.
        let mut alerts = Vec::new();
        if expired_count > 0 {
            alerts.push(format!("{} record(s) have expired", expired_count));
        }
        if expiring_soon_count > 0 {
            alerts.push(format!(
                "{} record(s) expire within {} days",
                expiring_soon_count, EXPIRING_SOON_DAYS
            ));
        }
        if low_stock_count > 0 {
            alerts.push(format!("{} item(s) are low on stock", low_stock_count));
        }

        Ok(DashboardStats {
            location_count: locations.len(),
            item_count: items.len(),
            record_count: records.len(),
            expired_count,
            expiring_soon_count,
            low_stock_count,
            alerts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn low_quantity_wins_over_expiry() {
        let today = date(2026, 6, 1);
        assert_eq!(
            record_status(2, Some(date(2026, 1, 1)), today),
            RecordStatus::LowStock
        );
        assert_eq!(record_status(0, None, today), RecordStatus::LowStock);
    }

    #[test]
    fn expiry_windows_are_inclusive_of_day_thirty() {
        let today = date(2026, 6, 1);
        assert_eq!(
            record_status(5, Some(today - Duration::days(1)), today),
            RecordStatus::Expired
        );
        assert_eq!(
            record_status(5, Some(today + Duration::days(30)), today),
            RecordStatus::ExpiringSoon
        );
        assert_eq!(
            record_status(5, Some(today + Duration::days(31)), today),
            RecordStatus::Good
        );
        assert_eq!(record_status(5, None, today), RecordStatus::Good);
    }

    #[test]
    fn status_labels_match_export_wording() {
        assert_eq!(RecordStatus::LowStock.to_string(), "Low Stock");
        assert_eq!(RecordStatus::ExpiringSoon.to_string(), "Expiring Soon");
    }
}
