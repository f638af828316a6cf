use crate::errors::ServiceError;
use crate::queries::report_queries::InventorySummaryRow;

pub const CSV_HEADER: [&str; 8] = [
    "Location",
    "Section",
    "Item Name",
    "Quantity",
    "Expiration Date",
    "Lot Number",
    "Last Inventory Date",
    "Status",
];

const MISSING_TEXT: &str = "N/A";
const MISSING_EXPIRY: &str = "No Expiry";

/// Render the inventory summary as CSV. Dates are `YYYY-MM-DD`; missing
/// text fields render as `N/A` and a missing expiration as `No Expiry`.
pub fn render_inventory_csv(rows: &[InventorySummaryRow]) -> Result<String, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    for row in rows {
        let expiration = row
            .expiration_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| MISSING_EXPIRY.to_string());
        let last_inventory = row
            .last_inventory_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| MISSING_TEXT.to_string());
        writer
            .write_record([
                row.location_name.as_str(),
                row.section.as_deref().unwrap_or(MISSING_TEXT),
                row.item_name.as_str(),
                &row.quantity.to_string(),
                &expiration,
                row.lot_number.as_deref().unwrap_or(MISSING_TEXT),
                &last_inventory,
                &row.status.to_string(),
            ])
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::status_queries::RecordStatus;
    use chrono::NaiveDate;

    fn row(quantity: i32, expiration: Option<NaiveDate>) -> InventorySummaryRow {
        InventorySummaryRow {
            record_id: 1,
            location_id: 1,
            location_name: "Supply Room A".to_string(),
            section: None,
            item_id: 1,
            item_name: "Gauze".to_string(),
            item_number: Some("GZ-100".to_string()),
            quantity,
            expiration_date: expiration,
            lot_number: None,
            last_inventory_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            status: if quantity <= 2 {
                RecordStatus::LowStock
            } else {
                RecordStatus::Good
            },
        }
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let csv = render_inventory_csv(&[row(10, None)]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Location,Section,Item Name,Quantity,Expiration Date,Lot Number,Last Inventory Date,Status"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Supply Room A,N/A,Gauze,10,No Expiry,N/A,2026-05-01,Good"
        );
    }

    #[test]
    fn dates_use_iso_format() {
        let csv = render_inventory_csv(&[row(1, NaiveDate::from_ymd_opt(2026, 12, 31))]).unwrap();
        assert!(csv.contains("2026-12-31"));
        assert!(csv.contains("Low Stock"));
    }
}
