use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;

use crate::auth::AuthContext;
use crate::entities::audit_events::{self, AuditAction};
use crate::errors::ServiceError;

/// Append one event to the audit trail. Callers inside a transaction pass
/// the transaction handle so the event commits or rolls back with the
/// change it describes.
pub async fn record_event<C: ConnectionTrait>(
    conn: &C,
    ctx: &AuthContext,
    action: AuditAction,
    table_name: &str,
    record_id: Option<i32>,
    old_values: Option<Value>,
    new_values: Option<Value>,
) -> Result<(), ServiceError> {
    let event = audit_events::ActiveModel {
        user_id: Set(ctx.user_id),
        action: Set(action.to_string()),
        table_name: Set(table_name.to_string()),
        record_id: Set(record_id),
        old_values: Set(old_values.map(|v| v.to_string())),
        new_values: Set(new_values.map(|v| v.to_string())),
        logged_at: Set(Utc::now().naive_utc()),
        ip_address: Set(ctx.remote_addr.clone()),
        ..Default::default()
    };
    event.insert(conn).await?;
    Ok(())
}

/// Snapshot of an inventory record for before/after audit payloads.
pub fn record_snapshot(record: &crate::entities::inventory_records::Model) -> Value {
    serde_json::json!({
        "item_id": record.item_id,
        "location_id": record.location_id,
        "section": record.section,
        "quantity": record.quantity,
        "expiration_date": record.expiration_date,
        "lot_number": record.lot_number,
    })
}
