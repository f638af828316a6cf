//! Persisted entities. Reads go through each entity's `find_active()`
//! scope so soft-deleted rows stay invisible by default; audit/admin
//! tooling is the only caller allowed to use the unscoped `find()`.

pub mod audit_events;
pub mod inventory_counts;
pub mod inventory_records;
pub mod items;
pub mod locations;
pub mod users;
