pub mod admin;
pub mod counts;
pub mod imports;
pub mod inventory;
pub mod reports;
