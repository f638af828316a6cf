pub mod audit;
pub mod exports;
pub mod imports;
