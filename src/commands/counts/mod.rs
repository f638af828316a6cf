pub mod add_record_command;
pub mod clear_all_counts_command;
pub mod clear_count_command;
pub mod create_item_with_record_command;
pub mod duplicate_record_command;
pub mod remove_record_command;
pub mod set_record_quantity_command;
pub mod start_count_command;

pub use add_record_command::AddRecordCommand;
pub use clear_all_counts_command::ClearAllCountsCommand;
pub use clear_count_command::ClearCountCommand;
pub use create_item_with_record_command::CreateItemWithRecordCommand;
pub use duplicate_record_command::DuplicateRecordCommand;
pub use remove_record_command::RemoveRecordCommand;
pub use set_record_quantity_command::SetRecordQuantityCommand;
pub use start_count_command::StartCountCommand;
