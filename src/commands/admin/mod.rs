pub mod item_commands;
pub mod location_commands;
pub mod user_commands;

pub use item_commands::{CreateItemCommand, DeleteItemCommand, UpdateItemCommand};
pub use location_commands::{CreateLocationCommand, DeleteLocationCommand, UpdateLocationCommand};
pub use user_commands::{CreateUserCommand, DeleteUserCommand, UpdateUserCommand};
