pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{CreateItemCommand, CreateItemError};

pub use queries::{ListItemsError, ListItemsQuery};

pub use routes::items_routes;
