pub mod create;

pub use create::{CreateItemCommand, CreateItemError};
