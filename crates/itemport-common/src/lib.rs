//! Itemport Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the itemport workspace.
//!
//! - **Error Handling**: [`ItemportError`] and the [`Result`] alias
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`]

pub mod env;
pub mod error;
pub mod logging;

pub use error::{ItemportError, Result};
