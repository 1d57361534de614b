//! Itemport Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Framework-independent bulk import of delimited text into typed records.
//!
//! # Components
//!
//! - **Schema**: [`RecordSchema`] declares the columns one record kind expects
//! - **Parser**: [`RowParser`] streams rows into records or [`RowError`]s
//! - **Validator**: [`FormatValidator`] checks the declared media type
//! - **Sink**: [`PersistenceSink`] is the store seam, [`MemoryItemSink`] the in-process store
//! - **Pipeline**: [`ImportPipeline`] runs an [`Upload`] end to end into an [`ImportReport`]
//! - **Export**: [`export::write_csv`] writes records back out as CSV
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use itemport_ingest::{ConflictPolicy, ImportPipeline, MemoryItemSink, Upload};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sink = Arc::new(MemoryItemSink::new(ConflictPolicy::Replace));
//!     let pipeline = ImportPipeline::for_record(sink);
//!
//!     let upload = Upload::new("id,item_name\n1,Pen\n".as_bytes()).media_type("text/csv");
//!     let report = pipeline.import(upload).await?;
//!     println!("imported {} rows", report.imported_count());
//!     Ok(())
//! }
//! ```

pub mod export;
pub mod memory;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod schema;
pub mod sink;
pub mod validator;

pub use memory::MemoryItemSink;
pub use parser::{RowError, RowErrorKind, RowParser, RowStream};
pub use pipeline::{ImportConfig, ImportError, ImportPipeline, Upload};
pub use record::{Item, ItemDraft, Record, TypedRow};
pub use report::{ImportReport, RowOutcome};
pub use schema::{ColumnDef, ColumnType, RecordSchema, SchemaError};
pub use sink::{ConflictPolicy, PersistenceSink, SinkError};
pub use validator::FormatValidator;
