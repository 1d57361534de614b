pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UploadCsvCommand, UploadCsvError};

pub use queries::{DownloadCsvError, DownloadCsvQuery, DOWNLOAD_FILENAME};

pub use routes::csv_routes;
