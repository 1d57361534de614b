pub mod download;

pub use download::{DownloadCsvError, DownloadCsvQuery, DOWNLOAD_FILENAME};
