pub mod upload;

pub use upload::{UploadCsvCommand, UploadCsvError};
