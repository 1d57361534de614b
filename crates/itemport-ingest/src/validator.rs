//! Declared media type check
//!
//! Only the media type the client declared is compared; the file content is
//! never sniffed. A `.txt` upload declared as `text/csv` is accepted, and a
//! real CSV declared as `text/csv; charset=utf-8` is not.

/// Accepts an upload iff its declared media type equals the expected one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatValidator {
    expected: String,
}

impl Default for FormatValidator {
    fn default() -> Self {
        Self::new(mime::TEXT_CSV.essence_str())
    }
}

impl FormatValidator {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn accepts(&self, declared_media_type: &str) -> bool {
        declared_media_type == self.expected
    }
}
