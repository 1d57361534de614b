//! Error types shared across itemport crates

use thiserror::Error;

/// Result type alias for itemport plumbing
pub type Result<T> = std::result::Result<T, ItemportError>;

/// Errors raised while reading process configuration
#[derive(Error, Debug)]
pub enum ItemportError {
    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidEnv {
        name: String,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_env_names_variable_and_value() {
        let err = ItemportError::InvalidEnv {
            name: "ITEMPORT_PORT".to_string(),
            value: "eighty".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'eighty' for ITEMPORT_PORT: invalid digit found in string"
        );
    }
}
