//! Typed environment variable lookups

use std::str::FromStr;

use crate::error::{ItemportError, Result};

/// Read `name` and parse it, falling back to `default` when unset or blank.
///
/// A value that is present but does not parse is an error rather than a
/// silent fallback.
pub fn var_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(var_opt(name)?.unwrap_or(default))
}

/// Read and parse `name`; `Ok(None)` when the variable is unset or blank.
pub fn var_opt<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ItemportError::InvalidEnv {
                    name: name.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        },
        _ => Ok(None),
    }
}

/// Read a comma-separated list, trimming entries and dropping empty ones.
pub fn list_or(name: &str, default: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_var_or_uses_default_when_unset() {
        std::env::remove_var("ITEMPORT_TEST_PORT");
        assert_eq!(var_or("ITEMPORT_TEST_PORT", 8080u16).unwrap(), 8080);
    }

    #[test]
    #[serial]
    fn test_var_or_parses_trimmed_value() {
        std::env::set_var("ITEMPORT_TEST_PORT", " 9000 ");
        assert_eq!(var_or("ITEMPORT_TEST_PORT", 8080u16).unwrap(), 9000);
        std::env::remove_var("ITEMPORT_TEST_PORT");
    }

    #[test]
    #[serial]
    fn test_var_or_rejects_garbage() {
        std::env::set_var("ITEMPORT_TEST_PORT", "eighty");
        let err = var_or("ITEMPORT_TEST_PORT", 8080u16).unwrap_err();
        assert!(err.to_string().contains("ITEMPORT_TEST_PORT"));
        std::env::remove_var("ITEMPORT_TEST_PORT");
    }

    #[test]
    #[serial]
    fn test_list_or_splits_and_trims() {
        std::env::set_var("ITEMPORT_TEST_ORIGINS", "http://a.test, ,http://b.test ");
        assert_eq!(
            list_or("ITEMPORT_TEST_ORIGINS", "http://localhost:8081"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        std::env::remove_var("ITEMPORT_TEST_ORIGINS");
        assert_eq!(
            list_or("ITEMPORT_TEST_ORIGINS", "http://localhost:8081"),
            vec!["http://localhost:8081".to_string()]
        );
    }
}
