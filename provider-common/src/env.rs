//! Typed environment variable parsing.

use crate::PlatformError;
use std::env;
use std::str::FromStr;

/// Parse environment variable with default value.
///
/// Unset or empty variables yield `default`.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidInput`] when the variable is set but does
/// not parse as `T`.
pub fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, PlatformError>
where
    T::Err: std::fmt::Display,
{
    Ok(parse_env_opt(name)?.unwrap_or(default))
}

/// Parse an optional environment variable.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidInput`] when the variable is set but does
/// not parse as `T`.
pub fn parse_env_opt<T: FromStr>(name: &str) -> Result<Option<T>, PlatformError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) if !val.trim().is_empty() => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PlatformError::invalid_input(format!("Invalid {name}: {e}"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_uses_default() {
        let value: u64 = parse_env("PROVIDER_COMMON_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_missing_optional_is_none() {
        let value: Option<bool> = parse_env_opt("PROVIDER_COMMON_TEST_UNSET_BOOL").unwrap();
        assert!(value.is_none());
    }
}
