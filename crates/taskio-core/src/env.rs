//! Environment variable helpers used by `ServiceConfig::from_env`
//!
//! ```ignore
//! use taskio_core::env::{env_get, env_get_bool};
//!
//! let workers: usize = env_get("TASKIO_NUM_WORKERS", 4);
//! let debug = env_get_bool("TASKIO_DEBUG", false);
//! ```
//!
//! `parse_opt` and `parse_bool` hold the parsing rules on their own, for
//! callers that read values from somewhere other than the process
//! environment.

use std::str::FromStr;

/// Parse `key` as `T`, falling back to `default` when unset or unparsable
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Parse `key` as `T`, `None` when unset or unparsable
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    parse_opt(std::env::var(key).ok().as_deref())
}

/// Boolean flag: "1", "true", "yes", "on" (any case) are true, anything else
/// set is false, unset returns `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    parse_bool(std::env::var(key).ok().as_deref(), default)
}

/// Parse a trimmed value; `None` when absent or unparsable
#[inline]
pub fn parse_opt<T>(val: Option<&str>) -> Option<T>
where
    T: FromStr,
{
    val.and_then(|v| v.trim().parse().ok())
}

/// Flag rules of `env_get_bool` applied to an optional value
#[inline]
pub fn parse_bool(val: Option<&str>, default: bool) -> bool {
    match val {
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_returns_default() {
        let val: usize = env_get("__TASKIO_TEST_UNSET__", 42);
        assert_eq!(val, 42);
        assert!(env_get_bool("__TASKIO_TEST_UNSET__", true));
        assert!(env_get_opt::<u64>("__TASKIO_TEST_UNSET__").is_none());
    }

    #[test]
    fn test_parse_and_fallback() {
        assert_eq!(parse_opt::<usize>(Some(" 123 ")), Some(123));
        assert_eq!(parse_opt::<usize>(Some("many")), None);
        assert_eq!(parse_opt::<usize>(None), None);
    }

    #[test]
    fn test_bool_variants() {
        for truthy in ["1", "true", "YES", "on", " on "] {
            assert!(parse_bool(Some(truthy), false), "{}", truthy);
        }
        for falsy in ["0", "false", "garbage"] {
            assert!(!parse_bool(Some(falsy), true), "{}", falsy);
        }
        assert!(parse_bool(None, true));
        assert!(!parse_bool(None, false));
    }
}
