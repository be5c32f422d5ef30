use std::{env, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads an environment variable, treating unset and blank values alike.
pub fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Reads and parses an environment variable. Returns `Some(Err(..))` with the raw value when parsing fails so that the
/// caller can decide how loudly to complain.
pub fn parse_env<T: FromStr>(name: &str) -> Option<Result<T, String>> {
    non_empty_env(name).map(|s| s.parse::<T>().map_err(|_| s))
}
