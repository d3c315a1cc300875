//! Environment lookups for `SECURE_`-prefixed settings.

const PREFIX: &str = "SECURE_";

/// Read `SECURE_{key}`, falling back to the bare `{key}`
///
/// # Examples
///
/// ```rust
/// use secure_headers::utils::get_env_with_prefix;
///
/// // SECURE_HEADERS_OVERRIDES, then HEADERS_OVERRIDES
/// let overrides = get_env_with_prefix("HEADERS_OVERRIDES");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    [format!("{PREFIX}{key}"), key.to_string()]
        .into_iter()
        .find_map(|name| std::env::var(name).ok())
}

/// Boolean setting read through [`get_env_with_prefix`]
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case. Anything
/// else is logged and treated as unset.
pub fn env_flag(key: &str) -> Option<bool> {
    let raw = get_env_with_prefix(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring non-boolean environment value");
            None
        }
    }
}
