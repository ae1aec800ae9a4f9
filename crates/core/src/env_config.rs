//! Environment variable parsing with warn-level logging for invalid values.

/// Parse a configuration value read through `lookup`, falling back to `default`.
///
/// - If the key is not set: returns `default` silently (expected case).
/// - If the key is set but cannot be parsed: logs a warning and returns `default`.
pub fn parse_with_default<T, F>(lookup: &F, var: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid config value, using default"
                );
                default
            },
        },
        None => default,
    }
}

/// Reads a non-empty environment variable.
#[must_use]
pub fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
