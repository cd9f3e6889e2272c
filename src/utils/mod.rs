pub mod logging;

pub use logging::LoggingConfig;

/// Timestamp-derived identifier with a short prefix, e.g. `run-1712345678-42`.
pub fn generate_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}-{}-{}", prefix, now.as_secs(), now.subsec_nanos())
}

/// Clips a string to `max_len` characters, appending `...` when clipped.
pub fn truncate(input: &str, max_len: usize) -> String {
    if input.chars().count() <= max_len {
        return input.to_string();
    }
    let clipped: String = input.chars().take(max_len).collect();
    format!("{}...", clipped)
}
