//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next write timestamp for a record last written at `previous`.
///
/// Never goes backwards, even if the wall clock does.
pub fn next_write_time(previous: i64) -> i64 {
    unix_millis_now().max(previous.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" Weeknight dinners ".to_string())),
            Some("Weeknight dinners".to_string())
        );
    }

    #[test]
    fn next_write_time_is_monotonic() {
        let far_future = unix_millis_now() + 60_000;
        assert_eq!(next_write_time(far_future), far_future + 1);
        assert!(next_write_time(0) > 0);
    }
}
