//! Formatting helpers for the screens.

use chrono::{DateTime, Local, Utc};

/// Relative time like "5m ago", falling back to a date after a month.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>, date_format: &str) -> String {
    let secs = now.signed_duration_since(then).num_seconds();

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else if secs < 604_800 {
        format!("{}d ago", secs / 86_400)
    } else if secs < 2_629_800 {
        format!("{}w ago", secs / 604_800)
    } else {
        then.with_timezone(&Local).format(date_format).to_string()
    }
}

/// Human-readable size: "512 bytes", "1.5 KB", "2.0 MB".
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Shorten to at most `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Replace newlines and control characters with spaces.
pub fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}
