//! Display helpers shared by the dashboard and receipts.

/// Renders a minute count the way the desk reads it: `1h 30m`, `45m`.
///
/// ```rust
/// use rcreyes_core::format::format_minutes;
///
/// assert_eq!(format_minutes(90), "1h 30m");
/// assert_eq!(format_minutes(45), "45m");
/// assert_eq!(format_minutes(120), "2h 0m");
/// ```
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, rest)
    } else {
        format!("{}m", rest)
    }
}
