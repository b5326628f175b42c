use chrono::{DateTime, Local};

/// Local wall-clock time in the form sent with login and upload requests
pub fn local_time_string(now: DateTime<Local>) -> String {
    now.format("%H:%M:%S").to_string()
}

/// Name of the local UTC offset, e.g. "+02:00"
pub fn local_timezone(now: DateTime<Local>) -> String {
    now.format("%:z").to_string()
}

/// Format a countdown in seconds as a short label
pub fn format_countdown(seconds: u32) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    }
}
