//! Canonical wall-clock helpers.
//!
//! "Today" is always evaluated in one configured UTC offset so that snapshot
//! folders, push records and the push window agree on the calendar date.

use chrono::{DateTime, FixedOffset, Utc};

pub const DEFAULT_UTC_OFFSET: &str = "+08:00";

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    s.parse::<FixedOffset>().ok()
}

pub fn now_in(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Day folder name, e.g. `2025-09-06`.
pub fn date_folder(now: &DateTime<FixedOffset>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Snapshot id for a crawl run, e.g. `08h05`. Zero-padded so lexical order is chronological.
pub fn snapshot_time_id(now: &DateTime<FixedOffset>) -> String {
    now.format("%Hh%M").to_string()
}

/// `first` alone when the title was only seen once, otherwise `[first ~ last]`.
pub fn format_time_display(first_time: &str, last_time: &str) -> String {
    if first_time.is_empty() {
        return String::new();
    }
    if last_time.is_empty() || first_time == last_time {
        first_time.to_string()
    } else {
        format!("[{first_time} ~ {last_time}]")
    }
}
