//! Display helpers for rendering a bookmark list.

use chrono::{DateTime, Utc};
use url::Url;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Hostname shown under a bookmark title, without a leading `www.`.
///
/// Falls back to the raw input when it does not parse.
pub fn display_host(url: &str) -> String {
    match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host.strip_prefix("www.").map(str::to_string).unwrap_or(host),
        None => url.to_string(),
    }
}

/// Coarse age of a bookmark: "just now", "5m ago", "3h ago", "2d ago",
/// then the UTC calendar date once it is a week old.
pub fn relative_time(created_at_ms: i64, now_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(created_at_ms);

    if elapsed < MINUTE_MS {
        return "just now".to_string();
    }
    if elapsed < HOUR_MS {
        return format!("{}m ago", elapsed / MINUTE_MS);
    }
    if elapsed < DAY_MS {
        return format!("{}h ago", elapsed / HOUR_MS);
    }
    if elapsed < WEEK_MS {
        return format!("{}d ago", elapsed / DAY_MS);
    }

    DateTime::<Utc>::from_timestamp_millis(created_at_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
