//! Database query modules.

pub mod auth;
pub mod users;
pub mod videos;

/// Current time as an RFC 3339 UTC string with second precision.
///
/// All timestamp columns use this format so lexicographic comparison in SQL
/// matches chronological order.
pub fn now_timestamp() -> String {
    timestamp(chrono::Utc::now())
}

/// Format a UTC instant the same way as [`now_timestamp`].
pub fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
