/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a UUID v4 string for use as reservation/event ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Minutes expressed as milliseconds.
pub const fn minutes_to_millis(minutes: i64) -> i64 {
    minutes * 60_000
}

/// Hours expressed as milliseconds.
pub const fn hours_to_millis(hours: i64) -> i64 {
    hours * 3_600_000
}

/// Days expressed as milliseconds.
pub const fn days_to_millis(days: i64) -> i64 {
    days * 86_400_000
}
