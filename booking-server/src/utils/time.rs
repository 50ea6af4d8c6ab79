//! 时间工具函数 — 业务时区转换
//!
//! 预约时间统一以 UTC Unix millis 存储；槽位网格、营业日边界等
//! "当地日" 概念在账户业务时区内计算。

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name, falling back to UTC on bad input.
pub fn parse_tz(name: &str) -> Tz {
    name.parse().unwrap_or_else(|_| {
        tracing::warn!(timezone = name, "Unknown timezone, falling back to UTC");
        chrono_tz::UTC
    })
}

/// Unix millis → business-local datetime
pub fn to_local(millis: i64, tz: Tz) -> DateTime<Tz> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .with_timezone(&tz)
}

/// Unix millis → business-local calendar date
pub fn local_date(millis: i64, tz: Tz) -> NaiveDate {
    to_local(millis, tz).date_naive()
}

/// 日期 + 当地分钟偏移 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_minute_to_millis(date: NaiveDate, minute_of_day: u32, tz: Tz) -> i64 {
    let naive = date
        .and_hms_opt(minute_of_day / 60, minute_of_day % 60, 0)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).expect("midnight always exists"));
    tz.from_local_datetime(&naive)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_minute_to_millis(date, 0, tz)
}

/// 日期结束 → 次日 00:00 的 Unix millis，调用方使用 `< end` 语义
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_minute_to_millis(next_day, 0, tz)
}

/// Parse an RFC 3339 timestamp into Unix millis.
pub fn parse_rfc3339_millis(value: &str) -> Result<i64, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| format!("Invalid timestamp '{}': {}", value, e))
}

/// Unix millis → RFC 3339 string (UTC)
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Human label for a slot start in the business timezone, e.g.
/// "Fri, Jun 12 - 14:30"
pub fn slot_label(millis: i64, tz: Tz) -> String {
    to_local(millis, tz).format("%a, %b %-d - %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tz_fallback() {
        assert_eq!(parse_tz("Europe/Madrid"), chrono_tz::Europe::Madrid);
        assert_eq!(parse_tz("Not/AZone"), chrono_tz::UTC);
    }

    #[test]
    fn test_day_bounds_utc() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 12).unwrap();
        let start = day_start_millis(date, chrono_tz::UTC);
        let end = day_end_millis(date, chrono_tz::UTC);
        assert_eq!(end - start, 86_400_000);
        assert_eq!(local_date(start, chrono_tz::UTC), date);
        assert_eq!(local_date(end - 1, chrono_tz::UTC), date);
    }

    #[test]
    fn test_date_minute_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 12).unwrap();
        let tz = chrono_tz::Europe::Madrid;
        let millis = date_minute_to_millis(date, 14 * 60 + 30, tz);
        let local = to_local(millis, tz);
        assert_eq!(local.date_naive(), date);
        assert_eq!(local.format("%H:%M").to_string(), "14:30");
    }

    #[test]
    fn test_rfc3339_roundtrip() {
        let millis = parse_rfc3339_millis("2026-06-12T14:30:00Z").unwrap();
        assert_eq!(millis_to_rfc3339(millis), "2026-06-12T14:30:00+00:00");
        assert!(parse_rfc3339_millis("not a date").is_err());
    }
}
