//! 日期工具模块
//!
//! 后端的日期字段都是字符串（`YYYY-MM-DD`、`HH:MM[:SS]` 或 ISO 8601），
//! 这里负责把它们解析为 chrono 的朴素日期/时间，并提供按日历日比较所需的键。
//! 所有解析都返回 Option，解析失败的条目由调用方排除。

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

pub const MONTH_NAMES_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// 周日开头
pub const DAY_NAMES_ES: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

const DAY_FORMAT: &str = "%Y-%m-%d";

// =========================================================
// 解析
// =========================================================

/// 取字符串的日历日部分
///
/// 只看前 10 个字符，时间和时区偏移一律忽略：
/// `2025-01-10T23:00:00-05:00` 属于 2025-01-10。
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, DAY_FORMAT).ok()
}

/// 解析 `HH:MM` 或 `HH:MM:SS[.fff]`
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// 解析日期时间，保留写入时的本地挂钟时间
///
/// 接受 `YYYY-MM-DD`（视为当日 00:00）、`YYYY-MM-DDTHH:MM[:SS]`、
/// 以空格分隔的同类格式，以及带偏移的 RFC 3339。
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if s.len() == 10 {
        return parse_day(s).and_then(|d| d.and_hms_opt(0, 0, 0));
    }
    None
}

/// 日历日比较键 `YYYY-MM-DD`
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// 字符串 -> 比较键；解析失败返回 None
pub fn normalize_day(s: &str) -> Option<String> {
    parse_day(s).map(day_key)
}

// =========================================================
// 月份运算
// =========================================================

/// (年, 月) 加减若干个月，月份取值 1..=12
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = shift_month(year, month, 1);
    match (first_of_month(year, month), first_of_month(ny, nm)) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 0,
    }
}

/// 界面显示用：`10/01/2025`
pub fn display_day(s: &str) -> String {
    match parse_day(s) {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => s.to_string(),
    }
}

/// 界面显示用：`Enero 2025`
pub fn month_title(year: i32, month: u32) -> String {
    let name = MONTH_NAMES_ES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("");
    format!("{} {}", name, year)
}

/// 当天是否为星期日（日历网格第一列）
pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday().num_days_from_sunday() == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_ignores_time_and_offset() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(parse_day("2025-01-10"), Some(expected));
        assert_eq!(parse_day("2025-01-10T23:00"), Some(expected));
        assert_eq!(parse_day("2025-01-10T23:00:00-05:00"), Some(expected));
        assert_eq!(parse_day(" 2025-01-10 08:15:00 "), Some(expected));
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("2025-13-01"), None);
        assert_eq!(parse_day("mañana"), None);
        assert_eq!(parse_day("10/01/2025"), None);
    }

    #[test]
    fn test_parse_time_both_forms() {
        assert_eq!(parse_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time("09:30:15"), NaiveTime::from_hms_opt(9, 30, 15));
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_parse_datetime_forms() {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2025-01-10T23:00"), Some(dt));
        assert_eq!(parse_datetime("2025-01-10T23:00:00"), Some(dt));
        assert_eq!(parse_datetime("2025-01-10T23:00:00-05:00"), Some(dt));
        assert_eq!(
            parse_datetime("2025-01-10"),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("nope"), None);
    }

    #[test]
    fn test_shift_month_wraps_years() {
        assert_eq!(shift_month(2025, 1, -1), (2024, 12));
        assert_eq!(shift_month(2024, 12, 1), (2025, 1));
        assert_eq!(shift_month(2025, 3, -14), (2024, 1));
        assert_eq!(shift_month(2025, 6, 0), (2025, 6));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 4), 30);
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(display_day("2025-01-10"), "10/01/2025");
        assert_eq!(display_day("sin fecha"), "sin fecha");
        assert_eq!(month_title(2025, 1), "Enero 2025");
    }
}
