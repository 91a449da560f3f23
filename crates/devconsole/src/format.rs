use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde_json::Value;

/// Date format of live viewer lines, e.g. `Oct-19 16:05`.
pub const CONSOLE_DATE_FORMAT: &str = "%b-%d %H:%M";

/// JSON with two-space indentation.
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn console_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(CONSOLE_DATE_FORMAT).to_string()
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

/// Long date and time, e.g. `October 19th, 2026 4:05 PM`.
pub fn long_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} {}, {} {}",
        at.format("%B"),
        ordinal(at.day()),
        at.year(),
        at.format("%-I:%M %p")
    )
}

/// Short date, e.g. `Oct 19, 2026`.
pub fn short_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%b %-d, %Y").to_string()
}

/// Chart tooltip format, e.g. `Oct 19, 2026 4:05 PM`.
pub fn chart_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%b %-d, %Y %-I:%M %p").to_string()
}

/// Distance between `at` and `now` in words, e.g. `about 2 hours`.
pub fn distance_in_words(at: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    const MINUTES_IN_DAY: i64 = 1440;
    const MINUTES_IN_MONTH: i64 = 43200;
    const MINUTES_IN_TWO_MONTHS: i64 = 86400;

    let seconds = (*now - *at).num_seconds().abs();
    let minutes = (seconds as f64 / 60.0).round() as i64;

    if minutes < 1 {
        return if seconds < 30 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        };
    }
    if minutes < 45 {
        return plural(minutes, "minute");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = (minutes as f64 / 60.0).round() as i64;
        return format!("about {}", plural(hours, "hour"));
    }
    if minutes < 2520 {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = (minutes as f64 / MINUTES_IN_DAY as f64).round() as i64;
        return plural(days, "day");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        let months = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
        return format!("about {}", plural(months, "month"));
    }

    let months = months_between(at, now);
    if months < 12 {
        let months = months.max(2);
        return plural(months, "month");
    }

    let years = months / 12;
    let remainder = months % 12;
    if remainder < 3 {
        format!("about {}", plural(years, "year"))
    } else if remainder < 9 {
        format!("over {}", plural(years, "year"))
    } else {
        format!("almost {}", plural(years + 1, "year"))
    }
}

fn months_between(a: &DateTime<Utc>, b: &DateTime<Utc>) -> i64 {
    let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
    let mut months = (later.year() - earlier.year()) as i64 * 12
        + later.month() as i64
        - earlier.month() as i64;
    if later.day() < earlier.day() {
        months -= 1;
    }
    months.max(0)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

pub fn truncate_message(msg: &str, max_len: usize) -> String {
    let first_line = msg.lines().next().unwrap_or("");
    let char_count = first_line.chars().count();
    if char_count <= max_len && !msg.contains('\n') {
        format!("{:<width$}", first_line, width = max_len)
    } else {
        let keep = max_len.saturating_sub(3).min(char_count);
        let truncated: String = first_line.chars().take(keep).collect();
        format!("{}...", truncated)
    }
}
