//! Time-series data for the API and webhook charts.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::resources::{ApiRequestLog, WebhookRequestLog};

/// Below this many records every record is plotted as its own point.
pub const SPARSE_THRESHOLD: usize = 10;

/// Below this many records the timing chart shows point markers.
pub const TIMING_POINTS_THRESHOLD: usize = 50;

/// Days of history covered by the charts.
pub const CHART_WINDOW_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: DateTime<Utc>,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<Point>,
    pub show_points: bool,
}

impl Series {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.y).sum()
    }
}

/// Records that can be placed on a time axis.
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for ApiRequestLog {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Timestamped for WebhookRequestLog {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Start of the wall clock hour of `at` in `tz`.
fn truncate_to_hour<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    at.with_timezone(tz)
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(at)
}

/// Counts of the matching records over time.
///
/// Sparse inputs yield one point of value 1 per record; otherwise records
/// are counted per local hour, in ascending order.
pub fn time_series<R, F>(records: &[R], filter: F) -> Vec<Point>
where
    R: Timestamped,
    F: Fn(&R) -> bool,
{
    time_series_in(records, filter, &Local)
}

/// [`time_series`] with hours taken in `tz`.
pub fn time_series_in<R, F, Tz>(records: &[R], filter: F, tz: &Tz) -> Vec<Point>
where
    R: Timestamped,
    F: Fn(&R) -> bool,
    Tz: TimeZone,
{
    let stamps: Vec<DateTime<Utc>> = records
        .iter()
        .filter(|r| filter(*r))
        .filter_map(|r| r.timestamp())
        .collect();

    if stamps.len() < SPARSE_THRESHOLD {
        return stamps.into_iter().map(|x| Point { x, y: 1.0 }).collect();
    }

    let mut grouped: BTreeMap<DateTime<Utc>, u64> = BTreeMap::new();
    for stamp in stamps {
        *grouped.entry(truncate_to_hour(stamp, tz)).or_insert(0) += 1;
    }

    grouped
        .into_iter()
        .map(|(x, count)| Point { x, y: count as f64 })
        .collect()
}

fn parse_status(code: Option<&str>) -> Option<u16> {
    code.and_then(|c| c.trim().parse::<u16>().ok())
}

fn is_success(code: Option<&str>) -> bool {
    matches!(parse_status(code), Some(200..=299))
}

fn is_error(code: Option<&str>) -> bool {
    matches!(parse_status(code), Some(400..))
}

/// Successful versus failed API requests.
pub fn api_request_series(logs: &[ApiRequestLog]) -> Vec<Series> {
    let show_points = logs.len() < SPARSE_THRESHOLD;
    vec![
        Series {
            label: "Success".to_string(),
            points: time_series(logs, |l| is_success(l.status_code.as_deref())),
            show_points,
        },
        Series {
            label: "Errors".to_string(),
            points: time_series(logs, |l| is_error(l.status_code.as_deref())),
            show_points,
        },
    ]
}

/// Failed POST, PUT and DELETE requests.
pub fn error_distribution_series(logs: &[ApiRequestLog]) -> Vec<Series> {
    let failed: Vec<ApiRequestLog> = logs
        .iter()
        .filter(|l| parse_status(l.status_code.as_deref()) != Some(200))
        .cloned()
        .collect();

    ["POST", "PUT", "DELETE"]
        .into_iter()
        .map(|method| Series {
            label: format!("{} Errors", method),
            points: time_series(&failed, |l| {
                l.method
                    .as_deref()
                    .is_some_and(|m| m.eq_ignore_ascii_case(method))
            }),
            show_points: false,
        })
        .collect()
}

/// Successful versus failed webhook deliveries.
pub fn webhook_request_series(logs: &[WebhookRequestLog]) -> Vec<Series> {
    vec![
        Series {
            label: "Success".to_string(),
            points: time_series(logs, |l| is_success(l.status_code.as_deref())),
            show_points: false,
        },
        Series {
            label: "Errors".to_string(),
            points: time_series(logs, |l| is_error(l.status_code.as_deref())),
            show_points: false,
        },
    ]
}

/// Webhook response times in milliseconds.
pub fn webhook_timing_series(logs: &[WebhookRequestLog]) -> Series {
    let points = logs
        .iter()
        .filter_map(|l| {
            l.created_at.map(|x| Point {
                x,
                y: l.duration.unwrap_or(0.0) * 1000.0,
            })
        })
        .collect();

    Series {
        label: "Duration (ms)".to_string(),
        points,
        show_points: logs.len() < TIMING_POINTS_THRESHOLD,
    }
}

/// Start of the chart window: local midnight seven days before `now`.
pub fn chart_window_start(now: DateTime<Local>) -> DateTime<Utc> {
    let day = now
        .date_naive()
        .checked_sub_days(Days::new(CHART_WINDOW_DAYS))
        .unwrap_or(now.date_naive());
    let midnight = day.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

/// Axis tick label: two decimals below 10, whole numbers above.
pub fn axis_label(value: f64) -> String {
    if value < 10.0 {
        format!("{:.2}", value)
    } else {
        format!("{}", value.round() as i64)
    }
}

/// Tooltip value: three decimals below 10, whole numbers above.
pub fn tooltip_value(value: f64) -> String {
    if value < 10.0 {
        format!("{:.3}", value)
    } else {
        format!("{}", value.round() as i64)
    }
}
