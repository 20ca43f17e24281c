//! Time bucketing for column keys

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use pivot_types::{Bucket, Granularity, Value};

/// First hour kept by hour-based buckets
pub const BUSINESS_HOURS_START: u32 = 8;
/// Last hour kept by hour-based buckets (inclusive)
pub const BUSINESS_HOURS_END: u32 = 21;

/// Inclusive hour ranges for the default six bands
const HOUR_GROUPS: [(u32, u32); 6] = [(8, 10), (11, 12), (13, 14), (15, 16), (17, 18), (19, 21)];

/// Inclusive hour ranges for the alternate five bands
const ALT_HOUR_GROUPS: [(u32, u32); 5] = [(8, 10), (11, 13), (14, 15), (16, 18), (19, 21)];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp from a raw value.
///
/// Accepts ISO dates, ISO date-times with or without an offset (offsets are
/// normalized to UTC), and numbers as epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Text(s) => parse_timestamp_str(s.trim()),
        Value::Number(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    let local = s.strip_suffix('Z').unwrap_or(s);
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(local, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Bucket a raw column value.
///
/// Unrecognized granularities and unparsable timestamps pass the raw value
/// through as an opaque label with rank 0. `None` means the row is dropped.
pub fn bucket_value(value: &Value, granularity: &Granularity, alt_hour_groups: bool) -> Option<Bucket> {
    if !granularity.is_recognized() {
        return Some(pass_through(value));
    }
    match parse_timestamp(value) {
        Some(ts) => bucket(&ts, granularity, alt_hour_groups),
        None => Some(pass_through(value)),
    }
}

fn pass_through(value: &Value) -> Bucket {
    Bucket {
        key: value.to_key(),
        sort_rank: 0,
    }
}

/// Bucket a timestamp. `None` means the timestamp falls outside business hours.
pub fn bucket(ts: &NaiveDateTime, granularity: &Granularity, alt_hour_groups: bool) -> Option<Bucket> {
    let date = ts.date();
    let hour = ts.hour();
    let bucket = match granularity {
        Granularity::Hour => {
            if !in_business_hours(hour) {
                return None;
            }
            Bucket {
                key: hour.to_string(),
                sort_rank: i64::from(hour),
            }
        }
        Granularity::HourGroup => return hour_group(hour, alt_hour_groups),
        Granularity::Day => Bucket {
            key: date.format("%-d %b").to_string(),
            sort_rank: i64::from(date.num_days_from_ce()),
        },
        Granularity::Week => week_bucket(date),
        Granularity::Month => Bucket {
            key: date.format("%B").to_string(),
            sort_rank: i64::from(date.month()),
        },
        Granularity::Weekday => Bucket {
            key: date.format("%A").to_string(),
            sort_rank: i64::from(date.weekday().number_from_monday()),
        },
        Granularity::Total => {
            if !in_business_hours(hour) {
                return None;
            }
            Bucket {
                key: format!("{} {}", date.format("%Y-%m-%d"), hour),
                sort_rank: i64::from(date.num_days_from_ce()) * 24 + i64::from(hour),
            }
        }
        Granularity::Unrecognized(_) => Bucket {
            key: ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
            sort_rank: 0,
        },
    };
    Some(bucket)
}

fn in_business_hours(hour: u32) -> bool {
    (BUSINESS_HOURS_START..=BUSINESS_HOURS_END).contains(&hour)
}

fn hour_group(hour: u32, alt: bool) -> Option<Bucket> {
    let bands: &[(u32, u32)] = if alt { &ALT_HOUR_GROUPS } else { &HOUR_GROUPS };
    bands
        .iter()
        .position(|&(start, end)| (start..=end).contains(&hour))
        .map(|index| {
            let (start, end) = bands[index];
            Bucket {
                key: format!("{start}:00-{end}:59"),
                sort_rank: index as i64,
            }
        })
}

/// ISO week bucket.
///
/// The displayed Monday and Sunday are each shifted forward one day, matching
/// the labels dashboards already show.
// TODO: confirm with product whether the +1 day display shift is intended
fn week_bucket(date: NaiveDate) -> Bucket {
    let iso = date.iso_week();
    let back = u64::from(date.weekday().num_days_from_monday());
    let monday = date.checked_sub_days(Days::new(back)).unwrap_or(date);
    let start = monday.checked_add_days(Days::new(1)).unwrap_or(monday);
    let end = monday.checked_add_days(Days::new(7)).unwrap_or(monday);
    Bucket {
        key: format!(
            "Week {} ({} - {})",
            iso.week(),
            start.format("%-d %b"),
            end.format("%-d %b")
        ),
        sort_rank: i64::from(iso.year()) * 100 + i64::from(iso.week()),
    }
}
