//! Locale-aware value formatting

use chrono::{NaiveDateTime, Timelike};
use pivot_types::{FormatKind, FormatOptions, Value};

use crate::bucket::parse_timestamp;

const ELLIPSIS: &str = "...";
const MAX_FRACTION_DIGITS: usize = 20;

/// Separators for one of the two supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberLocale {
    decimal_separator: char,
    thousands_separator: char,
}

const PERIOD_DECIMAL: NumberLocale = NumberLocale {
    decimal_separator: '.',
    thousands_separator: ',',
};

const COMMA_DECIMAL: NumberLocale = NumberLocale {
    decimal_separator: ',',
    thousands_separator: '.',
};

impl NumberLocale {
    fn select(use_alt_locale: bool) -> Self {
        if use_alt_locale {
            COMMA_DECIMAL
        } else {
            PERIOD_DECIMAL
        }
    }
}

/// Format a raw value for display.
///
/// Pure function of the value and options. Never fails: unparsable numbers
/// render as `NaN` and unparsable dates render as their raw text.
pub fn format_value(value: &Value, options: &FormatOptions) -> String {
    let body = match options.kind {
        FormatKind::Number => {
            format_number(display_number(value), options.dps, options.use_alt_locale)
        }
        FormatKind::Date => match parse_timestamp(value) {
            Some(ts) => format_date(&ts, options.use_alt_locale),
            None => value.to_key(),
        },
        FormatKind::Text => value.to_key(),
    };

    let body = match options.truncate {
        Some(len) => truncate(&body, len),
        None => body,
    };

    match &options.meta {
        Some(meta) => format!(
            "{}{}{}",
            meta.pretext.as_deref().unwrap_or_default(),
            body,
            meta.posttext.as_deref().unwrap_or_default()
        ),
        None => body,
    }
}

/// Numeric reading for display: booleans show as `1`/`0`, anything else
/// unparsable is `NaN`
fn display_number(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        other => other.as_f64().unwrap_or(f64::NAN),
    }
}

/// Format a number with grouping separators.
///
/// `dps >= 0` fixes the fraction digits; otherwise 0 to 2 digits are shown
/// with trailing zeros dropped.
pub fn format_number(value: f64, dps: Option<i32>, use_alt_locale: bool) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let (min_digits, max_digits) = match dps {
        Some(d) if d >= 0 => {
            let d = (d as usize).min(MAX_FRACTION_DIGITS);
            (d, d)
        }
        _ => (0, 2),
    };

    let fixed = format!("{:.*}", max_digits, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));

    let mut frac = frac_part.to_string();
    while frac.len() > min_digits && frac.ends_with('0') {
        frac.pop();
    }

    // Rounding can leave nothing but zeros; never show "-0"
    let is_zero = int_part.bytes().all(|b| b == b'0') && frac.bytes().all(|b| b == b'0');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    let locale = NumberLocale::select(use_alt_locale);
    let grouped = group_thousands(int_part, locale.thousands_separator);
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}{}{frac}", locale.decimal_separator)
    }
}

fn group_thousands(int_part: &str, sep: char) -> String {
    let len = int_part.len();
    if len <= 3 {
        return int_part.to_string();
    }

    let mut out = String::with_capacity(len + len / 3);
    let mut first_group = len % 3;
    if first_group == 0 {
        first_group = 3;
    }

    out.push_str(&int_part[..first_group]);
    let mut idx = first_group;
    while idx < len {
        out.push(sep);
        out.push_str(&int_part[idx..idx + 3]);
        idx += 3;
    }

    out
}

/// Midnight timestamps are dates; everything else is a date-time
pub fn format_date(ts: &NaiveDateTime, use_alt_locale: bool) -> String {
    let date_only = ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0;
    let pattern = match (use_alt_locale, date_only) {
        (false, true) => "%-m/%-d/%Y",
        (false, false) => "%-m/%-d/%Y, %-I:%M:%S %p",
        (true, true) => "%-d.%-m.%Y",
        (true, false) => "%-d.%-m.%Y, %H:%M:%S",
    };
    ts.format(pattern).to_string()
}

/// Cut `s` to `len` characters and append an ellipsis when it is longer
pub fn truncate(s: &str, len: usize) -> String {
    match s.char_indices().nth(len) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &s[..cut]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_fraction_digits() {
        assert_eq!(format_number(1234.5, None, false), "1,234.5");
        assert_eq!(format_number(1234.567, None, false), "1,234.57");
        assert_eq!(format_number(1000000.0, None, false), "1,000,000");
        assert_eq!(format_number(0.1, Some(-1), false), "0.1");
    }

    #[test]
    fn fixed_fraction_digits() {
        assert_eq!(format_number(2.0, Some(2), false), "2.00");
        assert_eq!(format_number(2.456, Some(0), false), "2");
        assert_eq!(format_number(-1234.5, Some(1), false), "-1,234.5");
    }

    #[test]
    fn alternate_locale_swaps_separators() {
        assert_eq!(format_number(1234567.891, None, true), "1.234.567,89");
        assert_eq!(format_number(12.5, Some(2), true), "12,50");
    }

    #[test]
    fn negative_zero_has_no_sign() {
        assert_eq!(format_number(-0.001, None, false), "0");
        assert_eq!(format_number(-0.0, Some(2), false), "0.00");
    }

    #[test]
    fn unparsable_number_is_nan() {
        let out = format_value(&Value::from("abc"), &FormatOptions::number());
        assert_eq!(out, "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY, None, false), "-∞");
    }

    #[test]
    fn booleans_format_as_one_and_zero() {
        assert_eq!(format_value(&Value::Bool(true), &FormatOptions::number()), "1");
        assert_eq!(format_value(&Value::Bool(false), &FormatOptions::number().with_dps(1)), "0.0");
        assert_eq!(format_value(&Value::Bool(true), &FormatOptions::default()), "true");
    }

    #[test]
    fn number_from_text() {
        let out = format_value(&Value::from("9876.5"), &FormatOptions::number().with_dps(2));
        assert_eq!(out, "9,876.50");
    }

    #[test]
    fn midnight_formats_as_date() {
        let opts = FormatOptions::date();
        assert_eq!(format_value(&Value::from("2024-01-15T00:00:00.000"), &opts), "1/15/2024");
        assert_eq!(format_value(&Value::from("2024-01-15"), &opts), "1/15/2024");
        assert_eq!(
            format_value(&Value::from("2024-01-15T14:05:09.000"), &opts),
            "1/15/2024, 2:05:09 PM"
        );
    }

    #[test]
    fn alternate_locale_dates() {
        let opts = FormatOptions::date().with_alt_locale(true);
        assert_eq!(format_value(&Value::from("2024-01-15"), &opts), "15.1.2024");
        assert_eq!(
            format_value(&Value::from("2024-01-15T08:30:00"), &opts),
            "15.1.2024, 08:30:00"
        );
    }

    #[test]
    fn unparsable_date_is_passed_through() {
        let out = format_value(&Value::from("soon"), &FormatOptions::date());
        assert_eq!(out, "soon");
    }

    #[test]
    fn truncation_keeps_wrapper() {
        let opts = FormatOptions::default()
            .with_truncate(5)
            .with_wrapper("[", "]");
        assert_eq!(format_value(&Value::from("Dashboard"), &opts), "[Dashb...]");
        assert_eq!(format_value(&Value::from("Dash"), &opts), "[Dash]");
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate("ééééé", 2), "éé...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
