//! Pivot configuration and pivot-table output types

use std::fmt;

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Label of the synthetic bucket that collects excluded segments
pub const OTHER_SEGMENT: &str = "Other";

/// Pivot configuration sent by the host
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PivotSpec {
    /// Field whose values become row keys
    pub row_key_field: String,
    /// Field whose values become column keys
    pub column_key_field: String,
    /// Optional field nested under each row key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_key_field: Option<String>,
    /// Numeric field summed into cells
    pub metric_field: String,
    /// Time bucketing applied to the column key
    #[serde(default)]
    #[tsify(type = "string | null")]
    pub granularity: Option<Granularity>,
    /// Maximum number of column segments before folding into "Other"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_segments: Option<i64>,
    /// Percentage rescaling applied to chart output
    #[serde(default)]
    pub percentage_mode: PercentageMode,
    /// How repeated rows for the same cell combine
    #[serde(default)]
    pub accumulation: Accumulation,
    /// Keep (row, column) roll-ups across sub keys
    #[serde(default = "default_true")]
    pub aggregate_row_dimensions: bool,
    /// Use the five-band hour grouping instead of six
    #[serde(default)]
    pub alt_hour_groups: bool,
}

fn default_true() -> bool {
    true
}

impl PivotSpec {
    /// Create a spec with the required fields and defaults for the rest
    pub fn new(
        row_key_field: impl Into<String>,
        column_key_field: impl Into<String>,
        metric_field: impl Into<String>,
    ) -> Self {
        Self {
            row_key_field: row_key_field.into(),
            column_key_field: column_key_field.into(),
            sub_key_field: None,
            metric_field: metric_field.into(),
            granularity: None,
            max_segments: None,
            percentage_mode: PercentageMode::None,
            accumulation: Accumulation::Sum,
            aggregate_row_dimensions: true,
            alt_hour_groups: false,
        }
    }

    /// Set the sub key field
    pub fn with_sub_key(mut self, field: impl Into<String>) -> Self {
        self.sub_key_field = Some(field.into());
        self
    }

    /// Set the column granularity
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    /// Set the segment limit
    pub fn with_max_segments(mut self, max: i64) -> Self {
        self.max_segments = Some(max);
        self
    }

    /// Set the percentage mode
    pub fn with_percentage_mode(mut self, mode: PercentageMode) -> Self {
        self.percentage_mode = mode;
        self
    }

    /// Set the accumulation rule
    pub fn with_accumulation(mut self, accumulation: Accumulation) -> Self {
        self.accumulation = accumulation;
        self
    }
}

/// Time bucketing resolution
///
/// Serialized as a plain string. Unknown strings are kept so the engine can
/// fall back to pass-through labels instead of rejecting the spec.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Granularity {
    Hour,
    HourGroup,
    Day,
    Week,
    Month,
    Weekday,
    Total,
    /// Unrecognized value, treated as pass-through
    Unrecognized(String),
}

impl Granularity {
    /// Wire name of the granularity
    pub fn as_str(&self) -> &str {
        match self {
            Granularity::Hour => "hour",
            Granularity::HourGroup => "hour_group",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Weekday => "weekday",
            Granularity::Total => "total",
            Granularity::Unrecognized(s) => s,
        }
    }

    /// Whether this granularity buckets timestamps
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Granularity::Unrecognized(_))
    }
}

impl From<String> for Granularity {
    fn from(s: String) -> Self {
        match s.as_str() {
            "hour" => Granularity::Hour,
            "hour_group" => Granularity::HourGroup,
            "day" => Granularity::Day,
            "week" => Granularity::Week,
            "month" => Granularity::Month,
            "weekday" => Granularity::Weekday,
            "total" => Granularity::Total,
            _ => Granularity::Unrecognized(s),
        }
    }
}

impl From<Granularity> for String {
    fn from(g: Granularity) -> Self {
        g.as_str().to_string()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage rescaling mode
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum PercentageMode {
    /// Absolute values
    #[default]
    None,
    /// Percent of the total at each label
    PerLabel,
    /// Percent of the grand total
    Global,
}

/// How repeated rows for one cell combine
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum Accumulation {
    /// Add every value (stacked and grouped charts)
    #[default]
    Sum,
    /// Keep the last value seen (single time-series tables)
    Last,
}

/// Ordered row and column keys
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedKeys {
    /// Row keys in first-seen order
    pub row_keys: Vec<String>,
    /// Column keys in first-seen order
    pub column_keys: Vec<String>,
}

/// Pivot table ready for rendering
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct PivotTable {
    /// Row keys in display order
    pub row_keys: Vec<String>,
    /// Column keys in display order
    pub column_keys: Vec<String>,
    /// Cell values
    pub cells: Vec<TableCell>,
    /// Sub keys grouped under each row key
    #[serde(default)]
    pub sub_keys_by_row: Vec<SubKeyGroup>,
}

impl PivotTable {
    /// Look up a (row, column) roll-up value
    pub fn value(&self, row_key: &str, column_key: &str) -> Option<f64> {
        self.cells
            .iter()
            .find(|c| c.row_key == row_key && c.column_key == column_key && c.sub_key.is_none())
            .and_then(|c| c.value)
    }
}

/// A single table cell
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub row_key: String,
    pub column_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_key: Option<String>,
    /// `None` when the cell had rows but no numeric value
    pub value: Option<f64>,
}

/// Sub keys nested under one row key
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SubKeyGroup {
    pub row_key: String,
    pub sub_keys: Vec<String>,
}

/// A time bucket assigned to a timestamp
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Display label
    pub key: String,
    /// Ordering rank among buckets of the same granularity
    pub sort_rank: i64,
}

/// Segments kept after limiting
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSelection {
    /// Kept segments, with "Other" last when truncated
    pub segments: Vec<String>,
    /// Sum of the excluded segments
    pub other_total: f64,
    /// Whether any segment was folded into "Other"
    pub truncated: bool,
}

impl SegmentSelection {
    /// Label a segment value is displayed under
    pub fn label_for<'a>(&self, segment: &'a str) -> &'a str {
        if !self.truncated || self.segments.iter().any(|s| s == segment) {
            segment
        } else {
            OTHER_SEGMENT
        }
    }
}
