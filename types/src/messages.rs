//! Message envelopes for host-to-engine communication

use serde::{Deserialize, Serialize};
use tsify::Tsify;

use crate::chart::{ChartData, ChartProjection};
use crate::data::{Row, Value};
use crate::format::FormatOptions;
use crate::pivot::{Bucket, ExtractedKeys, PivotSpec, PivotTable, SegmentSelection};

/// Unique identifier for message correlation
pub type MessageId = String;

/// Timestamp in milliseconds since Unix epoch
pub type Timestamp = u64;

/// Base message envelope for all requests
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Request<T> {
    /// Unique message ID for request/response matching
    pub id: MessageId,
    /// Request timestamp
    pub timestamp: Timestamp,
    /// Request payload
    pub payload: T,
}

impl<T> Request<T> {
    /// Wrap a payload with a fresh id and timestamp
    pub fn new(payload: T) -> Self {
        Self {
            id: generate_id(),
            timestamp: now(),
            payload,
        }
    }
}

/// Base message envelope for all responses
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Response<T> {
    /// Matches the request ID
    pub id: MessageId,
    /// Response timestamp
    pub timestamp: Timestamp,
    /// Execution time in milliseconds
    pub execution_time_ms: u32,
    /// Response result
    pub result: MessageResult<T>,
}

/// Result wrapper for all responses
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "status")]
pub enum MessageResult<T> {
    #[serde(rename = "ok")]
    Ok { data: T },
    #[serde(rename = "error")]
    Error { error: ErrorInfo },
}

/// Error information
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Standard error codes
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ErrorCode {
    /// Pivot spec is missing required fields
    InvalidSpec,
    /// Failed to parse a message
    ParseError,
    /// Unknown error
    Unknown,
}

impl<T> MessageResult<T> {
    /// Create a success result
    pub fn ok(data: T) -> Self {
        MessageResult::Ok { data }
    }

    /// Create an error result
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        MessageResult::Error {
            error: ErrorInfo {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    /// Check if result is ok
    pub fn is_ok(&self) -> bool {
        matches!(self, MessageResult::Ok { .. })
    }

    /// Check if result is error
    pub fn is_error(&self) -> bool {
        matches!(self, MessageResult::Error { .. })
    }
}

/// Request to aggregate rows into a pivot table
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AggregateRequest {
    /// Input rows
    pub rows: Vec<Row>,
    /// Pivot configuration
    pub spec: PivotSpec,
}

/// Request to build chart series
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ChartRequest {
    /// Input rows
    pub rows: Vec<Row>,
    /// Pivot configuration
    pub spec: PivotSpec,
    /// Projection options
    #[serde(default)]
    pub projection: ChartProjection,
}

/// Request to format values
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct FormatRequest {
    /// Raw values
    pub values: Vec<Value>,
    /// Formatting options
    #[serde(default)]
    pub options: FormatOptions,
}

/// Request to rank segments and fold the tail into "Other"
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct LimitSegmentsRequest {
    /// Input rows
    pub rows: Vec<Row>,
    /// Segment field
    pub segment_field: String,
    /// Metric field
    pub metric_field: String,
    /// Segments to keep
    pub max_segments: i64,
}

/// Request to bucket timestamps
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct BucketRequest {
    /// Raw timestamps
    pub values: Vec<Value>,
    /// Granularity name
    pub granularity: String,
    /// Use the five-band hour grouping
    #[serde(default)]
    pub alt_hour_groups: bool,
}

/// Request to list row and column keys
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ExtractKeysRequest {
    /// Input rows
    pub rows: Vec<Row>,
    /// Row key field
    pub row_key_field: String,
    /// Column key field
    pub column_key_field: String,
}

/// All engine request types
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "type")]
pub enum EngineRequest {
    #[serde(rename = "aggregate")]
    Aggregate(AggregateRequest),
    #[serde(rename = "chart")]
    Chart(ChartRequest),
    #[serde(rename = "format")]
    Format(FormatRequest),
    #[serde(rename = "limit_segments")]
    LimitSegments(LimitSegmentsRequest),
    #[serde(rename = "bucket")]
    Bucket(BucketRequest),
    #[serde(rename = "extract_keys")]
    ExtractKeys(ExtractKeysRequest),
}

/// All engine response types
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "type")]
pub enum EngineResponse {
    #[serde(rename = "aggregate")]
    Aggregate(PivotTable),
    #[serde(rename = "chart")]
    Chart(ChartData),
    #[serde(rename = "format")]
    Format { values: Vec<String> },
    #[serde(rename = "limit_segments")]
    LimitSegments(SegmentSelection),
    /// `None` marks a timestamp dropped by the bucketing rules
    #[serde(rename = "bucket")]
    Bucket { buckets: Vec<Option<Bucket>> },
    #[serde(rename = "extract_keys")]
    ExtractKeys(ExtractedKeys),
}

/// Generate a new message ID
pub fn generate_id() -> MessageId {
    format!("{:x}", now_nanos())
}

/// Get current timestamp
pub fn now() -> Timestamp {
    (now_nanos() / 1_000_000) as u64
}

#[cfg(target_arch = "wasm32")]
fn now_nanos() -> u128 {
    (js_sys::Date::now() * 1_000_000.0) as u128
}

#[cfg(not(target_arch = "wasm32"))]
fn now_nanos() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}
