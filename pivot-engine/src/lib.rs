//! PivotEngine - tabular pivot and aggregation for dashboard widgets
//!
//! This crate turns flat query result rows into pivot tables and chart
//! series: key extraction, cell aggregation, time bucketing, segment
//! limiting, percentage rescaling and value formatting. It compiles to
//! WASM for the dashboard host and to a plain Rust library.

use wasm_bindgen::prelude::*;

pub mod aggregate;
pub mod bucket;
pub mod chart;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod keys;
pub mod percentage;
pub mod segments;

// Re-export types
pub use pivot_types::*;

pub use aggregate::{aggregate, validate_spec, AggregationResult, CellKey};
pub use bucket::{bucket, bucket_value, parse_timestamp};
pub use chart::{build_chart, to_chart_data};
pub use error::EngineError;
pub use format::{format_number, format_value};
pub use keys::extract_keys;
pub use percentage::to_percentage;
pub use segments::{limit_segment_totals, limit_segments};

/// Initialize the pivot engine
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(log::Level::Debug).ok();

    log::info!("PivotEngine initialized");
}

/// Handle a JSON-encoded request envelope and return a JSON response
#[wasm_bindgen(js_name = handleMessage)]
pub fn handle_message_js(message: &str) -> String {
    dispatch::handle_message(message)
}

/// Aggregate rows into a pivot table
#[wasm_bindgen(js_name = pivotTable)]
pub fn pivot_table(request: AggregateRequest) -> Result<PivotTable, JsError> {
    validate_spec(&request.spec)?;
    Ok(aggregate(&request.rows, &request.spec).into_table())
}

/// Aggregate rows into chart series
#[wasm_bindgen(js_name = chartData)]
pub fn chart_data(request: ChartRequest) -> Result<ChartData, JsError> {
    Ok(build_chart(&request.rows, &request.spec, &request.projection)?)
}

/// Format raw values for display
#[wasm_bindgen(js_name = formatValues)]
pub fn format_values(request: FormatRequest) -> Vec<String> {
    request
        .values
        .iter()
        .map(|v| format_value(v, &request.options))
        .collect()
}
