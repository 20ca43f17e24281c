//! Chart-ready series produced from a pivot

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Chart data specification
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ChartData {
    /// Labels for X axis or categories
    pub labels: Vec<String>,
    /// Data series
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// Sum of every value in every series
    pub fn total(&self) -> f64 {
        self.datasets.iter().flat_map(|d| d.data.iter()).sum()
    }

    /// Sum of all series at one label index
    pub fn label_total(&self, index: usize) -> f64 {
        self.datasets
            .iter()
            .filter_map(|d| d.data.get(index))
            .sum()
    }
}

/// A single data series
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Dataset {
    /// Series label
    pub label: String,
    /// Data values, aligned with `ChartData::labels`
    pub data: Vec<f64>,
    /// Series metadata for tooltips
    #[serde(default)]
    pub metadata: DatasetMetadata,
}

/// Per-series metadata
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    /// Key the series was built from
    pub series_key: String,
    /// Sum of the absolute values
    pub total: f64,
    /// Absolute values before percentage rescaling
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absolute: Vec<f64>,
}

/// Which pivot axis becomes the chart series
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum SeriesAxis {
    /// Labels are row keys, one dataset per column key
    #[default]
    Columns,
    /// Labels are column keys, one dataset per row key
    Rows,
}

/// Options for projecting a pivot into chart data
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ChartProjection {
    /// Axis that becomes datasets
    #[serde(default)]
    pub series_axis: SeriesAxis,
}
