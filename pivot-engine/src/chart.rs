//! Projection of aggregated cells into chart series

use pivot_types::{
    ChartData, ChartProjection, Dataset, DatasetMetadata, PercentageMode, PivotSpec, Row, SeriesAxis,
};

use crate::aggregate::{aggregate, validate_spec, AggregationResult};
use crate::error::Result;
use crate::percentage::to_percentage;

/// Build chart series from an aggregation.
///
/// Cells without a value render as `0`.
pub fn to_chart_data(result: &AggregationResult, projection: &ChartProjection) -> ChartData {
    let (labels, series) = match projection.series_axis {
        SeriesAxis::Columns => (result.row_keys(), result.column_keys()),
        SeriesAxis::Rows => (result.column_keys(), result.row_keys()),
    };

    let datasets = series
        .iter()
        .map(|series_key| {
            let data: Vec<f64> = labels
                .iter()
                .map(|label| {
                    let (row, column) = match projection.series_axis {
                        SeriesAxis::Columns => (label, series_key),
                        SeriesAxis::Rows => (series_key, label),
                    };
                    result.value(row, column).unwrap_or(0.0)
                })
                .collect();
            Dataset {
                label: series_key.clone(),
                metadata: DatasetMetadata {
                    series_key: series_key.clone(),
                    total: data.iter().sum(),
                    absolute: Vec::new(),
                },
                data,
            }
        })
        .collect();

    ChartData {
        labels: labels.to_vec(),
        datasets,
    }
}

/// Aggregate rows and project them into chart data, applying the spec's
/// percentage mode. Absolute values are kept in each dataset's metadata
/// when rescaled.
pub fn build_chart(rows: &[Row], spec: &PivotSpec, projection: &ChartProjection) -> Result<ChartData> {
    validate_spec(spec)?;
    let absolute = to_chart_data(&aggregate(rows, spec), projection);
    let mut chart = to_percentage(&absolute, spec.percentage_mode);
    if spec.percentage_mode != PercentageMode::None {
        for (dataset, original) in chart.datasets.iter_mut().zip(absolute.datasets) {
            dataset.metadata.absolute = original.data;
        }
    }
    Ok(chart)
}
