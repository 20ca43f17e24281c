//! Aggregation map builder: folds flat rows into pivot cells

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use pivot_types::{
    field, Accumulation, PivotSpec, PivotTable, Row, SegmentSelection, SubKeyGroup, TableCell,
};

use crate::bucket::bucket_value;
use crate::error::{EngineError, Result};
use crate::segments::limit_segment_totals;

/// Structural key of a pivot cell.
///
/// `sub == None` addresses the (row, column) roll-up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row: String,
    pub column: String,
    pub sub: Option<String>,
}

impl CellKey {
    pub fn new(row: &str, column: &str, sub: Option<&str>) -> Self {
        Self {
            row: row.to_string(),
            column: column.to_string(),
            sub: sub.map(str::to_string),
        }
    }
}

/// Result of aggregating one row list against one spec
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    row_keys: Vec<String>,
    column_keys: Vec<String>,
    cells: HashMap<CellKey, f64>,
    touched: HashSet<CellKey>,
    sub_keys_by_row: IndexMap<String, IndexSet<String>>,
    segments: Option<SegmentSelection>,
}

impl AggregationResult {
    /// Row keys in first-seen order
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// Column keys in display order
    pub fn column_keys(&self) -> &[String] {
        &self.column_keys
    }

    /// Roll-up value of a (row, column) cell.
    ///
    /// `None` if no row reached the cell or none of its metrics were numeric.
    pub fn cell(&self, row: &str, column: &str) -> Option<f64> {
        self.cells.get(&CellKey::new(row, column, None)).copied()
    }

    /// Value of a (row, column, sub) cell
    pub fn sub_cell(&self, row: &str, column: &str, sub: &str) -> Option<f64> {
        self.cells.get(&CellKey::new(row, column, Some(sub))).copied()
    }

    /// Whether any input row landed in the (row, column) cell
    pub fn is_touched(&self, row: &str, column: &str) -> bool {
        self.touched.contains(&CellKey::new(row, column, None))
    }

    /// Roll-up value, falling back to the sum of sub cells when roll-ups
    /// are not kept
    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        self.cell(row, column).or_else(|| {
            let values: Vec<f64> = self
                .sub_keys(row)
                .filter_map(|sub| self.sub_cell(row, column, sub))
                .collect();
            (!values.is_empty()).then(|| values.iter().sum())
        })
    }

    /// Sub keys seen under a row key, in first-seen order
    pub fn sub_keys(&self, row: &str) -> impl Iterator<Item = &str> + '_ {
        self.sub_keys_by_row
            .get(row)
            .into_iter()
            .flat_map(|subs| subs.iter().map(String::as_str))
    }

    /// All cells with a numeric value
    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, f64)> {
        self.cells.iter().map(|(k, v)| (k, *v))
    }

    /// Segment selection applied to the columns, if limiting was configured
    pub fn segments(&self) -> Option<&SegmentSelection> {
        self.segments.as_ref()
    }

    /// Sum of all roll-up cells
    pub fn total(&self) -> f64 {
        self.cells
            .iter()
            .filter(|(k, _)| k.sub.is_none())
            .map(|(_, v)| v)
            .sum()
    }

    /// Project into a serializable pivot table.
    ///
    /// Cells are listed per row key: roll-ups first, then each sub key, each
    /// in column order. Cells that received rows but no numeric value are
    /// listed with `value: None`.
    pub fn into_table(self) -> PivotTable {
        let mut cells = Vec::new();
        for row in self.row_keys.iter() {
            let subs = std::iter::once(None).chain(self.sub_keys(row).map(Some));
            for sub in subs {
                for column in &self.column_keys {
                    let key = CellKey::new(row, column, sub);
                    if self.touched.contains(&key) {
                        cells.push(TableCell {
                            row_key: key.row.clone(),
                            column_key: key.column.clone(),
                            sub_key: key.sub.clone(),
                            value: self.cells.get(&key).copied(),
                        });
                    }
                }
            }
        }

        let sub_keys_by_row = self
            .sub_keys_by_row
            .into_iter()
            .map(|(row_key, subs)| SubKeyGroup {
                row_key,
                sub_keys: subs.into_iter().collect(),
            })
            .collect();

        PivotTable {
            row_keys: self.row_keys,
            column_keys: self.column_keys,
            cells,
            sub_keys_by_row,
        }
    }
}

/// Reject specs whose required field names are empty
pub fn validate_spec(spec: &PivotSpec) -> Result<()> {
    let required = [
        ("rowKeyField", &spec.row_key_field),
        ("columnKeyField", &spec.column_key_field),
        ("metricField", &spec.metric_field),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            log::warn!("rejecting pivot spec: {name} is empty");
            return Err(EngineError::InvalidSpec(format!("{name} must not be empty")));
        }
    }
    if spec.sub_key_field.as_deref().is_some_and(|f| f.trim().is_empty()) {
        return Err(EngineError::InvalidSpec("subKeyField must not be empty when set".into()));
    }
    Ok(())
}

/// Fold rows into an [`AggregationResult`].
///
/// Never fails on bad data: unparsable metrics mark their cell as touched
/// without contributing a value, and null keys group under `"null"`.
pub fn aggregate(rows: &[Row], spec: &PivotSpec) -> AggregationResult {
    log::debug!(
        "aggregating {} rows: rows={} columns={} metric={} granularity={:?}",
        rows.len(),
        spec.row_key_field,
        spec.column_key_field,
        spec.metric_field,
        spec.granularity
    );

    let mut result = AggregationResult::default();
    let mut row_keys: IndexSet<String> = IndexSet::new();
    // column key -> (sort rank, metric total)
    let mut columns: IndexMap<String, (i64, f64)> = IndexMap::new();
    let mut dropped = 0usize;

    for row in rows {
        let raw_column = field(row, &spec.column_key_field);
        let (column, rank) = match &spec.granularity {
            Some(granularity) => {
                match bucket_value(raw_column, granularity, spec.alt_hour_groups) {
                    Some(bucket) => (bucket.key, bucket.sort_rank),
                    None => {
                        log::trace!("dropping row outside business hours: {raw_column}");
                        dropped += 1;
                        continue;
                    }
                }
            }
            None => (raw_column.to_key(), 0),
        };

        let row_key = field(row, &spec.row_key_field).to_key();
        let sub_key = spec
            .sub_key_field
            .as_deref()
            .map(|f| field(row, f).to_key());
        let metric = field(row, &spec.metric_field).as_f64();

        row_keys.insert(row_key.clone());
        columns.entry(column.clone()).or_insert((rank, 0.0)).1 += metric.unwrap_or(0.0);

        if let Some(sub) = &sub_key {
            result
                .sub_keys_by_row
                .entry(row_key.clone())
                .or_default()
                .insert(sub.clone());
        }

        if sub_key.is_none() || spec.aggregate_row_dimensions {
            result.accumulate(CellKey::new(&row_key, &column, None), metric, spec.accumulation);
        }
        if let Some(sub) = sub_key.as_deref() {
            result.accumulate(CellKey::new(&row_key, &column, Some(sub)), metric, spec.accumulation);
        }
    }

    result.row_keys = row_keys.into_iter().collect();

    let mut ordered: Vec<(String, (i64, f64))> = columns.into_iter().collect();
    if spec.granularity.as_ref().is_some_and(|g| g.is_recognized()) {
        ordered.sort_by_key(|(_, (rank, _))| *rank);
    }
    result.column_keys = ordered.iter().map(|(name, _)| name.clone()).collect();

    if let Some(max_segments) = spec.max_segments {
        let totals: Vec<(String, f64)> = ordered
            .into_iter()
            .map(|(name, (_, total))| (name, total))
            .collect();
        let selection = limit_segment_totals(&totals, max_segments);
        if selection.truncated {
            result.fold_excluded_columns(&selection);
        }
        result.segments = Some(selection);
    }

    log::debug!(
        "aggregated into {} rows x {} columns ({} cells, {} rows dropped)",
        result.row_keys.len(),
        result.column_keys.len(),
        result.cells.len(),
        dropped
    );
    result
}

impl AggregationResult {
    fn accumulate(&mut self, key: CellKey, metric: Option<f64>, accumulation: Accumulation) {
        if let Some(value) = metric {
            match accumulation {
                Accumulation::Sum => *self.cells.entry(key.clone()).or_insert(0.0) += value,
                Accumulation::Last => {
                    self.cells.insert(key.clone(), value);
                }
            }
        }
        self.touched.insert(key);
    }

    /// Move cells of excluded columns into the "Other" column
    fn fold_excluded_columns(&mut self, selection: &SegmentSelection) {
        let relabel = |key: CellKey| CellKey {
            column: selection.label_for(&key.column).to_string(),
            ..key
        };

        let mut cells = HashMap::with_capacity(self.cells.len());
        for (key, value) in self.cells.drain() {
            *cells.entry(relabel(key)).or_insert(0.0) += value;
        }
        self.cells = cells;
        self.touched = self.touched.drain().map(relabel).collect();
        self.column_keys = selection.segments.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::to_chart_data;
    use pivot_types::{ChartProjection, Granularity, Value};
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn sales(store: &str, date: &str, units: Value) -> Row {
        row(&[("store", store.into()), ("date", date.into()), ("units", units)])
    }

    #[test]
    fn validates_required_fields() {
        assert!(validate_spec(&PivotSpec::new("store", "date", "units")).is_ok());
        let err = validate_spec(&PivotSpec::new("store", " ", "units")).unwrap_err();
        assert_eq!(err.to_string(), "invalid pivot spec: columnKeyField must not be empty");
        assert!(validate_spec(&PivotSpec::new("a", "b", "c").with_sub_key("")).is_err());
    }

    #[test]
    fn sums_duplicate_cells() {
        let rows = vec![
            sales("A", "2024-01-01", 5.0.into()),
            sales("A", "2024-01-01", 3.0.into()),
            sales("B", "2024-01-01", 2.0.into()),
        ];
        let result = aggregate(&rows, &PivotSpec::new("store", "date", "units"));
        assert_eq!(result.row_keys(), ["A", "B"]);
        assert_eq!(result.column_keys(), ["2024-01-01"]);
        assert_eq!(result.cell("A", "2024-01-01"), Some(8.0));
        assert_eq!(result.cell("B", "2024-01-01"), Some(2.0));
        assert_eq!(result.total(), 10.0);
    }

    #[test]
    fn last_value_accumulation_overwrites() {
        let rows = vec![
            sales("A", "d1", 5.0.into()),
            sales("A", "d1", 3.0.into()),
            sales("A", "d1", Value::Null),
        ];
        let spec = PivotSpec::new("store", "date", "units").with_accumulation(Accumulation::Last);
        assert_eq!(aggregate(&rows, &spec).cell("A", "d1"), Some(3.0));
    }

    #[test]
    fn all_null_metrics_leave_touched_but_absent_cell() {
        let rows = vec![
            sales("A", "d1", Value::Null),
            sales("A", "d1", "n/a".into()),
            sales("A", "d2", "4".into()),
            sales("A", "d2", Value::Null),
        ];
        let result = aggregate(&rows, &PivotSpec::new("store", "date", "units"));
        assert!(result.is_touched("A", "d1"));
        assert_eq!(result.cell("A", "d1"), None);
        assert_eq!(result.cell("A", "d2"), Some(4.0));
        assert!(!result.is_touched("B", "d1"));

        let table = result.into_table();
        assert_eq!(table.cells.len(), 2);
        assert_eq!(table.cells[0].value, None);
        assert_eq!(table.value("A", "d2"), Some(4.0));
    }

    #[test]
    fn keys_containing_delimiters_do_not_collide() {
        let rows = vec![
            sales("a-b", "c", 1.0.into()),
            sales("a", "b-c", 2.0.into()),
        ];
        let result = aggregate(&rows, &PivotSpec::new("store", "date", "units"));
        assert_eq!(result.cell("a-b", "c"), Some(1.0));
        assert_eq!(result.cell("a", "b-c"), Some(2.0));
    }

    #[test]
    fn sub_keys_group_under_rows() {
        let rows = vec![
            row(&[("store", "A".into()), ("day", "Mon".into()), ("ip", "10.0.0.2".into()), ("n", 1.0.into())]),
            row(&[("store", "A".into()), ("day", "Mon".into()), ("ip", "10.0.0.1".into()), ("n", 2.0.into())]),
            row(&[("store", "A".into()), ("day", "Tue".into()), ("ip", "10.0.0.2".into()), ("n", 4.0.into())]),
        ];
        let spec = PivotSpec::new("store", "day", "n").with_sub_key("ip");
        let result = aggregate(&rows, &spec);
        assert_eq!(result.sub_keys("A").collect::<Vec<_>>(), ["10.0.0.2", "10.0.0.1"]);
        assert_eq!(result.sub_keys("B").count(), 0);
        assert_eq!(result.cell("A", "Mon"), Some(3.0));
        assert_eq!(result.sub_cell("A", "Mon", "10.0.0.1"), Some(2.0));
        assert_eq!(result.sub_cell("A", "Tue", "10.0.0.2"), Some(4.0));

        let table = result.into_table();
        assert_eq!(table.sub_keys_by_row.len(), 1);
        assert_eq!(table.sub_keys_by_row[0].sub_keys, vec!["10.0.0.2", "10.0.0.1"]);
        // 2 roll-ups + 2 cells for the first ip + 1 for the second
        assert_eq!(table.cells.len(), 5);
        assert_eq!(table.cells[0].sub_key, None);
    }

    #[test]
    fn boolean_metrics_are_not_numeric() {
        let rows = vec![sales("A", "d1", true.into()), sales("A", "d1", false.into())];
        let result = aggregate(&rows, &PivotSpec::new("store", "date", "units"));
        assert!(result.is_touched("A", "d1"));
        assert_eq!(result.cell("A", "d1"), None);
        assert_eq!(result.total(), 0.0);
    }

    #[test]
    fn row_dimension_rollups_can_be_disabled() {
        let rows = vec![
            row(&[("store", "A".into()), ("day", "Mon".into()), ("ip", "x".into()), ("n", 1.0.into())]),
            row(&[("store", "A".into()), ("day", "Mon".into()), ("ip", "y".into()), ("n", 2.0.into())]),
        ];
        let mut spec = PivotSpec::new("store", "day", "n").with_sub_key("ip");
        spec.aggregate_row_dimensions = false;
        let result = aggregate(&rows, &spec);
        assert_eq!(result.cell("A", "Mon"), None);
        assert_eq!(result.value("A", "Mon"), Some(3.0));
        assert!(result.into_table().cells.iter().all(|c| c.sub_key.is_some()));
    }

    #[test]
    fn granularity_buckets_and_sorts_columns() {
        let rows = vec![
            sales("A", "2024-01-03T09:00:00", 1.0.into()),
            sales("A", "2024-01-01T10:00:00", 2.0.into()),
            sales("A", "2024-01-01T07:00:00", 100.0.into()),
            sales("A", "2024-01-02T23:00:00", 100.0.into()),
        ];
        let spec = PivotSpec::new("store", "date", "units").with_granularity(Granularity::Hour);
        let result = aggregate(&rows, &spec);
        assert_eq!(result.column_keys(), ["9", "10"]);
        assert_eq!(result.total(), 3.0);

        let spec = PivotSpec::new("store", "date", "units").with_granularity(Granularity::Day);
        let result = aggregate(&rows, &spec);
        assert_eq!(result.column_keys(), ["1 Jan", "2 Jan", "3 Jan"]);
        assert_eq!(result.cell("A", "1 Jan"), Some(102.0));
    }

    #[test]
    fn unrecognized_granularity_keeps_first_seen_columns() {
        let rows = vec![sales("A", "b", 1.0.into()), sales("A", "a", 1.0.into())];
        let spec = PivotSpec::new("store", "date", "units")
            .with_granularity(Granularity::Unrecognized("decade".into()));
        assert_eq!(aggregate(&rows, &spec).column_keys(), ["b", "a"]);
    }

    #[test]
    fn max_segments_folds_columns_into_other() {
        let rows = vec![
            sales("A", "Z", 1.0.into()),
            sales("A", "X", 10.0.into()),
            sales("B", "Y", 5.0.into()),
            sales("B", "W", 0.5.into()),
        ];
        let spec = PivotSpec::new("store", "date", "units").with_max_segments(2);
        let result = aggregate(&rows, &spec);
        assert_eq!(result.column_keys(), ["X", "Y", "Other"]);
        assert_eq!(result.cell("A", "Other"), Some(1.0));
        assert_eq!(result.cell("B", "Other"), Some(0.5));
        assert_eq!(result.cell("A", "Z"), None);
        assert_eq!(result.segments().map(|s| s.other_total), Some(1.5));
        assert_eq!(result.total(), 16.5);
    }

    #[test]
    fn real_other_category_merges_with_folded_columns() {
        let rows = vec![
            sales("A", "X", 10.0.into()),
            sales("A", "Other", 9.0.into()),
            sales("A", "Z", 1.0.into()),
        ];
        let spec = PivotSpec::new("store", "date", "units").with_max_segments(2);
        let result = aggregate(&rows, &spec);
        assert_eq!(result.column_keys(), ["X", "Z", "Other"]);
        assert_eq!(result.cell("A", "Other"), Some(9.0));
        assert_eq!(result.segments().map(|s| s.other_total), Some(9.0));
        assert_eq!(result.total(), 20.0);

        let chart = to_chart_data(&result, &ChartProjection::default());
        let labels: Vec<&str> = chart.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["X", "Z", "Other"]);
        let total: f64 = chart.datasets.iter().map(|d| d.metadata.total).sum();
        assert_eq!(total, 20.0);

        let table = result.into_table();
        assert_eq!(table.column_keys, vec!["X", "Z", "Other"]);
        assert_eq!(table.cells.len(), 3);
    }

    fn hits(store: &str, site: &str, ip: &str, n: f64) -> Row {
        row(&[("store", store.into()), ("site", site.into()), ("ip", ip.into()), ("n", n.into())])
    }

    #[test]
    fn max_segments_relabels_sub_cells() {
        let rows = vec![
            hits("A", "big", "x", 10.0),
            hits("A", "small", "x", 1.0),
            hits("A", "tiny", "y", 2.0),
        ];
        let spec = PivotSpec::new("store", "site", "n")
            .with_sub_key("ip")
            .with_max_segments(1);
        let result = aggregate(&rows, &spec);
        assert_eq!(result.column_keys(), ["big", "Other"]);
        assert_eq!(result.cell("A", "Other"), Some(3.0));
        assert_eq!(result.sub_cell("A", "Other", "x"), Some(1.0));
        assert_eq!(result.sub_cell("A", "Other", "y"), Some(2.0));
        assert_eq!(result.sub_cell("A", "small", "x"), None);
        assert!(result.cells().all(|(key, _)| key.column == "big" || key.column == "Other"));
    }

    #[test]
    fn max_segments_without_rollups_charts_sub_cell_sums() {
        let rows = vec![
            hits("A", "big", "x", 10.0),
            hits("A", "small", "x", 1.0),
            hits("A", "tiny", "y", 2.0),
            hits("B", "tiny", "x", 4.0),
        ];
        let mut spec = PivotSpec::new("store", "site", "n")
            .with_sub_key("ip")
            .with_max_segments(1);
        spec.aggregate_row_dimensions = false;
        let result = aggregate(&rows, &spec);
        assert_eq!(result.column_keys(), ["big", "Other"]);
        assert_eq!(result.cell("A", "Other"), None);
        assert_eq!(result.value("A", "Other"), Some(3.0));
        assert_eq!(result.value("B", "Other"), Some(4.0));
        assert_eq!(result.value("B", "big"), None);

        let chart = to_chart_data(&result, &ChartProjection::default());
        assert_eq!(chart.labels, vec!["A", "B"]);
        assert_eq!(chart.datasets[0].data, vec![10.0, 0.0]);
        assert_eq!(chart.datasets[1].label, "Other");
        assert_eq!(chart.datasets[1].data, vec![3.0, 4.0]);
    }
}
