//! Percentage rescaling of chart series

use pivot_types::{ChartData, PercentageMode};

/// Rescale chart values to percentages.
///
/// Always returns new data; the input is left as is so the same absolute
/// series can feed both views. In `Global` mode a zero grand total skips
/// the rescale entirely. In `PerLabel` mode a label whose total is zero
/// keeps its values.
pub fn to_percentage(chart: &ChartData, mode: PercentageMode) -> ChartData {
    let mut out = chart.clone();
    match mode {
        PercentageMode::None => {}
        PercentageMode::Global => {
            let total = chart.total();
            if total == 0.0 {
                log::debug!("global percentage skipped: total is zero");
                return out;
            }
            for dataset in &mut out.datasets {
                for value in &mut dataset.data {
                    *value = *value / total * 100.0;
                }
            }
        }
        PercentageMode::PerLabel => {
            let totals: Vec<f64> = (0..chart.labels.len())
                .map(|i| chart.label_total(i))
                .collect();
            for dataset in &mut out.datasets {
                for (value, &total) in dataset.data.iter_mut().zip(&totals) {
                    if total != 0.0 {
                        *value = *value / total * 100.0;
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_types::{Dataset, DatasetMetadata};
    use pretty_assertions::assert_eq;

    fn chart(labels: &[&str], series: &[&[f64]]) -> ChartData {
        ChartData {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            datasets: series
                .iter()
                .enumerate()
                .map(|(i, data)| Dataset {
                    label: format!("s{i}"),
                    data: data.to_vec(),
                    metadata: DatasetMetadata::default(),
                })
                .collect(),
        }
    }

    fn values(chart: &ChartData) -> Vec<Vec<f64>> {
        chart.datasets.iter().map(|d| d.data.clone()).collect()
    }

    #[test]
    fn per_label_already_summing_to_100() {
        let input = chart(&["labelA"], &[&[30.0], &[70.0]]);
        let out = to_percentage(&input, PercentageMode::PerLabel);
        assert_eq!(values(&out), vec![vec![30.0], vec![70.0]]);
    }

    #[test]
    fn per_label_zero_total_is_untouched() {
        let input = chart(&["labelA", "labelB"], &[&[0.0, 1.0], &[0.0, 3.0]]);
        let out = to_percentage(&input, PercentageMode::PerLabel);
        assert_eq!(values(&out), vec![vec![0.0, 25.0], vec![0.0, 75.0]]);
        assert!(out.datasets.iter().flat_map(|d| &d.data).all(|v| !v.is_nan()));
    }

    #[test]
    fn global_uses_grand_total() {
        let input = chart(&["a", "b"], &[&[1.0, 1.0], &[2.0, 0.0]]);
        let out = to_percentage(&input, PercentageMode::Global);
        assert_eq!(values(&out), vec![vec![25.0, 25.0], vec![50.0, 0.0]]);
        // input untouched
        assert_eq!(values(&input), vec![vec![1.0, 1.0], vec![2.0, 0.0]]);
    }

    #[test]
    fn global_zero_total_returns_absolute_values() {
        let input = chart(&["a"], &[&[0.0], &[0.0]]);
        assert_eq!(to_percentage(&input, PercentageMode::Global), input);
    }
}
