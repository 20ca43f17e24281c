//! Segment limiting: rank segments by total and fold the tail into "Other"

use indexmap::IndexMap;
use pivot_types::{field, Row, SegmentSelection, OTHER_SEGMENT};

/// Rank segments of `segment_field` by their summed `metric_field`.
///
/// When there are more than `max_segments` distinct segments the top
/// `max_segments` are kept (descending total, ties in first-seen order) and
/// `"Other"` is appended. Otherwise every segment is returned in first-seen
/// order. `max_segments < 1` disables limiting.
///
/// A segment literally named `"Other"` never takes one of the kept slots;
/// its total is merged into the appended `"Other"` bucket.
pub fn limit_segments(
    rows: &[Row],
    segment_field: &str,
    metric_field: &str,
    max_segments: i64,
) -> SegmentSelection {
    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        *totals.entry(field(row, segment_field).to_key()).or_insert(0.0) +=
            field(row, metric_field).as_f64().unwrap_or(0.0);
    }
    let pairs: Vec<(String, f64)> = totals.into_iter().collect();
    limit_segment_totals(&pairs, max_segments)
}

/// Same as [`limit_segments`], over pre-computed `(segment, total)` pairs in
/// first-seen order.
pub fn limit_segment_totals(totals: &[(String, f64)], max_segments: i64) -> SegmentSelection {
    let keep = match usize::try_from(max_segments) {
        Ok(keep) if keep >= 1 && totals.len() > keep => keep,
        _ => {
            return SegmentSelection {
                segments: totals.iter().map(|(k, _)| k.clone()).collect(),
                other_total: 0.0,
                truncated: false,
            }
        }
    };

    let (named_other, mut ranked): (Vec<&(String, f64)>, Vec<&(String, f64)>) =
        totals.iter().partition(|(k, _)| k == OTHER_SEGMENT);
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let cut = keep.min(ranked.len());
    let other_total = named_other
        .iter()
        .chain(&ranked[cut..])
        .map(|(_, t)| t)
        .sum();
    let mut segments: Vec<String> = ranked[..cut].iter().map(|(k, _)| k.clone()).collect();
    segments.push(OTHER_SEGMENT.to_string());

    log::debug!(
        "limited {} segments to {} plus {OTHER_SEGMENT}",
        totals.len(),
        cut
    );

    SegmentSelection {
        segments,
        other_total,
        truncated: true,
    }
}
