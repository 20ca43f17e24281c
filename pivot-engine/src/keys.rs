//! Row and column key extraction

use indexmap::IndexSet;
use pivot_types::{field, ExtractedKeys, Row};

/// Collect unique row and column keys in first-seen order.
///
/// Null or missing keys are kept as the literal `"null"` key.
pub fn extract_keys(rows: &[Row], row_key_field: &str, column_key_field: &str) -> ExtractedKeys {
    let mut row_keys = IndexSet::new();
    let mut column_keys = IndexSet::new();
    for row in rows {
        row_keys.insert(field(row, row_key_field).to_key());
        column_keys.insert(field(row, column_key_field).to_key());
    }
    ExtractedKeys {
        row_keys: row_keys.into_iter().collect(),
        column_keys: column_keys.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_types::Value;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn keeps_first_seen_order() {
        let rows = vec![
            row(&[("store", "B".into()), ("day", "Tue".into())]),
            row(&[("store", "A".into()), ("day", "Mon".into())]),
            row(&[("store", "B".into()), ("day", "Mon".into())]),
        ];
        let keys = extract_keys(&rows, "store", "day");
        assert_eq!(keys.row_keys, vec!["B", "A"]);
        assert_eq!(keys.column_keys, vec!["Tue", "Mon"]);
    }

    #[test]
    fn null_and_missing_keys_are_retained() {
        let rows = vec![
            row(&[("store", Value::Null), ("day", "Mon".into())]),
            row(&[("day", "Mon".into())]),
            row(&[("store", "A".into())]),
        ];
        let keys = extract_keys(&rows, "store", "day");
        assert_eq!(keys.row_keys, vec!["null", "A"]);
        assert_eq!(keys.column_keys, vec!["Mon", "null"]);
    }
}
