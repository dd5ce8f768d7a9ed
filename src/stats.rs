use std::collections::HashMap;

use crate::data::RowRecord;

/// Label substituted for empty values in histograms.
pub const EMPTY_LABEL: &str = "Empty";

/// Value histogram over one column of a row set: `(value, count)` pairs
/// sorted by count descending, ties in first-occurrence order. Empty values
/// count under the literal label `"Empty"`.
pub fn value_counts(rows: &[RowRecord], column: &str) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in rows {
        let mut value = record.display_value(column);
        if value.is_empty() {
            value = EMPTY_LABEL.to_string();
        }
        match positions.get(&value) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
