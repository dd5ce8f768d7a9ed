use proptest::prelude::*;

use xlsx_wrangler::data::{Cell, RowRecord};
use xlsx_wrangler::group::{group_rows, EmptyKeyPolicy};

fn record_with_key(key: &str) -> RowRecord {
    let mut record = RowRecord::new();
    record.set("id", Cell::text(key));
    record
}

proptest! {
    /// Grouping with the inclusive policy and the minimum threshold loses no
    /// rows beyond the below-threshold partitions, and group sizes are
    /// non-increasing.
    #[test]
    fn grouping_partitions_without_inventing_rows(
        keys in proptest::collection::vec("[a-c]{1}", 1..40)
    ) {
        let rows: Vec<RowRecord> = keys.iter().map(|k| record_with_key(k)).collect();
        let total = rows.len();

        match group_rows(rows, "id", 2, EmptyKeyPolicy::Include) {
            Ok(groups) => {
                let grouped: usize = groups.iter().map(|g| g.rows.len()).sum();
                prop_assert!(grouped <= total);
                for group in &groups {
                    prop_assert!(group.rows.len() >= 2);
                    for row in &group.rows {
                        prop_assert_eq!(row.display_value("id"), group.key.clone());
                    }
                }
                for pair in groups.windows(2) {
                    prop_assert!(pair[0].rows.len() >= pair[1].rows.len());
                }
                // Singleton keys are the only rows allowed to go missing.
                let singletons = keys.iter()
                    .filter(|k| keys.iter().filter(|other| other == k).count() == 1)
                    .count();
                prop_assert_eq!(grouped, total - singletons);
            }
            Err(_) => {
                // Only possible when every key is unique.
                let max_run = keys.iter()
                    .map(|k| keys.iter().filter(|other| other == &k).count())
                    .max()
                    .unwrap_or(0);
                prop_assert!(max_run < 2);
            }
        }
    }
}
