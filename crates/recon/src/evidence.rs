use std::collections::BTreeMap;

use crate::model::{AlignBucket, AlignSummary, OutputRow};
use crate::triage::bucket_of;

/// Compute bucket counts from output rows. Data-quality counters
/// (`ambiguous`, `malformed_cells`, `unresolved_branch_ids`) are left at zero
/// for the caller to fill in.
pub fn compute_summary(rows: &[OutputRow]) -> AlignSummary {
    let mut bucket_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut summary = AlignSummary {
        total_rows: rows.len(),
        ..AlignSummary::default()
    };

    for row in rows {
        let bucket = bucket_of(row);
        *bucket_counts.entry(bucket.to_string()).or_insert(0) += 1;

        match bucket {
            AlignBucket::Both => summary.both += 1,
            AlignBucket::TractorOnly => summary.tractor_only += 1,
            AlignBucket::BodyOnly => summary.body_only += 1,
            AlignBucket::Neither => summary.neither += 1,
        }
    }

    summary.bucket_counts = bucket_counts;
    summary
}
