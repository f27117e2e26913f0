use crate::model::{AlignBucket, OutputRow};

/// Bucket of a row, from the emptiness of its tractor and body.
pub fn bucket_of(row: &OutputRow) -> AlignBucket {
    match (row.tractor.is_empty(), row.body.is_empty()) {
        (false, false) => AlignBucket::Both,
        (false, true) => AlignBucket::TractorOnly,
        (true, false) => AlignBucket::BodyOnly,
        (true, true) => AlignBucket::Neither,
    }
}

/// Order rows BOTH, TRACTOR_ONLY, BODY_ONLY, NEITHER. Relative order within a
/// bucket is preserved and no row is dropped.
pub fn triage(rows: Vec<OutputRow>) -> Vec<OutputRow> {
    let mut rows = rows;
    // sort_by_key is stable.
    rows.sort_by_key(bucket_of);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tractor: &str, body: &str, license: &str) -> OutputRow {
        OutputRow::new(tractor.into(), body.into(), license.into(), String::new())
    }

    #[test]
    fn buckets() {
        assert_eq!(bucket_of(&row("T", "B", "L")), AlignBucket::Both);
        assert_eq!(bucket_of(&row("T", "", "L")), AlignBucket::TractorOnly);
        assert_eq!(bucket_of(&row("", "B", "L")), AlignBucket::BodyOnly);
        assert_eq!(bucket_of(&row("", "", "L")), AlignBucket::Neither);
    }

    #[test]
    fn triage_order_is_stable() {
        let rows = vec![
            row("", "", "N1"),
            row("", "B1", "BO1"),
            row("T1", "", "TO1"),
            row("T2", "B2", "BT1"),
            row("", "B3", "BO2"),
            row("T4", "B4", "BT2"),
            row("T5", "", "TO2"),
            row("", "", "N2"),
        ];
        let licenses: Vec<String> = triage(rows).into_iter().map(|r| r.license).collect();
        assert_eq!(
            licenses,
            vec!["BT1", "BT2", "TO1", "TO2", "BO1", "BO2", "N1", "N2"]
        );
    }

    #[test]
    fn triage_empty() {
        assert!(triage(Vec::new()).is_empty());
    }
}
