use crate::model::{CellValue, ClassifiedUnit, MasterRecord, UnitKind};
use crate::normalize::{clean_text, normalize_license, normalize_vehicle_id};

/// Body units: ID ends in `T`, `CHT` or `THT`, or starts with `DT`.
///
/// `CHT`/`THT` are covered by the trailing-`T` test already; they stay listed
/// because they are the suffixes the fleet actually uses.
pub fn is_body_str(vehicle_id: &str) -> bool {
    let id = clean_text(vehicle_id);
    id.ends_with('T') || id.ends_with("CHT") || id.ends_with("THT") || id.starts_with("DT")
}

/// Non-text IDs are never bodies.
pub fn is_body(vehicle_id: &CellValue) -> bool {
    vehicle_id.as_text().is_some_and(is_body_str)
}

pub fn unit_kind(vehicle_id: &CellValue) -> UnitKind {
    if is_body(vehicle_id) {
        UnitKind::Body
    } else {
        UnitKind::Tractor
    }
}

/// Derive kind and normalized keys for one master record.
pub fn classify_record(record: &MasterRecord) -> ClassifiedUnit {
    let kind = unit_kind(&record.vehicle_id);
    ClassifiedUnit {
        row: record.row,
        kind,
        normalized_license: normalize_license(&record.license),
        normalized_vehicle_id: normalize_vehicle_id(&record.vehicle_id, kind == UnitKind::Body),
        route: record.route.clone(),
    }
}

pub fn classify_all(records: &[MasterRecord]) -> Vec<ClassifiedUnit> {
    records.iter().map(classify_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize, id: &str, license: &str, route: &str) -> MasterRecord {
        MasterRecord {
            row,
            vehicle_id: CellValue::from(id),
            license: CellValue::from(license),
            route: CellValue::from(route),
        }
    }

    #[test]
    fn body_patterns() {
        assert!(is_body_str("KJA234XT"));
        assert!(is_body_str("DT4521"));
        assert!(is_body_str("KJA234CHT"));
        assert!(is_body_str("KJA234THT"));
        assert!(!is_body_str("KJA234XZ"));
        assert!(!is_body_str("ABC123"));
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert!(is_body_str("kja234xt"));
        assert!(is_body_str(" dt4521 "));
    }

    #[test]
    fn non_text_is_tractor() {
        assert!(!is_body(&CellValue::Number(4521.0)));
        assert!(!is_body(&CellValue::Empty));
        assert_eq!(unit_kind(&CellValue::Bool(true)), UnitKind::Tractor);
    }

    #[test]
    fn classify_tractor_record() {
        let unit = classify_record(&record(0, "ABC123", "LAG001T", "R1"));
        assert_eq!(unit.kind, UnitKind::Tractor);
        assert_eq!(unit.normalized_license, CellValue::text("LAG001"));
        assert_eq!(unit.normalized_vehicle_id, CellValue::text("ABC123"));
        assert_eq!(unit.route, CellValue::text("R1"));
    }

    #[test]
    fn classify_body_record() {
        let unit = classify_record(&record(1, "ABC123T", "LAG001C", ""));
        assert!(unit.is_body());
        assert_eq!(unit.normalized_license, CellValue::text("LAG001"));
        assert_eq!(unit.normalized_vehicle_id, CellValue::text("ABC123"));
        assert_eq!(unit.route, CellValue::Empty);
    }

    #[test]
    fn license_does_not_affect_kind() {
        let a = classify_record(&record(0, "ABC123", "XYZT", ""));
        let b = classify_record(&record(1, "ABC123", "XYZ", ""));
        assert_eq!(a.kind, b.kind);
    }
}
