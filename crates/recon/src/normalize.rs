//! Canonical forms of license plates and vehicle IDs.
//!
//! Plates and IDs are trimmed and uppercased, then a trailing variant marker
//! is stripped so that e.g. `LAG001T` and `LAG001C` both join on `LAG001`.
//! A `THT` suffix is part of the plate and is never stripped.

use crate::model::CellValue;

/// Trim + uppercase. Every key column goes through this first.
pub fn clean_text(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Strip one trailing `C`, or one trailing `T` unless the plate ends in `THT`.
pub fn normalize_license_str(raw: &str) -> String {
    let plate = clean_text(raw);
    if plate.ends_with('C') || (plate.ends_with('T') && !plate.ends_with("THT")) {
        drop_last(&plate)
    } else {
        plate
    }
}

/// Body IDs lose one trailing `T` (unless they end in `THT`); tractor IDs are
/// only cleaned.
pub fn normalize_vehicle_id_str(raw: &str, is_body: bool) -> String {
    let id = clean_text(raw);
    if is_body && id.ends_with('T') && !id.ends_with("THT") {
        drop_last(&id)
    } else {
        id
    }
}

/// Non-text cells pass through unchanged.
pub fn normalize_license(raw: &CellValue) -> CellValue {
    match raw {
        CellValue::Text(s) => CellValue::Text(normalize_license_str(s)),
        other => other.clone(),
    }
}

/// Non-text cells pass through unchanged.
pub fn normalize_vehicle_id(raw: &CellValue, is_body: bool) -> CellValue {
    match raw {
        CellValue::Text(s) => CellValue::Text(normalize_vehicle_id_str(s, is_body)),
        other => other.clone(),
    }
}

fn drop_last(s: &str) -> String {
    let mut out = s.to_string();
    out.pop();
    out
}
