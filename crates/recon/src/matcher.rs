use std::collections::{HashMap, HashSet};

use crate::model::{BranchRecord, CellValue, ClassifiedUnit, MasterRecord, OutputRow, UnitKind};
use crate::normalize::{clean_text, normalize_license};

/// Deduplicated tractors and bodies, indexed by normalized license.
///
/// Candidate lists keep master-table order, so the first entry of a list is
/// the record with the lowest original row index.
#[derive(Debug, Default)]
pub struct MasterIndex {
    tractors: Vec<ClassifiedUnit>,
    bodies: Vec<ClassifiedUnit>,
    tractor_by_license: HashMap<String, Vec<usize>>,
    body_by_license: HashMap<String, Vec<usize>>,
}

impl MasterIndex {
    pub fn build(units: &[ClassifiedUnit]) -> Self {
        let tractors = dedup_units(units, UnitKind::Tractor);
        let bodies = dedup_units(units, UnitKind::Body);
        let tractor_by_license = index_by_license(&tractors);
        let body_by_license = index_by_license(&bodies);
        Self {
            tractors,
            bodies,
            tractor_by_license,
            body_by_license,
        }
    }

    pub fn tractor_for(&self, license: &str) -> Option<&ClassifiedUnit> {
        first_candidate(&self.tractor_by_license, &self.tractors, license)
    }

    pub fn body_for(&self, license: &str) -> Option<&ClassifiedUnit> {
        first_candidate(&self.body_by_license, &self.bodies, license)
    }

    /// More than one distinct tractor, or more than one distinct body.
    pub fn is_ambiguous(&self, license: &str) -> bool {
        let count = |m: &HashMap<String, Vec<usize>>| m.get(license).map_or(0, Vec::len);
        count(&self.tractor_by_license) > 1 || count(&self.body_by_license) > 1
    }

    pub fn tractor_count(&self) -> usize {
        self.tractors.len()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

fn first_candidate<'a>(
    index: &HashMap<String, Vec<usize>>,
    units: &'a [ClassifiedUnit],
    license: &str,
) -> Option<&'a ClassifiedUnit> {
    index
        .get(license)
        .and_then(|ids| ids.first())
        .map(|&i| &units[i])
}

fn index_by_license(units: &[ClassifiedUnit]) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, unit) in units.iter().enumerate() {
        if let Some(license) = unit.normalized_license.as_text().filter(|s| !s.is_empty()) {
            index.entry(license.to_string()).or_default().push(i);
        }
    }
    index
}

/// Units of one kind with duplicate keys removed, first occurrence kept.
///
/// Tractors are keyed on (license, vehicle ID, route), bodies on
/// (license, vehicle ID). Units without a vehicle ID are dropped.
pub fn dedup_units(units: &[ClassifiedUnit], kind: UnitKind) -> Vec<ClassifiedUnit> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    units
        .iter()
        .filter(|u| u.kind == kind && !u.normalized_vehicle_id.is_blank())
        .filter(|u| {
            let route = match kind {
                UnitKind::Tractor => cell_key(&u.route),
                UnitKind::Body => String::new(),
            };
            seen.insert((
                cell_key(&u.normalized_license),
                cell_key(&u.normalized_vehicle_id),
                route,
            ))
        })
        .cloned()
        .collect()
}

/// Type-tagged key so `Text("1")` and `Number(1.0)` never collide.
fn cell_key(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(s) => format!("t:{s}"),
        CellValue::Number(n) => format!("n:{n}"),
        CellValue::Bool(b) => format!("b:{b}"),
        CellValue::Empty => "e:".to_string(),
    }
}

/// Distinct normalized license values in first-seen order. Blank keys, and
/// keys that normalize to an empty plate, are skipped.
///
/// Values are distinct by displayed text, so a numeric `1234` and a text
/// `1234` give one output row. The text form is kept since only text can
/// match the master list.
pub fn distinct_licenses<'a>(raw: impl IntoIterator<Item = &'a CellValue>) -> Vec<CellValue> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<CellValue> = Vec::new();
    for cell in raw {
        if cell.is_blank() {
            continue;
        }
        let normalized = normalize_license(cell);
        if normalized.is_blank() {
            log::debug!("skipping branch plate {cell:?}: empty after normalization");
            continue;
        }
        match position.get(&normalized.to_string()) {
            Some(&i) => {
                if out[i].is_malformed() && normalized.as_text().is_some() {
                    out[i] = normalized;
                }
            }
            None => {
                position.insert(normalized.to_string(), out.len());
                out.push(normalized);
            }
        }
    }
    out
}

/// Branch licenses when the branch reports plates directly.
pub fn branch_licenses(branch: &[BranchRecord]) -> Vec<CellValue> {
    distinct_licenses(branch.iter().map(|b| &b.key))
}

/// Branch licenses when the branch reports vehicle IDs.
///
/// Each ID is looked up in the master list by cleaned (trimmed, uppercased)
/// vehicle ID; every master row carrying that ID contributes its license.
/// Returns the distinct normalized licenses and the number of branch IDs that
/// had no master row.
pub fn branch_licenses_by_vehicle(
    branch: &[BranchRecord],
    master: &[MasterRecord],
) -> (Vec<CellValue>, usize) {
    let mut by_id: HashMap<String, Vec<&CellValue>> = HashMap::new();
    for record in master {
        if let Some(id) = record.vehicle_id.as_text() {
            by_id.entry(clean_text(id)).or_default().push(&record.license);
        }
    }

    let mut unresolved = 0;
    let mut licenses: Vec<&CellValue> = Vec::new();
    for b in branch.iter().filter(|b| !b.key.is_blank()) {
        let hits = b.key.as_text().and_then(|id| by_id.get(&clean_text(id)));
        match hits {
            Some(found) => licenses.extend(found.iter().copied()),
            None => {
                log::warn!("branch row {}: vehicle {} not in master list", b.row + 1, b.key);
                unresolved += 1;
            }
        }
    }

    (distinct_licenses(licenses), unresolved)
}

#[derive(Debug, Default)]
pub struct MatchOutput {
    /// One row per license, in license order (untriaged).
    pub rows: Vec<OutputRow>,
    pub ambiguous: usize,
}

/// Look up the tractor and body of each license. Route only ever comes from
/// the tractor.
pub fn match_licenses(index: &MasterIndex, licenses: &[CellValue]) -> MatchOutput {
    let mut output = MatchOutput::default();

    for license in licenses {
        let key = license.as_text().filter(|s| !s.is_empty());
        let tractor = key.and_then(|k| index.tractor_for(k));
        let body = key.and_then(|k| index.body_for(k));

        if let Some(k) = key {
            if index.is_ambiguous(k) {
                log::warn!("license {k}: several master candidates, using first by row order");
                output.ambiguous += 1;
            }
        }

        output.rows.push(OutputRow::new(
            tractor.map(|t| t.normalized_vehicle_id.to_string()).unwrap_or_default(),
            body.map(|b| b.normalized_vehicle_id.to_string()).unwrap_or_default(),
            license.to_string(),
            tractor.map(|t| t.route.to_string()).unwrap_or_default(),
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_all;

    fn master(rows: &[(&str, &str, &str)]) -> Vec<MasterRecord> {
        rows.iter()
            .enumerate()
            .map(|(row, (id, lic, route))| MasterRecord {
                row,
                vehicle_id: CellValue::from(*id),
                license: CellValue::from(*lic),
                route: CellValue::from(*route),
            })
            .collect()
    }

    fn branch(keys: &[&str]) -> Vec<BranchRecord> {
        keys.iter()
            .enumerate()
            .map(|(row, k)| BranchRecord { row, key: CellValue::from(*k) })
            .collect()
    }

    fn index(rows: &[(&str, &str, &str)]) -> MasterIndex {
        MasterIndex::build(&classify_all(&master(rows)))
    }

    #[test]
    fn pairs_tractor_and_body() {
        let idx = index(&[("ABC123", "LAG001T", "R1"), ("ABC123T", "LAG001C", "")]);
        let out = match_licenses(&idx, &[CellValue::text("LAG001")]);
        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.tractor, "ABC123");
        assert_eq!(row.body, "ABC123");
        assert_eq!(row.license, "LAG001");
        assert_eq!(row.route, "R1");
        assert_eq!(out.ambiguous, 0);
    }

    #[test]
    fn route_never_from_body() {
        let idx = index(&[("DT4521", "KJA100", "BODY-ROUTE")]);
        let out = match_licenses(&idx, &[CellValue::text("KJA100")]);
        assert_eq!(out.rows[0].body, "DT4521");
        assert_eq!(out.rows[0].tractor, "");
        assert_eq!(out.rows[0].route, "");
    }

    #[test]
    fn no_match_row_is_kept() {
        let idx = index(&[("ABC123", "LAG001", "R1")]);
        let out = match_licenses(&idx, &[CellValue::text("ZZZ999")]);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].tractor, "");
        assert_eq!(out.rows[0].body, "");
        assert_eq!(out.rows[0].license, "ZZZ999");
    }

    #[test]
    fn first_row_wins_on_duplicate_license() {
        let idx = index(&[
            ("TRK001", "LAG500", "R1"),
            ("TRK002", "LAG500T", "R2"),
        ]);
        let out = match_licenses(&idx, &[CellValue::text("LAG500")]);
        assert_eq!(out.rows[0].tractor, "TRK001");
        assert_eq!(out.rows[0].route, "R1");
        assert_eq!(out.ambiguous, 1);
    }

    #[test]
    fn first_row_wins_on_duplicate_body_license() {
        let idx = index(&[
            ("TRK001", "LAG500", "R1"),
            ("BDY010T", "LAG500C", ""),
            ("DT2002", "LAG500", ""),
        ]);
        assert_eq!(idx.body_count(), 2);
        let out = match_licenses(&idx, &[CellValue::text("LAG500")]);
        assert_eq!(out.rows[0].tractor, "TRK001");
        assert_eq!(out.rows[0].body, "BDY010");
        assert_eq!(out.rows[0].route, "R1");
        assert_eq!(out.ambiguous, 1);
    }

    #[test]
    fn exact_duplicates_are_not_ambiguous() {
        let idx = index(&[
            ("TRK001", "LAG500", "R1"),
            ("trk001 ", "LAG500C", "R1"),
            ("TRK001T", "LAG500", ""),
            ("TRK001T", "LAG500", "R9"),
        ]);
        assert_eq!(idx.tractor_count(), 1);
        assert_eq!(idx.body_count(), 1);
        assert!(!idx.is_ambiguous("LAG500"));
    }

    #[test]
    fn tractor_dedup_includes_route() {
        let idx = index(&[("TRK001", "LAG500", "R1"), ("TRK001", "LAG500", "R2")]);
        assert_eq!(idx.tractor_count(), 2);
        assert!(idx.is_ambiguous("LAG500"));
    }

    #[test]
    fn blank_vehicle_ids_are_not_indexed() {
        let idx = index(&[("", "LAG001", "R1")]);
        assert!(idx.tractor_for("LAG001").is_none());
    }

    #[test]
    fn malformed_master_license_never_matches() {
        let mut records = master(&[("ABC123", "", "R1")]);
        records[0].license = CellValue::Number(1234.0);
        let idx = MasterIndex::build(&classify_all(&records));
        let out = match_licenses(&idx, &[CellValue::Number(1234.0)]);
        assert_eq!(out.rows[0].tractor, "");
        assert_eq!(out.rows[0].license, "1234");
    }

    #[test]
    fn distinct_licenses_first_seen_order() {
        let b = branch(&["LAG002", "lag001t", "", "LAG001C", "  ", "LAG002", "LAG003THT"]);
        let lics = branch_licenses(&b);
        assert_eq!(
            lics,
            vec![
                CellValue::text("LAG002"),
                CellValue::text("LAG001"),
                CellValue::text("LAG003THT"),
            ]
        );
    }

    #[test]
    fn numeric_and_text_plate_give_one_license() {
        let mut b = branch(&["", "1234", "LAG001"]);
        b[0].key = CellValue::Number(1234.0);
        let lics = branch_licenses(&b);
        assert_eq!(lics, vec![CellValue::text("1234"), CellValue::text("LAG001")]);

        let mut b = branch(&["", "LAG001"]);
        b[0].key = CellValue::Number(1234.0);
        assert_eq!(branch_licenses(&b)[0], CellValue::Number(1234.0));
    }

    #[test]
    fn plates_empty_after_normalization_are_skipped() {
        let lics = branch_licenses(&branch(&["C", "T", "LAG001"]));
        assert_eq!(lics, vec![CellValue::text("LAG001")]);
    }

    #[test]
    fn resolve_by_vehicle_id() {
        let m = master(&[
            ("ABC123", "LAG001T", "R1"),
            ("ABC123T", "LAG001C", ""),
            ("XYZ900", "LAG009", "R3"),
        ]);
        let b = branch(&[" abc123t", "XYZ900", "NOPE1", "ABC123"]);
        let (lics, unresolved) = branch_licenses_by_vehicle(&b, &m);
        assert_eq!(lics, vec![CellValue::text("LAG001"), CellValue::text("LAG009")]);
        assert_eq!(unresolved, 1);
    }
}
