use crate::classify::classify_all;
use crate::config::{AlignConfig, BranchConfig, BranchKey, MasterConfig};
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::{branch_licenses, branch_licenses_by_vehicle, match_licenses, MasterIndex};
use crate::model::{AlignmentReport, MasterRecord};
use crate::table::{branch_records, master_records, Table};
use crate::triage::triage;

/// The master vehicle list, classified and indexed once.
///
/// Read-only after construction; one instance can serve any number of
/// branches, from any number of threads.
#[derive(Debug)]
pub struct MasterList {
    records: Vec<MasterRecord>,
    index: MasterIndex,
    malformed_cells: usize,
}

impl MasterList {
    pub fn from_table(table: &Table, config: &MasterConfig) -> Result<Self, ReconError> {
        let records = master_records(table, config.columns())?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<MasterRecord>) -> Self {
        let malformed_cells = records
            .iter()
            .map(|r| usize::from(r.vehicle_id.is_malformed()) + usize::from(r.license.is_malformed()))
            .sum();
        if malformed_cells > 0 {
            log::warn!("master list: {malformed_cells} non-text plate/ID cell(s) will not match");
        }

        let units = classify_all(&records);
        let index = MasterIndex::build(&units);
        log::debug!(
            "master list: {} rows, {} tractors, {} bodies after dedup",
            records.len(),
            index.tractor_count(),
            index.body_count()
        );

        Self {
            records,
            index,
            malformed_cells,
        }
    }

    pub fn records(&self) -> &[MasterRecord] {
        &self.records
    }

    pub fn index(&self) -> &MasterIndex {
        &self.index
    }
}

/// Align one branch table against a prepared master list.
///
/// Fails only when the branch key column is missing; no partial report is
/// produced in that case.
pub fn align_branch(
    master: &MasterList,
    branch: &Table,
    config: &BranchConfig,
) -> Result<AlignmentReport, ReconError> {
    let records = branch_records(branch, config.key_column())?;
    let branch_malformed = records.iter().filter(|r| r.key.is_malformed()).count();

    let (licenses, unresolved) = match config.key {
        BranchKey::License => (branch_licenses(&records), 0),
        BranchKey::VehicleId => branch_licenses_by_vehicle(&records, &master.records),
    };

    let matched = match_licenses(&master.index, &licenses);
    let rows = triage(matched.rows);

    let mut summary = compute_summary(&rows);
    summary.ambiguous = matched.ambiguous;
    summary.malformed_cells = master.malformed_cells + branch_malformed;
    summary.unresolved_branch_ids = unresolved;

    log::info!(
        "branch '{}': {} plate(s), {} both, {} tractor only, {} body only, {} unmatched",
        branch.name,
        summary.total_rows,
        summary.both,
        summary.tractor_only,
        summary.body_only,
        summary.neither,
    );

    Ok(AlignmentReport {
        branch: branch.name.clone(),
        summary,
        rows,
    })
}

/// Generate the alignment report of one branch table against the master
/// table. Pure: inputs are only read.
pub fn generate_report(
    config: &AlignConfig,
    master: &Table,
    branch: &Table,
) -> Result<AlignmentReport, ReconError> {
    let master_list = MasterList::from_table(master, &config.master)?;
    align_branch(&master_list, branch, &config.branch)
}
