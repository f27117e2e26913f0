//! `tyrebay run`, `tyrebay validate` and `tyrebay normalize`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tyrebay_io::xlsx::{unique_sheet_names, ReportSheet};
use tyrebay_recon::config::AlignConfig;
use tyrebay_recon::engine::{align_branch, MasterList};
use tyrebay_recon::{
    is_body_str, normalize_license_str, normalize_vehicle_id_str, AlignmentReport, BranchKey,
    Table, UnitKind,
};

use crate::exit_codes::{
    EXIT_CONFIG_INVALID, EXIT_INPUT_READ, EXIT_MISSING_SHEET, EXIT_OUTPUT_WRITE,
};
use crate::{CliError, KeyArg};

pub struct RunArgs {
    pub workbook: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub master_sheet: Option<String>,
    pub master: Option<PathBuf>,
    pub branches: Vec<String>,
    pub key: Option<KeyArg>,
    pub output: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub json: bool,
    pub output_json: Option<PathBuf>,
}

/// Master table plus the branch tables to align, in run order.
struct Inputs {
    master: Table,
    branches: Vec<Table>,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    name: &'a str,
    generated_at: String,
    master: &'a str,
    key: String,
    branches: &'a [AlignmentReport],
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AlignConfig::default(),
    };
    if let Some(sheet) = &args.master_sheet {
        config.master.sheet = sheet.clone();
    }
    if let Some(key) = args.key {
        config.branch.key = match key {
            KeyArg::License => BranchKey::License,
            KeyArg::VehicleId => BranchKey::VehicleId,
        };
    }
    config
        .validate()
        .map_err(|e| CliError::new(EXIT_CONFIG_INVALID, e.to_string()))?;

    let inputs = match (&args.workbook, &args.master) {
        (Some(workbook), None) => {
            if !tyrebay_io::is_workbook(workbook) {
                return Err(CliError::args(format!(
                    "{} is not a spreadsheet workbook",
                    workbook.display()
                ))
                .with_hint("for CSV inputs use --master FILE --branch FILE"));
            }
            load_workbook_inputs(workbook, &config, &args.branches)?
        }
        (None, Some(master)) => load_csv_inputs(master, &args.branches)?,
        _ => {
            return Err(CliError::args("no input given")
                .with_hint("pass a WORKBOOK, or --master FILE with --branch FILE"));
        }
    };

    let master_list = MasterList::from_table(&inputs.master, &config.master)?;
    log::info!(
        "master '{}': {} row(s), {} tractor(s), {} body unit(s)",
        inputs.master.name,
        master_list.records().len(),
        master_list.index().tractor_count(),
        master_list.index().body_count(),
    );
    let mut reports = Vec::with_capacity(inputs.branches.len());
    for branch in &inputs.branches {
        reports.push(align_branch(&master_list, branch, &config.branch)?);
    }

    let sheet_names: Vec<String> = reports
        .iter()
        .map(|r| config.output.sheet_name_for(&r.branch))
        .collect();
    let sheet_names = unique_sheet_names(&sheet_names);

    let xlsx_path = match (&args.output, &args.workbook) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(workbook)) => Some(default_output_path(workbook)),
        (None, None) => None,
    };
    if let Some(path) = xlsx_path {
        if let Some(workbook) = &args.workbook {
            if same_file(workbook, &path) {
                return Err(CliError::args("refusing to overwrite the input workbook")
                    .with_hint("pass a different --output path"));
            }
        }
        write_workbook(&path, &config, &sheet_names, &reports)?;
    }

    if let Some(dir) = &args.csv_dir {
        write_csv_dir(dir, &sheet_names, &reports)?;
    }

    if args.json || args.output_json.is_some() {
        let output = RunOutput {
            name: &config.name,
            generated_at: chrono::Utc::now().to_rfc3339(),
            master: &inputs.master.name,
            key: config.branch.key.to_string(),
            branches: &reports,
        };
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

        if let Some(path) = &args.output_json {
            std::fs::write(path, &json_str).map_err(|e| {
                CliError::new(EXIT_OUTPUT_WRITE, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        if args.json {
            println!("{json_str}");
        }
    }

    for report in &reports {
        eprintln!("{}", summary_line(report));
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AlignConfig, CliError> {
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_INPUT_READ, format!("cannot read config {}: {e}", path.display()))
    })?;
    AlignConfig::from_toml(&config_str)
        .map_err(|e| CliError::new(EXIT_CONFIG_INVALID, format!("{}: {e}", path.display())))
}

fn load_workbook_inputs(
    path: &Path,
    config: &AlignConfig,
    requested: &[String],
) -> Result<Inputs, CliError> {
    let tables = tyrebay_io::xlsx::read_workbook(path)
        .map_err(|e| CliError::new(EXIT_INPUT_READ, format!("{}: {e}", path.display())))?;
    let sheet_names: Vec<String> = tables.iter().map(|t| t.name.clone()).collect();
    let available = || format!("available sheets: {}", sheet_names.join(", "));

    let master_sheet = &config.master.sheet;
    let branch_names: Vec<String> = if !requested.is_empty() {
        requested.to_vec()
    } else if !config.branch.sheets.is_empty() {
        config.branch.sheets.clone()
    } else {
        sheet_names.iter().filter(|n| *n != master_sheet).cloned().collect()
    };

    let mut seen = HashSet::new();
    for name in &branch_names {
        if name == master_sheet {
            return Err(CliError::args(format!("branch sheet '{name}' is the master sheet")));
        }
        if !seen.insert(name.as_str()) {
            return Err(CliError::args(format!("branch sheet '{name}' given twice")));
        }
    }

    let mut by_name: HashMap<String, Table> =
        tables.into_iter().map(|t| (t.name.clone(), t)).collect();

    let master = by_name.remove(master_sheet).ok_or_else(|| {
        CliError::new(
            EXIT_MISSING_SHEET,
            format!("master sheet '{master_sheet}' not found in {}", path.display()),
        )
        .with_hint(available())
    })?;

    if branch_names.is_empty() {
        return Err(CliError::new(
            EXIT_MISSING_SHEET,
            format!("{} has no branch sheets", path.display()),
        ));
    }

    let mut branches = Vec::with_capacity(branch_names.len());
    for name in &branch_names {
        let table = by_name.remove(name).ok_or_else(|| {
            CliError::new(
                EXIT_MISSING_SHEET,
                format!("branch sheet '{name}' not found in {}", path.display()),
            )
            .with_hint(available())
        })?;
        branches.push(table);
    }

    Ok(Inputs { master, branches })
}

fn load_csv_inputs(master: &Path, branch_files: &[String]) -> Result<Inputs, CliError> {
    if branch_files.is_empty() {
        return Err(CliError::args("CSV mode needs at least one --branch FILE"));
    }

    let read = |path: &Path| {
        tyrebay_io::csv::import(path).map_err(|e| CliError::new(EXIT_INPUT_READ, e))
    };

    let master = read(master)?;
    let mut branches = Vec::with_capacity(branch_files.len());
    let mut seen = HashSet::new();
    for file in branch_files {
        let table = read(Path::new(file))?;
        if !seen.insert(table.name.clone()) {
            return Err(CliError::args(format!("two branch files are named '{}'", table.name)));
        }
        branches.push(table);
    }

    Ok(Inputs { master, branches })
}

/// `fleet.xlsx` -> `fleet-aligned.xlsx`, next to the input.
fn default_output_path(workbook: &Path) -> PathBuf {
    let stem = tyrebay_io::csv::table_name_from_path(workbook);
    workbook.with_file_name(format!("{stem}-aligned.xlsx"))
}

/// Whether two paths name the same file. The second may not exist yet, in
/// which case its parent directory is resolved instead.
fn same_file(existing: &Path, other: &Path) -> bool {
    let Ok(existing) = std::fs::canonicalize(existing) else {
        return existing == other;
    };
    if let Ok(other) = std::fs::canonicalize(other) {
        return existing == other;
    }
    let parent = match other.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(parent), other.file_name()) {
        (Ok(dir), Some(name)) => existing == dir.join(name),
        _ => false,
    }
}

fn write_workbook(
    path: &Path,
    config: &AlignConfig,
    sheet_names: &[String],
    reports: &[AlignmentReport],
) -> Result<(), CliError> {
    let sheets: Vec<ReportSheet<'_>> = sheet_names
        .iter()
        .zip(reports)
        .map(|(name, report)| ReportSheet { name: name.as_str(), report })
        .collect();

    tyrebay_io::xlsx::write_reports(path, &sheets, config.output.freeze_header)
        .map_err(|e| CliError::new(EXIT_OUTPUT_WRITE, format!("{}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

/// One CSV per report, named after its (already unique) result sheet name.
fn write_csv_dir(
    dir: &Path,
    sheet_names: &[String],
    reports: &[AlignmentReport],
) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        CliError::new(EXIT_OUTPUT_WRITE, format!("cannot create {}: {e}", dir.display()))
    })?;

    for (name, report) in sheet_names.iter().zip(reports) {
        let path = dir.join(format!("{name}.csv"));
        tyrebay_io::csv::export_report(report, &path)
            .map_err(|e| CliError::new(EXIT_OUTPUT_WRITE, format!("{}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn summary_line(report: &AlignmentReport) -> String {
    let s = &report.summary;
    let mut line = format!(
        "{}: {} plate(s): {} both, {} tractor only, {} body only, {} unmatched",
        report.branch, s.total_rows, s.both, s.tractor_only, s.body_only, s.neither,
    );
    if s.ambiguous > 0 {
        line.push_str(&format!(", {} ambiguous", s.ambiguous));
    }
    if s.unresolved_branch_ids > 0 {
        line.push_str(&format!(", {} unknown vehicle ID(s)", s.unresolved_branch_ids));
    }
    if s.malformed_cells > 0 {
        line.push_str(&format!(", {} non-text cell(s)", s.malformed_cells));
    }
    line
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let branches = if config.branch.sheets.is_empty() {
        "all non-master sheets".to_string()
    } else {
        format!("{} branch sheet(s)", config.branch.sheets.len())
    };
    eprintln!(
        "valid: '{}' master sheet '{}', key {}, {}",
        config.name, config.master.sheet, config.branch.key, branches,
    );
    Ok(())
}

// ============================================================================
// normalize
// ============================================================================

#[derive(Debug, Serialize)]
struct NormalizedValue {
    raw: String,
    kind: UnitKind,
    vehicle_id: String,
    license: String,
}

fn normalized(raw: &str) -> NormalizedValue {
    let body = is_body_str(raw);
    NormalizedValue {
        raw: raw.to_string(),
        kind: if body { UnitKind::Body } else { UnitKind::Tractor },
        vehicle_id: normalize_vehicle_id_str(raw, body),
        license: normalize_license_str(raw),
    }
}

pub fn cmd_normalize(values: Vec<String>, json: bool) -> Result<(), CliError> {
    let rows: Vec<NormalizedValue> = values.iter().map(|v| normalized(v)).collect();

    if json {
        let json_str = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    println!("raw\tkind\tvehicle_id\tlicense");
    for row in &rows {
        println!("{:?}\t{}\t{}\t{}", row.raw, row.kind, row.vehicle_id, row.license);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyrebay_recon::AlignSummary;

    #[test]
    fn default_output_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("data/fleet.xlsx")),
            PathBuf::from("data/fleet-aligned.xlsx")
        );
    }

    #[test]
    fn same_file_sees_through_dot_segments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("fleet.xlsx");
        std::fs::write(&input, b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(same_file(&input, &dir.path().join(".").join("fleet.xlsx")));
        assert!(same_file(&input, &dir.path().join("sub/../fleet.xlsx")));
        assert!(!same_file(&input, &dir.path().join("fleet-aligned.xlsx")));
        assert!(!same_file(&input, &dir.path().join("missing/fleet.xlsx")));
    }

    #[test]
    fn normalize_diagnostics() {
        let v = normalized(" kja234xc ");
        assert_eq!(v.kind, UnitKind::Tractor);
        assert_eq!(v.vehicle_id, "KJA234XC");
        assert_eq!(v.license, "KJA234X");

        let v = normalized("TRK100T");
        assert_eq!(v.kind, UnitKind::Body);
        assert_eq!(v.vehicle_id, "TRK100");

        let v = normalized("APP552THT");
        assert_eq!(v.kind, UnitKind::Body);
        assert_eq!(v.vehicle_id, "APP552THT");
        assert_eq!(v.license, "APP552THT");
    }

    #[test]
    fn summary_mentions_only_nonzero_extras() {
        let report = AlignmentReport {
            branch: "Ibese".into(),
            summary: AlignSummary {
                total_rows: 3,
                both: 1,
                tractor_only: 1,
                neither: 1,
                ambiguous: 2,
                ..AlignSummary::default()
            },
            rows: Vec::new(),
        };
        assert_eq!(
            summary_line(&report),
            "Ibese: 3 plate(s): 1 both, 1 tractor only, 0 body only, 1 unmatched, 2 ambiguous"
        );
    }
}
