// Excel workbook import (xlsx, xls, xlsb, ods) and alignment report export (xlsx only)
//
// Import: every sheet becomes a header + rows table of loosely typed cells.
// Export: one plain sheet per branch report. Not a round-trip format.

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};
use tyrebay_recon::config::MAX_SHEET_NAME_LEN;
use tyrebay_recon::model::OUTPUT_HEADERS;
use tyrebay_recon::{AlignmentReport, CellValue, Table};

/// Column width bounds, in Excel character units.
const MIN_COL_WIDTH: usize = 8;
const MAX_COL_WIDTH: usize = 60;

/// Characters Excel refuses in sheet names.
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

// ============================================================================
// Import
// ============================================================================

/// Read every sheet of a workbook, in workbook order.
pub fn read_workbook(path: &Path) -> Result<Vec<Table>, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut tables = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;
        let table = table_from_range(sheet_name, &range);
        log::debug!(
            "sheet '{}': {} column(s), {} row(s)",
            sheet_name,
            table.headers.len(),
            table.len()
        );
        tables.push(table);
    }

    Ok(tables)
}

/// Build a table from a sheet range. The first non-empty row is the header;
/// fully empty rows after it are dropped.
pub fn table_from_range(name: &str, range: &Range<Data>) -> Table {
    let mut rows = range
        .rows()
        .skip_while(|row| row.iter().all(is_empty_data));

    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|d| cell_from_data(d).to_string().trim().to_string())
            .collect(),
        None => return Table::new(name, Vec::new(), Vec::new()),
    };

    let rows: Vec<Vec<CellValue>> = rows
        .filter(|row| !row.iter().all(is_empty_data))
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Table::new(name, headers, rows)
}

/// Map a calamine cell to an engine cell.
///
/// Dates arrive as serial numbers and error cells as empty, so neither can
/// ever match a plate.
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

fn is_empty_data(data: &Data) -> bool {
    match data {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// ============================================================================
// Export
// ============================================================================

/// One result sheet: the report and the sheet name it is written under.
#[derive(Debug, Clone, Copy)]
pub struct ReportSheet<'a> {
    pub name: &'a str,
    pub report: &'a AlignmentReport,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub rows_exported: usize,
}

/// Write one sheet per report: bold header row, optional header freeze,
/// column widths fitted to content.
pub fn write_reports(
    path: &Path,
    sheets: &[ReportSheet<'_>],
    freeze_header: bool,
) -> Result<ExportResult, String> {
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();

    let names: Vec<&str> = sheets.iter().map(|s| s.name).collect();
    for (sheet, sheet_name) in sheets.iter().zip(unique_sheet_names(&names)) {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet_name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;

        write_report_cells(worksheet, sheet.report, &header_format)?;
        apply_layout(worksheet, sheet.report, freeze_header)?;

        result.rows_exported += sheet.report.rows.len();
        result.sheets_exported += 1;
    }

    if sheets.is_empty() {
        // A workbook needs at least one sheet to open cleanly.
        xlsx_workbook.add_worksheet();
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    Ok(result)
}

fn write_report_cells(
    worksheet: &mut Worksheet,
    report: &AlignmentReport,
    header_format: &Format,
) -> Result<(), String> {
    for (col, header) in OUTPUT_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for (idx, row) in report.rows.iter().enumerate() {
        let xl_row = idx as u32 + 1;
        for (col, value) in row.cells().iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(xl_row, col as u16, *value)
                .map_err(|e| format!("Failed to write row {}: {}", xl_row + 1, e))?;
        }
    }

    Ok(())
}

/// Apply column widths and the frozen header row.
fn apply_layout(
    worksheet: &mut Worksheet,
    report: &AlignmentReport,
    freeze_header: bool,
) -> Result<(), String> {
    for (col, width) in column_widths(report).into_iter().enumerate() {
        worksheet
            .set_column_width(col as u16, width as f64)
            .map_err(|e| format!("Failed to set column {} width: {}", col, e))?;
    }

    if freeze_header {
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| format!("Failed to set freeze panes: {}", e))?;
    }

    Ok(())
}

/// Widest value per output column plus padding, clamped.
pub fn column_widths(report: &AlignmentReport) -> Vec<usize> {
    OUTPUT_HEADERS
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let widest = report
                .rows
                .iter()
                .map(|row| row.cells()[col].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (widest + 2).clamp(MIN_COL_WIDTH, MAX_COL_WIDTH)
        })
        .collect()
}

/// Replace characters Excel rejects in sheet names.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sanitized sheet names, made unique (case-insensitively, as Excel compares
/// them) within the sheet name length limit. A repeated name gets a ` (2)`,
/// ` (3)`, ... suffix in place of its tail.
pub fn unique_sheet_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let base: String = sanitize_sheet_name(name.as_ref())
            .chars()
            .take(MAX_SHEET_NAME_LEN)
            .collect();
        let mut candidate = base.clone();
        let mut n = 2;
        while !taken.insert(candidate.to_lowercase()) {
            let suffix = format!(" ({n})");
            let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            let head: String = base.chars().take(keep).collect();
            candidate = format!("{}{suffix}", head.trim_end());
            n += 1;
        }
        if candidate != base {
            log::warn!("result name '{}' already used, writing as '{}'", base, candidate);
        }
        out.push(candidate);
    }

    out
}
