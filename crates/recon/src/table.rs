//! Raw tables as handed over by the spreadsheet/CSV readers, and extraction
//! of typed records from them.

use crate::error::ReconError;
use crate::model::{BranchRecord, CellValue, MasterRecord};

/// A header row plus data rows. Rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Parse CSV text. The first record is the header; empty fields become
    /// `CellValue::Empty`, everything else `Text`.
    pub fn from_csv_str(name: &str, content: &str, delimiter: u8) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ReconError::Csv(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ReconError::Csv(e.to_string()))?;
            rows.push(record.iter().map(CellValue::from).collect());
        }

        Ok(Self::new(name, headers, rows))
    }

    /// Index of the header equal to `name` (surrounding whitespace ignored).
    pub fn column_index(&self, name: &str) -> Result<usize, ReconError> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h.trim() == wanted)
            .ok_or_else(|| ReconError::MissingColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Cell at `(row, col)`; `Empty` past the end of a short row.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column names of the master vehicle list.
#[derive(Debug, Clone, Copy)]
pub struct MasterColumns<'a> {
    pub vehicle_id: &'a str,
    pub license: &'a str,
    pub route: &'a str,
}

/// Pull master records out of a table. All three columns are required; the
/// whole table is rejected before any row is read if one is missing.
pub fn master_records(
    table: &Table,
    columns: MasterColumns<'_>,
) -> Result<Vec<MasterRecord>, ReconError> {
    let vehicle_idx = table.column_index(columns.vehicle_id)?;
    let license_idx = table.column_index(columns.license)?;
    let route_idx = table.column_index(columns.route)?;

    Ok((0..table.len())
        .map(|row| MasterRecord {
            row,
            vehicle_id: table.cell(row, vehicle_idx).clone(),
            license: table.cell(row, license_idx).clone(),
            route: table.cell(row, route_idx).clone(),
        })
        .collect())
}

/// Pull the key column (license or vehicle ID) out of a branch table.
pub fn branch_records(table: &Table, key_column: &str) -> Result<Vec<BranchRecord>, ReconError> {
    let key_idx = table.column_index(key_column)?;
    Ok((0..table.len())
        .map(|row| BranchRecord {
            row,
            key: table.cell(row, key_idx).clone(),
        })
        .collect())
}
