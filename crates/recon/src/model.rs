use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Fixed text of the `Action` column.
pub const ACTION: &str = "Vehicle to be presented at Tyre-Bay";

/// Fixed text of the `Remark` column.
pub const REMARK: &str = "Vehicle not yet Presented";

/// Output column headers, in output order.
pub const OUTPUT_HEADERS: [&str; 7] = [
    "Tractor",
    "Body",
    "License",
    "Route",
    "Action",
    "Remark",
    "Date Aligned",
];

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A loosely-typed spreadsheet cell as handed over by a reader.
///
/// Only `Text` takes part in normalization and matching. Every other variant
/// is carried through untouched so a bad cell degrades to "no match" instead
/// of aborting the run.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// True for any non-blank cell that is not text.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Bool(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// Tractor or body, decided from the vehicle ID alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Tractor,
    Body,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tractor => write!(f, "tractor"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// One raw row of the master vehicle list.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterRecord {
    /// Zero-based data row index in the master table. Used for tie-breaks.
    pub row: usize,
    pub vehicle_id: CellValue,
    pub license: CellValue,
    pub route: CellValue,
}

/// A master record with its derived attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedUnit {
    pub row: usize,
    pub kind: UnitKind,
    pub normalized_license: CellValue,
    pub normalized_vehicle_id: CellValue,
    pub route: CellValue,
}

impl ClassifiedUnit {
    pub fn is_body(&self) -> bool {
        self.kind == UnitKind::Body
    }
}

/// One raw row of a branch sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRecord {
    pub row: usize,
    pub key: CellValue,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "Tractor")]
    pub tractor: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "License")]
    pub license: String,
    #[serde(rename = "Route")]
    pub route: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Remark")]
    pub remark: String,
    #[serde(rename = "Date Aligned")]
    pub date_aligned: String,
}

impl OutputRow {
    pub fn new(tractor: String, body: String, license: String, route: String) -> Self {
        Self {
            tractor,
            body,
            license,
            route,
            action: ACTION.to_string(),
            remark: REMARK.to_string(),
            date_aligned: String::new(),
        }
    }

    /// Cells in `OUTPUT_HEADERS` order.
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.tractor,
            &self.body,
            &self.license,
            &self.route,
            &self.action,
            &self.remark,
            &self.date_aligned,
        ]
    }
}

/// Triage bucket of an output row. Declaration order is output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignBucket {
    Both,
    TractorOnly,
    BodyOnly,
    Neither,
}

impl fmt::Display for AlignBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Both => write!(f, "both"),
            Self::TractorOnly => write!(f, "tractor_only"),
            Self::BodyOnly => write!(f, "body_only"),
            Self::Neither => write!(f, "neither"),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignSummary {
    pub total_rows: usize,
    pub both: usize,
    pub tractor_only: usize,
    pub body_only: usize,
    pub neither: usize,
    /// Licenses with more than one distinct tractor or body candidate.
    pub ambiguous: usize,
    /// Non-text cells seen in plate/ID columns of either table.
    pub malformed_cells: usize,
    /// Branch vehicle IDs absent from the master list (vehicle-ID key mode).
    pub unresolved_branch_ids: usize,
    pub bucket_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentReport {
    pub branch: String,
    pub summary: AlignSummary,
    pub rows: Vec<OutputRow>,
}
