//! `tyrebay-recon`: fleet master list vs. branch plate reconciliation.
//!
//! Pure engine crate: receives pre-loaded tables, returns triaged alignment
//! reports. No CLI or file IO.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod table;
pub mod triage;

pub use classify::{is_body, is_body_str};
pub use config::{AlignConfig, BranchKey};
pub use engine::{align_branch, generate_report, MasterList};
pub use error::ReconError;
pub use model::{AlignBucket, AlignSummary, AlignmentReport, CellValue, OutputRow, UnitKind};
pub use normalize::{normalize_license, normalize_license_str, normalize_vehicle_id, normalize_vehicle_id_str};
pub use table::Table;
