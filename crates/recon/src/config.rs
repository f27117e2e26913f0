use std::collections::HashSet;

use serde::Deserialize;

use crate::error::ReconError;
use crate::table::MasterColumns;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Alignment run config (`*.align.toml`). Every field has a default, so an
/// empty document is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlignConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub master: MasterConfig,
    #[serde(default)]
    pub branch: BranchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            master: MasterConfig::default(),
            branch: BranchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_name() -> String {
    "alignment".into()
}

// ---------------------------------------------------------------------------
// Master
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MasterConfig {
    #[serde(default = "default_master_sheet")]
    pub sheet: String,
    #[serde(default = "default_vehicle_id_column")]
    pub vehicle_id: String,
    #[serde(default = "default_license_column")]
    pub license: String,
    #[serde(default = "default_route_column")]
    pub route: String,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            sheet: default_master_sheet(),
            vehicle_id: default_vehicle_id_column(),
            license: default_license_column(),
            route: default_route_column(),
        }
    }
}

impl MasterConfig {
    pub fn columns(&self) -> MasterColumns<'_> {
        MasterColumns {
            vehicle_id: &self.vehicle_id,
            license: &self.license,
            route: &self.route,
        }
    }
}

fn default_master_sheet() -> String {
    "Master".into()
}

fn default_vehicle_id_column() -> String {
    "Vehicle#".into()
}

fn default_license_column() -> String {
    "License".into()
}

fn default_route_column() -> String {
    "Route".into()
}

// ---------------------------------------------------------------------------
// Branch
// ---------------------------------------------------------------------------

/// Which branch column licenses are derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKey {
    /// Branch rows carry license plates.
    #[default]
    License,
    /// Branch rows carry vehicle IDs, resolved to licenses via the master list.
    VehicleId,
}

impl std::fmt::Display for BranchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::License => write!(f, "license"),
            Self::VehicleId => write!(f, "vehicle_id"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchConfig {
    #[serde(default)]
    pub key: BranchKey,
    #[serde(default = "default_license_column")]
    pub license: String,
    #[serde(default = "default_vehicle_id_column")]
    pub vehicle_id: String,
    /// Branch sheets to process. Empty = every sheet except the master.
    #[serde(default)]
    pub sheets: Vec<String>,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            key: BranchKey::default(),
            license: default_license_column(),
            vehicle_id: default_vehicle_id_column(),
            sheets: Vec::new(),
        }
    }
}

impl BranchConfig {
    /// Column holding the branch key for the configured mode.
    pub fn key_column(&self) -> &str {
        match self.key {
            BranchKey::License => &self.license,
            BranchKey::VehicleId => &self.vehicle_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

pub const BRANCH_PLACEHOLDER: &str = "{branch}";

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_true")]
    pub freeze_header: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sheet_name: default_sheet_name(),
            freeze_header: true,
        }
    }
}

impl OutputConfig {
    /// Result sheet name for a branch, cut to the spreadsheet limit.
    pub fn sheet_name_for(&self, branch: &str) -> String {
        self.sheet_name
            .replace(BRANCH_PLACEHOLDER, branch)
            .chars()
            .take(MAX_SHEET_NAME_LEN)
            .collect()
    }
}

fn default_sheet_name() -> String {
    "{branch} Alignment".into()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AlignConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: AlignConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let columns = [
            ("master.sheet", &self.master.sheet),
            ("master.vehicle_id", &self.master.vehicle_id),
            ("master.license", &self.master.license),
            ("master.route", &self.master.route),
            ("branch.license", &self.branch.license),
            ("branch.vehicle_id", &self.branch.vehicle_id),
        ];
        for (field, value) in columns {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{field} must not be empty")));
            }
        }

        let mut seen = HashSet::new();
        for sheet in &self.branch.sheets {
            if sheet.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "branch.sheets contains an empty name".into(),
                ));
            }
            if sheet == &self.master.sheet {
                return Err(ReconError::ConfigValidation(format!(
                    "branch sheet '{sheet}' is also the master sheet"
                )));
            }
            if !seen.insert(sheet.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "branch sheet '{sheet}' listed twice"
                )));
            }
        }

        if !self.output.sheet_name.contains(BRANCH_PLACEHOLDER) {
            return Err(ReconError::ConfigValidation(format!(
                "output.sheet_name must contain {BRANCH_PLACEHOLDER}"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Weekly alignment"

[master]
sheet = "Fleet"
vehicle_id = "Vehicle No"
license = "Plate"
route = "Route"

[branch]
key = "vehicle_id"
vehicle_id = "Truck"
sheets = ["Obajana", "Ibese"]

[output]
sheet_name = "{branch} Tyre-Bay"
freeze_header = false
"#;

    #[test]
    fn parse_full() {
        let config = AlignConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Weekly alignment");
        assert_eq!(config.master.sheet, "Fleet");
        assert_eq!(config.master.vehicle_id, "Vehicle No");
        assert_eq!(config.branch.key, BranchKey::VehicleId);
        assert_eq!(config.branch.key_column(), "Truck");
        assert_eq!(config.branch.license, "License");
        assert_eq!(config.branch.sheets, vec!["Obajana", "Ibese"]);
        assert!(!config.output.freeze_header);
        assert_eq!(config.output.sheet_name_for("Ibese"), "Ibese Tyre-Bay");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = AlignConfig::from_toml("").unwrap();
        assert_eq!(config.name, "alignment");
        assert_eq!(config.master.sheet, "Master");
        assert_eq!(config.master.vehicle_id, "Vehicle#");
        assert_eq!(config.master.license, "License");
        assert_eq!(config.master.route, "Route");
        assert_eq!(config.branch.key, BranchKey::License);
        assert_eq!(config.branch.key_column(), "License");
        assert!(config.branch.sheets.is_empty());
        assert!(config.output.freeze_header);
        assert_eq!(config.output.sheet_name_for("Obajana"), "Obajana Alignment");
    }

    #[test]
    fn default_matches_empty_document() {
        let config = AlignConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.name, "alignment");
        assert_eq!(config.master.sheet, "Master");
    }

    #[test]
    fn sheet_name_is_truncated() {
        let config = AlignConfig::default();
        let name = config.output.sheet_name_for("A Very Long Depot Name Indeed");
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn reject_unknown_key_mode() {
        let err = AlignConfig::from_toml("[branch]\nkey = \"plate\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_unknown_field() {
        let err = AlignConfig::from_toml("[master]\nsheets = \"x\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_column() {
        let err = AlignConfig::from_toml("[master]\nroute = \" \"\n").unwrap_err();
        assert!(err.to_string().contains("master.route"));
    }

    #[test]
    fn reject_master_as_branch() {
        let err = AlignConfig::from_toml("[branch]\nsheets = [\"Master\"]\n").unwrap_err();
        assert!(err.to_string().contains("also the master sheet"));
    }

    #[test]
    fn reject_duplicate_branch() {
        let err = AlignConfig::from_toml("[branch]\nsheets = [\"Ibese\", \"Ibese\"]\n").unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn reject_sheet_name_without_placeholder() {
        let err = AlignConfig::from_toml("[output]\nsheet_name = \"Result\"\n").unwrap_err();
        assert!(err.to_string().contains("{branch}"));
    }
}
