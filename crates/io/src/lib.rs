// File I/O operations

pub mod csv;
pub mod xlsx;

use std::path::Path;

/// Whether a path names a spreadsheet `xlsx::read_workbook` can open.
pub fn is_workbook(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_extensions() {
        assert!(is_workbook(Path::new("fleet.xlsx")));
        assert!(is_workbook(Path::new("FLEET.XLS")));
        assert!(is_workbook(Path::new("depot/ibese.ods")));
        assert!(!is_workbook(Path::new("master.csv")));
        assert!(!is_workbook(Path::new("master")));
    }
}
