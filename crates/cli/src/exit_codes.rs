//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `tyrebay` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Description                                   |
//! |------|-----------------------------------------------|
//! | 0    | Success (unmatched plates are not an error)   |
//! | 1    | General error (unspecified)                   |
//! | 2    | CLI usage error (bad args, no inputs)         |
//! | 3    | Config file failed to parse or validate       |
//! | 4    | Input workbook/CSV/config could not be read   |
//! | 5    | Master or branch sheet not in the workbook    |
//! | 6    | Required column missing from a table          |
//! | 7    | Result workbook/CSV/JSON could not be written |

use tyrebay_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file parsed but was rejected, or did not parse at all.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// An input file could not be opened or decoded.
pub const EXIT_INPUT_READ: u8 = 4;

/// The master sheet or a requested branch sheet does not exist.
pub const EXIT_MISSING_SHEET: u8 = 5;

/// A table lacks a configured column (master or branch).
pub const EXIT_MISSING_COLUMN: u8 = 6;

/// An output file could not be written.
pub const EXIT_OUTPUT_WRITE: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::Csv(_) => EXIT_INPUT_READ,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_CONFIG_INVALID,
            EXIT_INPUT_READ,
            EXIT_MISSING_SHEET,
            EXIT_MISSING_COLUMN,
            EXIT_OUTPUT_WRITE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn recon_errors_map_to_codes() {
        let missing = ReconError::MissingColumn { table: "Master".into(), column: "Route".into() };
        assert_eq!(recon_exit_code(&missing), EXIT_MISSING_COLUMN);
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("x".into())), EXIT_CONFIG_INVALID);
        assert_eq!(recon_exit_code(&ReconError::ConfigValidation("x".into())), EXIT_CONFIG_INVALID);
        assert_eq!(recon_exit_code(&ReconError::Csv("x".into())), EXIT_INPUT_READ);
    }
}
