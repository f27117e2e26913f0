// CSV/TSV table import and alignment report export

use std::io::Read;
use std::path::Path;

use tyrebay_recon::model::OUTPUT_HEADERS;
use tyrebay_recon::{AlignmentReport, Table};

/// Import a CSV/TSV file as a table named after the file stem.
pub fn import(path: &Path) -> Result<Table, String> {
    import_table(path, &table_name_from_path(path))
}

/// Import a CSV/TSV file as a table with the given name. The first record is
/// the header; the delimiter is sniffed from the content.
pub fn import_table(path: &Path, name: &str) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    Table::from_csv_str(name, &content, delimiter)
        .map_err(|e| format!("{}: {}", path.display(), e))
}

/// Table name for a file: its stem, or the whole file name when there is none.
pub fn table_name_from_path(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [u8; 4] = [b'\t', b';', b',', b'|'];

/// Lines sampled when sniffing the delimiter.
const SNIFF_LINES: usize = 10;

/// Pick the delimiter whose field count is most consistent with the header
/// line across the first few lines. A candidate must split the header into
/// at least two fields; single-column files fall back to comma.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(SNIFF_LINES).collect();
    let Some(header) = sample.first() else {
        return b',';
    };

    let mut best = (0usize, b',');
    for delim in DELIMITERS {
        let width = field_count(header, delim);
        if width < 2 {
            continue;
        }
        let agreeing = sample.iter().filter(|line| field_count(line, delim) == width).count();
        let score = agreeing * width;
        if score > best.0 {
            best = (score, delim);
        }
    }
    best.1
}

/// Fields in one line for a delimiter, honoring quotes.
fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map_or(1, |r| r.len())
}

/// Read file and convert to UTF-8 if needed (Excel-exported CSVs are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Write one report as comma-separated values with the output header row.
pub fn export_report(report: &AlignmentReport, path: &Path) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;

    writer
        .write_record(OUTPUT_HEADERS)
        .map_err(|e| e.to_string())?;
    for row in &report.rows {
        writer.write_record(row.cells()).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
