use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty column name, bad sheet list, etc.).
    ConfigValidation(String),
    /// Missing required column in an input table.
    MissingColumn { table: String, column: String },
    /// Malformed CSV text.
    Csv(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "table '{table}': missing column '{column}'")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
