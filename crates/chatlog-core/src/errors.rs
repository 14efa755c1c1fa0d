use std::fmt;

/// Error raised while reading or validating `chatlog.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Input database does not have the shape the extractors need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTableError {
    pub table: String,
    pub missing_columns: Vec<String>,
}

impl fmt::Display for SourceTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing_columns.is_empty() {
            write!(f, "source table '{}' not found in database", self.table)
        } else {
            write!(
                f,
                "source table '{}' is missing columns: {}",
                self.table,
                self.missing_columns.join(", ")
            )
        }
    }
}

impl std::error::Error for SourceTableError {}
