use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    pub schema_version: u32,    // 1
    pub generated_at: String,   // rfc3339
    pub chatlog_version: String, // e.g. "0.1.0"
    pub platform: PlatformInfo,

    pub inputs: DoctorInputs,
    pub db: Option<DbSummary>,
    pub model: Option<ModelSummary>,
    pub cache: Option<CacheSummary>,

    pub diagnostics: Vec<Diagnostic>,
    pub suggested_actions: Vec<SuggestedAction>,
    pub notes: Vec<String>,
}

impl DoctorReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInputs {
    pub config_path: Option<String>,
    pub db_path: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbSummary {
    pub path: String,
    pub size_bytes: Option<u64>,
    pub answer_exists: bool,
    pub missing_columns: Vec<String>,
    pub answer_rows: Option<u64>,
    pub message_replies_rows: Option<u64>,
    pub sentiment_rows: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub provider: String,
    pub name: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSummary {
    pub path: String,
    pub entries: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warn(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Warn,
            message: message.into(),
        }
    }
}

pub mod codes {
    pub const E_DB_MISSING: &str = "E_DB_MISSING";
    pub const E_DB_OPEN: &str = "E_DB_OPEN";
    pub const E_SOURCE_TABLE_MISSING: &str = "E_SOURCE_TABLE_MISSING";
    pub const E_SOURCE_COLUMNS_MISSING: &str = "E_SOURCE_COLUMNS_MISSING";
    pub const E_MODEL_LOAD: &str = "E_MODEL_LOAD";
    pub const W_SOURCE_EMPTY: &str = "W_SOURCE_EMPTY";
    pub const W_CACHE_OPEN: &str = "W_CACHE_OPEN";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub title: String,
    pub relates_to: String, // diagnostic code
    pub steps: Vec<String>, // copy/paste commands
}
