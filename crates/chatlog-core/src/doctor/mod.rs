pub mod model;

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::cache::PredictionCache;
use crate::model::ChatlogConfig;
use crate::sentiment::build_model;
use crate::storage::Store;

use model::*;

#[derive(Debug, Clone)]
pub struct DoctorOptions {
    pub config_path: Option<PathBuf>,
    /// Skip loading the sentiment model (it may be slow or remote).
    pub check_model: bool,
}

pub fn doctor(cfg: &ChatlogConfig, opts: &DoctorOptions) -> anyhow::Result<DoctorReport> {
    let mut notes = vec![];
    let mut diagnostics: Vec<Diagnostic> = vec![];

    // 1) Database and source table
    let db = summarize_db(&cfg.db, &mut diagnostics);

    // 2) Model (best-effort)
    let model = if opts.check_model {
        match build_model(&cfg.sentiment) {
            Ok(m) => Some(ModelSummary {
                provider: cfg.sentiment.provider.to_string(),
                name: m.name().to_string(),
                fingerprint: m.fingerprint(),
            }),
            Err(e) => {
                diagnostics.push(Diagnostic::error(codes::E_MODEL_LOAD, format!("{:#}", e)));
                None
            }
        }
    } else {
        notes.push("model check skipped".to_string());
        None
    };

    // 3) Cache (only when enabled)
    let cache = if cfg.sentiment.cache_enabled() {
        Some(summarize_cache(
            &cfg.sentiment.cache_path(),
            &mut diagnostics,
            &mut notes,
        ))
    } else {
        notes.push("prediction cache disabled".to_string());
        None
    };

    let suggested_actions = suggest_from(&diagnostics, cfg);

    Ok(DoctorReport {
        schema_version: 1,
        generated_at: Utc::now().to_rfc3339(),
        chatlog_version: env!("CARGO_PKG_VERSION").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        inputs: DoctorInputs {
            config_path: opts.config_path.as_ref().map(|p| p.display().to_string()),
            db_path: cfg.db.display().to_string(),
            provider: cfg.sentiment.provider.to_string(),
        },
        db,
        model,
        cache,
        diagnostics,
        suggested_actions,
        notes,
    })
}

fn summarize_db(path: &Path, diags: &mut Vec<Diagnostic>) -> Option<DbSummary> {
    if path.as_os_str() != ":memory:" && !path.exists() {
        diags.push(Diagnostic::error(
            codes::E_DB_MISSING,
            format!("database not found: {}", path.display()),
        ));
        return None;
    }

    let store = match Store::open(path) {
        Ok(s) => s,
        Err(e) => {
            diags.push(Diagnostic::error(codes::E_DB_OPEN, format!("{:#}", e)));
            return None;
        }
    };

    let status = match store.source_table_status() {
        Ok(s) => s,
        Err(e) => {
            diags.push(Diagnostic::error(codes::E_DB_OPEN, format!("{:#}", e)));
            return None;
        }
    };

    if !status.exists {
        diags.push(Diagnostic::error(
            codes::E_SOURCE_TABLE_MISSING,
            "table 'answer' not found",
        ));
    } else if !status.missing_columns.is_empty() {
        diags.push(Diagnostic::error(
            codes::E_SOURCE_COLUMNS_MISSING,
            format!(
                "table 'answer' is missing columns: {}",
                status.missing_columns.join(", ")
            ),
        ));
    }

    let stats = store.stats_best_effort();
    if stats.answer_rows == Some(0) {
        diags.push(Diagnostic::warn(
            codes::W_SOURCE_EMPTY,
            "table 'answer' has no rows; derived tables will be empty",
        ));
    }

    Some(DbSummary {
        path: path.display().to_string(),
        size_bytes: std::fs::metadata(path).ok().map(|m| m.len()),
        answer_exists: status.exists,
        missing_columns: if status.exists {
            status.missing_columns
        } else {
            vec![]
        },
        answer_rows: stats.answer_rows,
        message_replies_rows: stats.message_replies_rows,
        sentiment_rows: stats.sentiment_rows,
    })
}

fn summarize_cache(
    path: &Path,
    diags: &mut Vec<Diagnostic>,
    notes: &mut Vec<String>,
) -> CacheSummary {
    let entries = if !path.exists() {
        notes.push(format!(
            "prediction cache {} does not exist yet; it is created on the first cached run",
            path.display()
        ));
        None
    } else {
        match PredictionCache::open_read_only(path).and_then(|c| c.len()) {
            Ok(n) => Some(n),
            Err(e) => {
                diags.push(Diagnostic::warn(codes::W_CACHE_OPEN, format!("{:#}", e)));
                None
            }
        }
    };
    CacheSummary {
        path: path.display().to_string(),
        entries,
    }
}

fn suggest_from(diags: &[Diagnostic], cfg: &ChatlogConfig) -> Vec<SuggestedAction> {
    let db = cfg.db.display();
    diags
        .iter()
        .filter_map(|d| {
            let (title, steps) = match d.code.as_str() {
                codes::E_DB_MISSING => (
                    "Point chatlog at the exported database",
                    vec!["chatlog run --db <path/to/result.db>".to_string()],
                ),
                codes::E_SOURCE_TABLE_MISSING | codes::E_SOURCE_COLUMNS_MISSING => (
                    "Check the chat export schema",
                    vec![format!("sqlite3 {} '.schema answer'", db)],
                ),
                codes::E_MODEL_LOAD => (
                    "Provide a sentiment model",
                    vec![
                        "chatlog init".to_string(),
                        format!("chatlog run --db {} --model sentiment-model.json", db),
                    ],
                ),
                _ => return None,
            };
            Some(SuggestedAction {
                title: title.to_string(),
                relates_to: d.code.clone(),
                steps,
            })
        })
        .collect()
}
