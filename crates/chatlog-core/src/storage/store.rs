use crate::errors::SourceTableError;
use crate::storage::schema::{
    MESSAGE_REPLIES_TABLE, SENTIMENT_TABLE, SOURCE_COLUMNS, SOURCE_TABLE,
};
use anyhow::Context;
use rusqlite::{params, Connection, Transaction};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTableStatus {
    pub exists: bool,
    pub missing_columns: Vec<String>,
}

impl SourceTableStatus {
    pub fn is_usable(&self) -> bool {
        self.exists && self.missing_columns.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableStats {
    pub answer_rows: Option<u64>,
    pub message_replies_rows: Option<u64>,
    pub sentiment_rows: Option<u64>,
    pub user_version: Option<i64>,
}

impl Store {
    /// Opens an existing chat-log database. Unlike `Connection::open` this
    /// refuses to create a fresh file, since an empty db can never hold `answer`.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if path.as_os_str() == ":memory:" {
            return Self::memory();
        }
        if !path.exists() {
            anyhow::bail!("database not found: {}", path.display());
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db: {}", path.display()))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside a transaction. The transaction is rolled back when `f`
    /// fails, so a half-built derived table never becomes visible.
    pub fn in_transaction<T>(
        &mut self,
        f: impl FnOnce(&Transaction<'_>) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let tx = self.conn.transaction().context("failed to begin transaction")?;
        let out = f(&tx)?;
        tx.commit().context("failed to commit transaction")?;
        Ok(out)
    }

    pub fn table_exists(&self, table: &str) -> anyhow::Result<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            params![table],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn source_table_status(&self) -> anyhow::Result<SourceTableStatus> {
        if !self.table_exists(SOURCE_TABLE)? {
            return Ok(SourceTableStatus {
                exists: false,
                missing_columns: SOURCE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            });
        }
        let cols = get_columns(&self.conn, SOURCE_TABLE)?;
        let missing_columns = SOURCE_COLUMNS
            .iter()
            .filter(|c| !cols.contains(**c))
            .map(|c| c.to_string())
            .collect();
        Ok(SourceTableStatus {
            exists: true,
            missing_columns,
        })
    }

    pub fn require_source_table(&self) -> anyhow::Result<()> {
        let status = self.source_table_status()?;
        if status.is_usable() {
            return Ok(());
        }
        Err(SourceTableError {
            table: SOURCE_TABLE.to_string(),
            missing_columns: if status.exists {
                status.missing_columns
            } else {
                vec![]
            },
        }
        .into())
    }

    pub fn count_rows(&self, table: &str) -> anyhow::Result<i64> {
        // Validation to prevent SQL injection (simple allowlist)
        if ![SOURCE_TABLE, MESSAGE_REPLIES_TABLE, SENTIMENT_TABLE].contains(&table) {
            anyhow::bail!("Invalid table name for count_rows: {}", table);
        }
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n)
    }

    pub fn stats_best_effort(&self) -> TableStats {
        let count = |table: &str| -> Option<u64> {
            match self.table_exists(table) {
                Ok(true) => self.count_rows(table).ok().map(|n| n as u64),
                _ => None,
            }
        };

        let user_version: Option<i64> = self
            .conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .ok();

        TableStats {
            answer_rows: count(SOURCE_TABLE),
            message_replies_rows: count(MESSAGE_REPLIES_TABLE),
            sentiment_rows: count(SENTIMENT_TABLE),
            user_version,
        }
    }
}

fn get_columns(conn: &Connection, table: &str) -> anyhow::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut out = HashSet::new();
    for r in rows {
        out.insert(r?);
    }
    Ok(out)
}
