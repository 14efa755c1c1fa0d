use crate::storage::schema::CACHE_DDL;
use anyhow::Context;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod key;

/// Sentiment scores keyed by model fingerprint and text hash.
///
/// Kept in a separate database file: the `SENTIMENT` function runs while the
/// chat-log connection holds a write transaction, so it cannot write back
/// through that connection.
#[derive(Clone)]
pub struct PredictionCache {
    conn: Arc<Mutex<Connection>>,
}

impl PredictionCache {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create cache directory: {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cache db: {}", path.display()))?;
        Self::init(conn)
    }

    /// Opens an existing cache without creating or migrating anything.
    pub fn open_read_only(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open cache db: {}", path.display()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory cache db")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(CACHE_DDL)
            .context("failed to initialize cache schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("prediction cache lock poisoned"))
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<f64>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT value FROM sentiment_cache WHERE key=?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn put(&self, key: &str, model: &str, value: f64) -> anyhow::Result<()> {
        let conn = self.lock()?;
        let created_at = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sentiment_cache(key, model, value, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, created_at=excluded.created_at",
            params![key, model, value, created_at],
        )?;
        Ok(())
    }

    pub fn len(&self) -> anyhow::Result<u64> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM sentiment_cache", [], |r| r.get(0))?;
        Ok(n as u64)
    }

    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.len()? == 0)
    }
}
