//! The `SENTIMENT(text)` scalar function and the `sentiment` table built from it.

use crate::cache::key::sentiment_cache_key;
use crate::cache::PredictionCache;
use crate::sentiment::{text_to_sentiment, SentimentModel};
use crate::storage::schema::SENTIMENT_DDL;
use anyhow::Context;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const SENTIMENT_FN: &str = "SENTIMENT";

const EXTRACT_SENTIMENTS: &str = r#"
INSERT INTO sentiment(message_id, value)
SELECT message_id, SENTIMENT(text) FROM answer
"#;

/// Counters shared with the registered function.
#[derive(Debug, Default)]
pub struct SentimentCounters {
    pub predictions: AtomicU64,
    pub cache_hits: AtomicU64,
}

impl SentimentCounters {
    pub fn predictions(&self) -> u64 {
        self.predictions.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }
}

struct SentimentFn {
    model: Arc<dyn SentimentModel>,
    cache: Option<PredictionCache>,
    counters: Arc<SentimentCounters>,
    fingerprint: String,
}

impl SentimentFn {
    fn score(&self, text: &str) -> anyhow::Result<f64> {
        let key = self
            .cache
            .as_ref()
            .map(|_| sentiment_cache_key(&self.fingerprint, text));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(v) = cache.get(key)? {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(v);
            }
        }

        let v = text_to_sentiment(self.model.as_ref(), text)?;
        self.counters.predictions.fetch_add(1, Ordering::Relaxed);

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            cache.put(key, self.model.name(), v)?;
        }
        Ok(v)
    }
}

/// Registers `SENTIMENT(text) -> REAL` on `conn`. NULL text is scored as the
/// empty string. A model error aborts the statement that called the function.
pub fn register_sentiment_function(
    conn: &Connection,
    model: Arc<dyn SentimentModel>,
    cache: Option<PredictionCache>,
) -> anyhow::Result<Arc<SentimentCounters>> {
    let counters = Arc::new(SentimentCounters::default());
    let state = AssertUnwindSafe(SentimentFn {
        fingerprint: model.fingerprint(),
        model,
        cache,
        counters: counters.clone(),
    });

    conn.create_scalar_function(
        SENTIMENT_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let text: Option<String> = ctx.get(0)?;
            state
                .score(text.as_deref().unwrap_or(""))
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))
        },
    )
    .context("failed to register SENTIMENT function")?;

    Ok(counters)
}

pub fn create_sentiment_table(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(SENTIMENT_DDL)
        .context("failed to create sentiment table")
}

/// Requires [`register_sentiment_function`] on the same connection.
/// Returns the number of rows written.
pub fn extract_sentiments(conn: &Connection) -> anyhow::Result<usize> {
    let n = conn
        .execute(EXTRACT_SENTIMENTS, [])
        .context("failed to extract sentiments")?;
    tracing::debug!(event = "sentiments_extracted", rows = n);
    Ok(n)
}
