use crate::cache::PredictionCache;
use crate::model::{RunSummary, Step, StepOutcome};
use crate::replies::{create_message_replies_table, extract_message_replies};
use crate::sentiment::SentimentModel;
use crate::sqlfn::{create_sentiment_table, extract_sentiments, register_sentiment_function};
use crate::storage::Store;
use std::sync::Arc;
use std::time::Instant;

/// Rebuilds the derived tables, one transaction per step.
pub struct Pipeline {
    pub model: Option<Arc<dyn SentimentModel>>,
    pub cache: Option<PredictionCache>,
}

impl Pipeline {
    pub fn new(model: Option<Arc<dyn SentimentModel>>, cache: Option<PredictionCache>) -> Self {
        Self { model, cache }
    }

    pub fn run(&self, store: &mut Store, steps: &[Step]) -> anyhow::Result<RunSummary> {
        let started = Instant::now();
        store.require_source_table()?;

        if steps.contains(&Step::Sentiment) && self.model.is_none() {
            anyhow::bail!("config error: sentiment step requires a model (see --provider/--model)");
        }

        let db = store
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());

        let mut outcomes = Vec::new();
        let mut predictions = 0;
        let mut cache_hits = 0;

        for step in steps {
            let step_started = Instant::now();
            tracing::info!(event = "step_start", step = %step, db = %db);

            let rows = match step {
                Step::Replies => store.in_transaction(|tx| {
                    create_message_replies_table(tx)?;
                    extract_message_replies(tx)
                })?,
                Step::Sentiment => {
                    let model = self
                        .model
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("sentiment model missing"))?;
                    let counters =
                        register_sentiment_function(store.conn(), model, self.cache.clone())?;
                    let rows = store.in_transaction(|tx| {
                        create_sentiment_table(tx)?;
                        extract_sentiments(tx)
                    })?;
                    predictions += counters.predictions();
                    cache_hits += counters.cache_hits();
                    rows
                }
            };

            let duration_ms = step_started.elapsed().as_millis() as u64;
            tracing::info!(
                event = "step_done",
                step = %step,
                table = step.table(),
                rows,
                duration_ms
            );
            outcomes.push(StepOutcome {
                step: *step,
                table: step.table().to_string(),
                rows: rows as u64,
                duration_ms,
            });
        }

        Ok(RunSummary {
            db,
            steps: outcomes,
            model: self.model.as_ref().map(|m| m.name().to_string()),
            predictions,
            cache_hits,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}
