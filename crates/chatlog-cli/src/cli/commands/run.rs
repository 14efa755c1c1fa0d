use super::{exit_codes, resolve_config};
use crate::cli::args::RunArgs;
use chatlog_core::cache::PredictionCache;
use chatlog_core::engine::Pipeline;
use chatlog_core::model::Step;
use chatlog_core::sentiment::build_model;
use chatlog_core::storage::Store;

pub fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let (cfg, _) = resolve_config(&args.db, Some(&args.model))?;

    let steps: Vec<Step> = if args.only.is_empty() {
        cfg.effective_steps()
    } else {
        Step::ALL
            .iter()
            .copied()
            .filter(|s| args.only.contains(s))
            .collect()
    };

    let mut store = Store::open(&cfg.db)?;
    // Fail on a bad export before loading a possibly slow model.
    store.require_source_table()?;

    let (model, cache) = if steps.contains(&Step::Sentiment) {
        let model = build_model(&cfg.sentiment)?;
        tracing::info!(
            event = "model_loaded",
            provider = %cfg.sentiment.provider,
            model = model.name(),
            fingerprint = %model.fingerprint()
        );
        let cache = if cfg.sentiment.cache_enabled() {
            Some(PredictionCache::open(&cfg.sentiment.cache_path())?)
        } else {
            None
        };
        (Some(model), cache)
    } else {
        (None, None)
    };

    let summary = Pipeline::new(model, cache).run(&mut store, &steps)?;
    chatlog_core::report::console::print_summary(&summary);

    Ok(exit_codes::OK)
}
