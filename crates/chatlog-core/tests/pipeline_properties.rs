use chatlog_core::engine::Pipeline;
use chatlog_core::model::Step;
use chatlog_core::sentiment::fake::FakeModel;
use chatlog_core::sentiment::{Prediction, SentimentLabel, SentimentModel};
use chatlog_core::storage::Store;
use std::collections::HashMap;
use std::sync::Arc;

const CHAT: &str = r#"
CREATE TABLE answer (
    message_id INTEGER,
    date TEXT,
    text TEXT,
    reply_to_msg_id INTEGER
);
INSERT INTO answer VALUES (10, '2021-01-01', 'good morning everyone', NULL);
INSERT INTO answer VALUES (11, '2021-01-01', 'bad weather today', 10);
INSERT INTO answer VALUES (12, '2021-01-01', 'good point', 10);
INSERT INTO answer VALUES (13, '2021-01-01', '', 10);
INSERT INTO answer VALUES (14, '2021-01-02', 'sticker', 11);
INSERT INTO answer VALUES (15, '2021-01-02', NULL, 11);
INSERT INTO answer VALUES (16, '2021-01-02', 'meh', NULL);
"#;

fn seeded_store() -> anyhow::Result<Store> {
    let store = Store::memory()?;
    store.conn().execute_batch(CHAT)?;
    Ok(store)
}

fn fake() -> Arc<dyn SentimentModel> {
    Arc::new(FakeModel::keyword())
}

fn table(store: &Store, sql: &str) -> anyhow::Result<HashMap<i64, f64>> {
    let mut stmt = store.conn().prepare(sql)?;
    let rows = stmt
        .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, f64>(1)?)))?
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

#[test]
fn replies_count_matches_non_empty_replies() -> anyhow::Result<()> {
    let mut store = seeded_store()?;
    Pipeline::new(None, None).run(&mut store, &[Step::Replies])?;

    let counts = table(
        &store,
        "SELECT message_id, CAST(replies_count AS REAL) FROM message_replies",
    )?;

    // Recompute the expectation straight from `answer`.
    let mut stmt = store.conn().prepare(
        "SELECT reply_to_msg_id, COUNT(*) FROM answer
         WHERE reply_to_msg_id IS NOT NULL AND text IS NOT NULL AND text != ''
         GROUP BY reply_to_msg_id",
    )?;
    let expected: Vec<(i64, i64)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<Result<_, _>>()?;

    for (id, n) in expected {
        assert_eq!(counts[&id] as i64, n, "message {id}");
    }
    assert_eq!(counts[&10], 2.0);
    assert_eq!(counts[&11], 1.0);
    assert_eq!(counts[&16], 0.0);
    assert_eq!(counts.len(), 7);
    Ok(())
}

#[test]
fn sentiment_row_per_answer_row() -> anyhow::Result<()> {
    let mut store = seeded_store()?;
    let model = fake();
    let summary = Pipeline::new(Some(model.clone()), None).run(&mut store, &[Step::Sentiment])?;
    assert_eq!(summary.steps[0].rows, 7);

    let values = table(&store, "SELECT message_id, value FROM sentiment")?;
    assert_eq!(values.len(), 7);

    let mut stmt = store.conn().prepare("SELECT message_id, text FROM answer")?;
    let rows: Vec<(i64, Option<String>)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<Result<_, _>>()?;

    for (id, text) in rows {
        let p = &model.predict(&[text.as_deref().unwrap_or("")])?[0];
        let expected = p.get(SentimentLabel::Positive) - p.get(SentimentLabel::Negative);
        assert!((values[&id] - expected).abs() < 1e-9, "message {id}");
        assert!((-1.0..=1.0).contains(&values[&id]));
    }
    Ok(())
}

#[test]
fn full_run_is_idempotent() -> anyhow::Result<()> {
    let mut store = seeded_store()?;
    let pipeline = Pipeline::new(Some(fake()), None);

    pipeline.run(&mut store, &Step::ALL)?;
    let first = table(&store, "SELECT message_id, value FROM sentiment")?;

    let summary = pipeline.run(&mut store, &Step::ALL)?;
    let second = table(&store, "SELECT message_id, value FROM sentiment")?;

    assert_eq!(first, second);
    assert_eq!(store.count_rows("message_replies")?, 7);
    assert_eq!(store.count_rows("sentiment")?, 7);
    assert_eq!(summary.steps.len(), 2);
    assert_eq!(summary.predictions, 7);
    Ok(())
}

#[test]
fn failing_model_keeps_previous_sentiment_table() -> anyhow::Result<()> {
    let mut store = seeded_store()?;
    let fixed = Prediction::new([
        (SentimentLabel::Positive, 0.25),
        (SentimentLabel::Negative, 0.5),
    ]);
    Pipeline::new(Some(Arc::new(FakeModel::fixed(fixed))), None)
        .run(&mut store, &[Step::Sentiment])?;

    let err = Pipeline::new(Some(Arc::new(FakeModel::failing("gpu on fire"))), None)
        .run(&mut store, &[Step::Sentiment])
        .unwrap_err();
    assert!(format!("{:#}", err).contains("gpu on fire"));

    let values = table(&store, "SELECT message_id, value FROM sentiment")?;
    assert_eq!(values.len(), 7);
    assert!(values.values().all(|v| (*v + 0.25).abs() < 1e-9));
    Ok(())
}

#[test]
fn sentiment_without_model_is_rejected() -> anyhow::Result<()> {
    let mut store = seeded_store()?;
    let err = Pipeline::new(None, None)
        .run(&mut store, &[Step::Sentiment])
        .unwrap_err();
    assert!(err.to_string().contains("requires a model"));
    assert!(!store.table_exists("sentiment")?);
    Ok(())
}

#[test]
fn missing_answer_table_fails_before_touching_db() -> anyhow::Result<()> {
    let mut store = Store::memory()?;
    let err = Pipeline::new(Some(fake()), None)
        .run(&mut store, &Step::ALL)
        .unwrap_err();
    assert!(err.to_string().contains("'answer' not found"));
    assert!(!store.table_exists("message_replies")?);
    Ok(())
}
