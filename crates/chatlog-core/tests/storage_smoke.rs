use chatlog_core::cache::PredictionCache;
use chatlog_core::engine::Pipeline;
use chatlog_core::model::Step;
use chatlog_core::sentiment::fake::FakeModel;
use chatlog_core::storage::Store;
use std::sync::Arc;

fn seed(path: &std::path::Path) -> anyhow::Result<()> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE answer (message_id INTEGER, date TEXT, text TEXT, reply_to_msg_id INTEGER);
         INSERT INTO answer VALUES (1, '2021-01-01', 'good news', NULL);
         INSERT INTO answer VALUES (2, '2021-01-01', 'bad news', 1);
         INSERT INTO answer VALUES (3, '2021-01-01', 'good news', 1);",
    )?;
    Ok(())
}

#[test]
fn file_db_lifecycle() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("result.db");
    seed(&db)?;

    {
        let mut store = Store::open(&db)?;
        assert_eq!(store.path(), Some(db.as_path()));
        let summary = Pipeline::new(Some(Arc::new(FakeModel::keyword())), None)
            .run(&mut store, &Step::ALL)?;
        assert_eq!(summary.db, db.display().to_string());
        assert_eq!(summary.model.as_deref(), Some("fake"));
    }

    // Reopen from disk: derived tables were committed.
    let store = Store::open(&db)?;
    let stats = store.stats_best_effort();
    assert_eq!(stats.answer_rows, Some(3));
    assert_eq!(stats.message_replies_rows, Some(3));
    assert_eq!(stats.sentiment_rows, Some(3));

    let replies: i64 = store.conn().query_row(
        "SELECT replies_count FROM message_replies WHERE message_id = 1",
        [],
        |r| r.get(0),
    )?;
    assert_eq!(replies, 2);
    Ok(())
}

#[test]
fn cache_persists_across_runs() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("result.db");
    let cache_path = dir.path().join(".chatlog").join("cache.db");
    seed(&db)?;

    let first = {
        let mut store = Store::open(&db)?;
        let cache = PredictionCache::open(&cache_path)?;
        Pipeline::new(Some(Arc::new(FakeModel::keyword())), Some(cache))
            .run(&mut store, &[Step::Sentiment])?
    };
    // "good news" repeats, so the second occurrence is already cached.
    assert_eq!(first.predictions, 2);
    assert_eq!(first.cache_hits, 1);
    assert!(cache_path.exists());

    let model = Arc::new(FakeModel::keyword());
    let second = {
        let mut store = Store::open(&db)?;
        let cache = PredictionCache::open(&cache_path)?;
        Pipeline::new(Some(model.clone()), Some(cache)).run(&mut store, &[Step::Sentiment])?
    };
    assert_eq!(second.predictions, 0);
    assert_eq!(second.cache_hits, 3);
    assert_eq!(model.calls(), 0);

    assert_eq!(PredictionCache::open(&cache_path)?.len()?, 2);
    Ok(())
}

#[test]
fn unrelated_tables_are_untouched() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("result.db");
    seed(&db)?;
    {
        let conn = rusqlite::Connection::open(&db)?;
        conn.execute_batch("CREATE TABLE users (id INTEGER); INSERT INTO users VALUES (42);")?;
    }

    let mut store = Store::open(&db)?;
    Pipeline::new(None, None).run(&mut store, &[Step::Replies])?;

    let id: i64 = store
        .conn()
        .query_row("SELECT id FROM users", [], |r| r.get(0))?;
    assert_eq!(id, 42);
    assert_eq!(store.count_rows("answer")?, 3);
    assert!(!store.table_exists("sentiment")?);
    Ok(())
}
