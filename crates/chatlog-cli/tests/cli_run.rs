use assert_cmd::Command;
use predicates::str::contains;
use std::path::Path;
use tempfile::TempDir;

fn seed_db(path: &Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(
        r#"
CREATE TABLE answer (message_id INTEGER, date TEXT, text TEXT, reply_to_msg_id INTEGER);
INSERT INTO answer VALUES (1, '2021-05-01', 'good morning', NULL);
INSERT INTO answer VALUES (2, '2021-05-01', 'bad idea', 1);
INSERT INTO answer VALUES (3, '2021-05-01', '', 1);
INSERT INTO answer VALUES (4, '2021-05-02', 'ok', 2);
"#,
    )
    .unwrap();
}

fn chatlog(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("chatlog").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("CHATLOG_DB")
        .env("CHATLOG_LOG", "warn");
    cmd
}

#[test]
fn run_with_fake_provider_builds_both_tables() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("result.db");
    seed_db(&db);

    chatlog(&dir)
        .args(["run", "--provider", "fake", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stderr(contains("message_replies"))
        .stderr(contains("sentiment"));

    let conn = rusqlite::Connection::open(&db).unwrap();
    let replies: i64 = conn
        .query_row(
            "SELECT replies_count FROM message_replies WHERE message_id = 1",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(replies, 1);

    let value: f64 = conn
        .query_row("SELECT value FROM sentiment WHERE message_id = 2", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert!(value < 0.0);
}

#[test]
fn db_path_from_env() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("chat.db");
    seed_db(&db);

    chatlog(&dir)
        .arg("replies")
        .env("CHATLOG_DB", &db)
        .assert()
        .success();

    let conn = rusqlite::Connection::open(&db).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM message_replies", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 4);
}

#[test]
fn missing_answer_table_is_config_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("empty.db");
    rusqlite::Connection::open(&db)
        .unwrap()
        .execute_batch("CREATE TABLE users (id INTEGER);")
        .unwrap();

    chatlog(&dir)
        .args(["run", "--provider", "fake", "--db"])
        .arg(&db)
        .assert()
        .code(2)
        .stderr(contains("source table 'answer' not found"));
}

#[test]
fn missing_database_is_config_error() {
    let dir = TempDir::new().unwrap();
    chatlog(&dir)
        .args(["replies", "--db", "nope.db"])
        .assert()
        .code(2)
        .stderr(contains("database not found"));
    assert!(!dir.path().join("nope.db").exists());
}

#[test]
fn sentiment_without_model_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("result.db");
    seed_db(&db);

    chatlog(&dir)
        .args(["sentiment", "--db"])
        .arg(&db)
        .assert()
        .code(2)
        .stderr(contains("requires a model file"));
}

#[test]
fn missing_model_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("result.db");
    seed_db(&db);

    chatlog(&dir)
        .args(["run", "--model", "missing.json", "--db"])
        .arg(&db)
        .assert()
        .code(2)
        .stderr(contains("failed to read model weights"));

    // The model is loaded before any step runs.
    let conn = rusqlite::Connection::open(&db).unwrap();
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'message_replies'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn init_in_subdirectory_then_run() {
    let dir = TempDir::new().unwrap();
    seed_db(&dir.path().join("result.db"));

    chatlog(&dir)
        .args(["init", "--config", "conf/chatlog.yaml", "--model", "conf/m.json"])
        .assert()
        .success();
    assert!(dir.path().join("conf").join("m.json").exists());

    chatlog(&dir)
        .args(["run", "--config", "conf/chatlog.yaml", "--db", "result.db"])
        .assert()
        .success()
        .stderr(contains("sentiment"));

    let conn = rusqlite::Connection::open(dir.path().join("result.db")).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM sentiment", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 4);
}

#[test]
fn doctor_does_not_create_cache() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("result.db");
    seed_db(&db);

    chatlog(&dir)
        .args(["doctor", "--no-model-check", "--cache", "--db"])
        .arg(&db)
        .assert()
        .success();
    assert!(!dir.path().join(".chatlog").exists());
}

#[test]
fn init_then_run_with_sample_model() {
    let dir = TempDir::new().unwrap();
    seed_db(&dir.path().join("result.db"));

    chatlog(&dir)
        .args(["init", "--gitignore"])
        .assert()
        .success()
        .stderr(contains("created chatlog.yaml"));
    assert!(dir.path().join("sentiment-model.json").exists());
    assert!(dir.path().join(".gitignore").exists());

    // Second init leaves existing files alone.
    chatlog(&dir)
        .arg("init")
        .assert()
        .success()
        .stderr(contains("already exists"));

    chatlog(&dir)
        .args(["run", "--cache"])
        .assert()
        .success()
        .stderr(contains("sentiment"));
    assert!(dir.path().join(".chatlog").join("cache.db").exists());
}

#[test]
fn doctor_json_reports_tables() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("result.db");
    seed_db(&db);

    let out = chatlog(&dir)
        .args(["doctor", "--format", "json", "--provider", "fake", "--db"])
        .arg(&db)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["schema_version"], 1);
    assert_eq!(report["db"]["answer_rows"], 4);
    assert_eq!(report["model"]["name"], "fake");
    assert!(report["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn doctor_flags_missing_database() {
    let dir = TempDir::new().unwrap();
    chatlog(&dir)
        .args(["doctor", "--no-model-check", "--db", "missing.db"])
        .assert()
        .code(2)
        .stderr(contains("E_DB_MISSING"));
}

#[test]
fn version_prints_crate_version() {
    let dir = TempDir::new().unwrap();
    chatlog(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn model_load_is_logged_once() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("result.db");
    seed_db(&db);
    std::fs::write(
        dir.path().join("m.json"),
        chatlog_core::sentiment::linear::SAMPLE_WEIGHTS_JSON,
    )
    .unwrap();

    let out = chatlog(&dir)
        .env("CHATLOG_LOG", "info")
        .args(["--log-json", "sentiment", "--model", "m.json", "--db"])
        .arg(&db)
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();

    let stderr = String::from_utf8(out).unwrap();
    assert_eq!(
        stderr.matches("\"event\":\"model_loaded\"").count(),
        1,
        "{stderr}"
    );
}
