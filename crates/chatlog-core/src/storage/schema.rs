/// Chat messages table produced by the exporter. Read-only for us.
pub const SOURCE_TABLE: &str = "answer";
pub const SOURCE_COLUMNS: [&str; 3] = ["message_id", "text", "reply_to_msg_id"];

pub const MESSAGE_REPLIES_TABLE: &str = "message_replies";
pub const SENTIMENT_TABLE: &str = "sentiment";

pub const MESSAGE_REPLIES_DDL: &str = r#"
DROP TABLE IF EXISTS message_replies;
CREATE TABLE message_replies (
  message_id INTEGER,
  replies_count INTEGER
);
"#;

pub const SENTIMENT_DDL: &str = r#"
DROP TABLE IF EXISTS sentiment;
CREATE TABLE sentiment (
  message_id INTEGER,
  value REAL
);
"#;

/// Lives in its own database file, never in the chat log.
pub const CACHE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS sentiment_cache (
  key TEXT PRIMARY KEY,
  model TEXT NOT NULL,
  value REAL NOT NULL,
  created_at TEXT NOT NULL
);
"#;
