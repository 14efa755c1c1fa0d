pub use chatlog_core::sentiment::linear::SAMPLE_WEIGHTS_JSON as SAMPLE_MODEL_JSON;

pub const GITIGNORE: &str = r#"# chatlog prediction cache
.chatlog/
"#;
