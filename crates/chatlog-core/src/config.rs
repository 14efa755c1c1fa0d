use crate::errors::ConfigError;
use crate::model::ChatlogConfig;
use std::path::Path;

pub mod path_resolver;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "chatlog.yaml";

pub fn load_config(path: &Path, strict: bool) -> Result<ChatlogConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);

    // serde_ignored wrapper to capture unknown fields
    let mut cfg: ChatlogConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful_unknowns: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();

    if !meaningful_unknowns.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "Unknown fields detected in strict mode: {:?} (file: {})",
                meaningful_unknowns,
                path.display()
            )));
        }
        tracing::warn!(
            event = "config_unknown_fields",
            fields = ?meaningful_unknowns,
            file = %path.display(),
            "ignored unknown config fields"
        );
    }

    // Allow 0 or 1
    if cfg.version != 0 && cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: 0, {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    if cfg.sentiment.timeout_seconds == Some(0) {
        return Err(ConfigError("sentiment.timeout_seconds must be > 0".into()));
    }

    normalize_paths(&mut cfg, path);
    Ok(cfg)
}

fn normalize_paths(cfg: &mut ChatlogConfig, config_path: &Path) {
    let r = path_resolver::PathResolver::new(config_path);
    r.resolve(&mut cfg.db);
    r.resolve_opt(&mut cfg.sentiment.model_path);
    r.resolve_opt(&mut cfg.sentiment.cache_path);
}

pub const SAMPLE_CONFIG_YAML: &str = r#"configVersion: 1
db: result.db
# steps: [replies, sentiment]
sentiment:
  provider: linear
  model_path: sentiment-model.json
  cache: false
"#;

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG_YAML)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}
