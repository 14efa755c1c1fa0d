use super::args::*;
use chatlog_core::config::{load_config, DEFAULT_CONFIG_FILE, SAMPLE_CONFIG_YAML};
use chatlog_core::errors::{ConfigError, SourceTableError};
use chatlog_core::model::ChatlogConfig;
use std::path::{Path, PathBuf};

pub mod doctor;
pub mod run;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
    pub const RUNTIME_ERROR: i32 = 3;
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let res = match cli.cmd {
        Command::Run(args) => run::cmd_run(args),
        Command::Replies(db) => run::cmd_run(RunArgs {
            db,
            only: vec![chatlog_core::model::Step::Replies],
            ..Default::default()
        }),
        Command::Sentiment(args) => run::cmd_run(RunArgs {
            db: args.db,
            model: args.model,
            only: vec![chatlog_core::model::Step::Sentiment],
        }),
        Command::Doctor(args) => doctor::run(args),
        Command::Init(args) => cmd_init(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    };

    match res {
        Err(e) if is_config_error(&e) => {
            eprintln!("{:#}", e);
            Ok(exit_codes::CONFIG_ERROR)
        }
        other => other,
    }
}

/// Bad config or an input database without a usable `answer` table.
fn is_config_error(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause.is::<ConfigError>()
            || cause.is::<SourceTableError>()
            || cause.to_string().starts_with("config error")
            || cause.to_string().starts_with("database not found")
    })
}

/// Loads `--config`, or `chatlog.yaml` in the working directory when present,
/// and applies the command-line overrides on top.
pub(crate) fn resolve_config(
    db: &DbArgs,
    model: Option<&ModelArgs>,
) -> anyhow::Result<(ChatlogConfig, Option<PathBuf>)> {
    let config_path = match &db.config {
        Some(p) => Some(p.clone()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };

    let mut cfg = match &config_path {
        Some(p) => load_config(p, db.strict)?,
        None => ChatlogConfig::default(),
    };

    if let Some(path) = &db.db {
        cfg.db = path.clone();
    }

    if let Some(m) = model {
        let s = &mut cfg.sentiment;
        if let Some(p) = m.provider {
            s.provider = p;
        }
        if let Some(p) = &m.model {
            s.model_path = Some(p.clone());
        }
        if let Some(e) = &m.endpoint {
            s.endpoint = Some(e.clone());
        }
        if let Some(n) = &m.model_name {
            s.model = Some(n.clone());
        }
        if let Some(t) = m.timeout_seconds {
            if t == 0 {
                return Err(ConfigError("--timeout-seconds must be > 0".into()).into());
            }
            s.timeout_seconds = Some(t);
        }
        if m.cache {
            s.cache = Some(true);
        }
        if m.no_cache {
            s.cache = Some(false);
        }
        if let Some(p) = &m.cache_path {
            s.cache_path = Some(p.clone());
        }
    }

    tracing::debug!(
        event = "config_resolved",
        config = ?config_path,
        db = %cfg.db.display(),
        provider = %cfg.sentiment.provider
    );
    Ok((cfg, config_path))
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    let model_ref = model_path_for_config(&args.config, &args.model)?;
    let config = SAMPLE_CONFIG_YAML.replace(
        "sentiment-model.json",
        &model_ref.display().to_string(),
    );
    write_file_if_missing(&args.config, &config)?;
    write_file_if_missing(&args.model, crate::templates::SAMPLE_MODEL_JSON)?;

    if args.gitignore {
        write_file_if_missing(Path::new(".gitignore"), crate::templates::GITIGNORE)?;
    }

    Ok(exit_codes::OK)
}

/// `load_config` resolves paths against the config file's directory, so the
/// model path written into the config must be relative to that directory.
fn model_path_for_config(config: &Path, model: &Path) -> anyhow::Result<PathBuf> {
    if model.is_absolute() {
        return Ok(model.to_path_buf());
    }
    let base = config.parent().unwrap_or(Path::new(""));
    if let Ok(rel) = model.strip_prefix(base) {
        return Ok(rel.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(model))
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}
