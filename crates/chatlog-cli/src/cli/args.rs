use chatlog_core::model::{ProviderKind, Step};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chatlog",
    version,
    about = "Derive reply counts and message sentiment from a chat-log SQLite export"
)]
pub struct Cli {
    /// emit logs as JSON lines on stderr (level from CHATLOG_LOG)
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rebuild message_replies and sentiment
    Run(RunArgs),
    /// Rebuild message_replies only
    Replies(DbArgs),
    /// Rebuild sentiment only
    Sentiment(SentimentArgs),
    /// Check the database, model and cache without writing anything
    Doctor(DoctorArgs),
    /// Write a sample chatlog.yaml and linear model
    Init(InitArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// chat-log database holding the `answer` table
    #[arg(long, env = "CHATLOG_DB")]
    pub db: Option<PathBuf>,

    /// config file (chatlog.yaml is picked up when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// reject unknown config fields
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// sentiment provider (linear|http|fasttext|fake)
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// model file: linear weights (JSON) or fastText supervised model (.bin)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// prediction endpoint for the http provider
    #[arg(long)]
    pub endpoint: Option<String>,

    /// model name sent to the http provider
    #[arg(long)]
    pub model_name: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// reuse scores from the prediction cache
    #[arg(long, conflicts_with = "no_cache")]
    pub cache: bool,

    #[arg(long)]
    pub no_cache: bool,

    #[arg(long)]
    pub cache_path: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub db: DbArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// run a subset of steps (repeatable or comma separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<Step>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SentimentArgs {
    #[command(flatten)]
    pub db: DbArgs,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub db: DbArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// skip loading the sentiment model
    #[arg(long)]
    pub no_model_check: bool,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json

    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "chatlog.yaml")]
    pub config: PathBuf,

    /// where to write the sample linear model
    #[arg(long, default_value = "sentiment-model.json")]
    pub model: PathBuf,

    /// generate .gitignore entry for the prediction cache
    #[arg(long)]
    pub gitignore: bool,
}
