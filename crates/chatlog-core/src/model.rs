use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DB: &str = "result.db";
pub const DEFAULT_CACHE_DB: &str = ".chatlog/cache.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatlogConfig {
    #[serde(default, rename = "configVersion", alias = "version")]
    pub version: u32,
    #[serde(default = "default_db")]
    pub db: PathBuf,
    /// Empty means every step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub sentiment: SentimentSettings,
}

fn default_db() -> PathBuf {
    PathBuf::from(DEFAULT_DB)
}

impl Default for ChatlogConfig {
    fn default() -> Self {
        Self {
            version: 1,
            db: default_db(),
            steps: vec![],
            sentiment: SentimentSettings::default(),
        }
    }
}

impl ChatlogConfig {
    pub fn is_legacy(&self) -> bool {
        self.version == 0
    }

    /// Steps to run, in execution order.
    pub fn effective_steps(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            return Step::ALL.to_vec();
        }
        Step::ALL
            .iter()
            .copied()
            .filter(|s| self.steps.contains(s))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Replies,
    Sentiment,
}

impl Step {
    pub const ALL: [Step; 2] = [Step::Replies, Step::Sentiment];

    pub fn table(&self) -> &'static str {
        match self {
            Step::Replies => crate::storage::schema::MESSAGE_REPLIES_TABLE,
            Step::Sentiment => crate::storage::schema::SENTIMENT_TABLE,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Replies => f.write_str("replies"),
            Step::Sentiment => f.write_str("sentiment"),
        }
    }
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replies" => Ok(Step::Replies),
            "sentiment" => Ok(Step::Sentiment),
            other => anyhow::bail!("unknown step '{}' (expected replies|sentiment)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Linear,
    Http,
    Fasttext,
    Fake,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(ProviderKind::Linear),
            "http" => Ok(ProviderKind::Http),
            "fasttext" => Ok(ProviderKind::Fasttext),
            "fake" => Ok(ProviderKind::Fake),
            other => anyhow::bail!("unknown provider '{}' (expected linear|http|fasttext|fake)", other),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Linear => f.write_str("linear"),
            ProviderKind::Http => f.write_str("http"),
            ProviderKind::Fasttext => f.write_str("fasttext"),
            ProviderKind::Fake => f.write_str("fake"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SentimentSettings {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Model name sent to the http provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

impl SentimentSettings {
    pub fn cache_enabled(&self) -> bool {
        self.cache.unwrap_or(false)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DB))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub table: String,
    pub rows: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub db: String,
    pub steps: Vec<StepOutcome>,
    pub model: Option<String>,
    pub predictions: u64,
    pub cache_hits: u64,
    pub duration_ms: u64,
}
