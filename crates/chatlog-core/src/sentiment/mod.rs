use crate::model::{ProviderKind, SentimentSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub mod fake;
#[cfg(feature = "fasttext")]
pub mod fasttext_model;
pub mod http;
pub mod linear;
pub mod tokenizer;

/// Classes emitted by social-network sentiment classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Skip,
    Speech,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 5] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Skip,
        SentimentLabel::Speech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Skip => "skip",
            SentimentLabel::Speech => "speech",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            "skip" => Ok(SentimentLabel::Skip),
            "speech" => Ok(SentimentLabel::Speech),
            other => anyhow::bail!("unknown sentiment label: {}", other),
        }
    }
}

/// Probability distribution over labels for a single text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prediction {
    pub probs: BTreeMap<SentimentLabel, f64>,
}

impl Prediction {
    pub fn new(probs: impl IntoIterator<Item = (SentimentLabel, f64)>) -> Self {
        Self {
            probs: probs.into_iter().collect(),
        }
    }

    /// Builds a prediction from loosely-typed label names, dropping labels we
    /// do not know about.
    pub fn from_named<'a>(probs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let probs = probs
            .into_iter()
            .filter_map(|(name, p)| name.parse::<SentimentLabel>().ok().map(|l| (l, p)))
            .collect();
        Self { probs }
    }

    pub fn get(&self, label: SentimentLabel) -> f64 {
        self.probs.get(&label).copied().unwrap_or(0.0)
    }

    /// `positive - negative`, clamped to [-1, 1].
    pub fn score(&self) -> f64 {
        let pos = self.get(SentimentLabel::Positive);
        let neg = self.get(SentimentLabel::Negative);
        let v = pos - neg;
        if v.is_nan() {
            tracing::warn!(
                event = "sentiment_score_nan",
                positive = pos,
                negative = neg,
                "model returned NaN probabilities; scoring as 0"
            );
            return 0.0;
        }
        if !(-1.0..=1.0).contains(&v) {
            tracing::warn!(
                event = "sentiment_score_clamped",
                positive = pos,
                negative = neg,
                "probabilities are not normalized; clamping score to [-1, 1]"
            );
        }
        v.clamp(-1.0, 1.0)
    }

    pub fn top(&self) -> Option<(SentimentLabel, f64)> {
        self.probs
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(l, p)| (*l, *p))
    }
}

pub trait SentimentModel: Send + Sync {
    /// One prediction per input text, in input order.
    fn predict(&self, texts: &[&str]) -> anyhow::Result<Vec<Prediction>>;

    fn name(&self) -> &str;

    /// Changes whenever the model would score the same text differently.
    /// Used as part of the prediction cache key.
    fn fingerprint(&self) -> String;
}

/// Scores a single text. NULL text from the database is passed as `""`.
pub fn text_to_sentiment(model: &dyn SentimentModel, text: &str) -> anyhow::Result<f64> {
    let mut preds = model.predict(&[text])?;
    let pred = preds
        .pop()
        .ok_or_else(|| anyhow::anyhow!("model '{}' returned no prediction", model.name()))?;
    Ok(pred.score())
}

pub const API_KEY_ENV: &str = "CHATLOG_SENTIMENT_API_KEY";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub fn build_model(settings: &SentimentSettings) -> anyhow::Result<Arc<dyn SentimentModel>> {
    match settings.provider {
        ProviderKind::Linear => {
            let path = settings.model_path.as_ref().ok_or_else(|| {
                anyhow::anyhow!(
                    "config error: provider 'linear' requires a model file (--model or sentiment.model_path)"
                )
            })?;
            Ok(Arc::new(linear::LinearModel::load(path)?))
        }
        ProviderKind::Http => {
            let endpoint = settings.endpoint.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "config error: provider 'http' requires an endpoint (--endpoint or sentiment.endpoint)"
                )
            })?;
            let timeout = Duration::from_secs(
                settings
                    .timeout_seconds
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            );
            let model = settings
                .model
                .clone()
                .unwrap_or_else(|| "default".to_string());
            let api_key = std::env::var(API_KEY_ENV).ok();
            Ok(Arc::new(http::HttpModel::new(endpoint, model, api_key, timeout)?))
        }
        ProviderKind::Fasttext => {
            let path = settings.model_path.as_ref().ok_or_else(|| {
                anyhow::anyhow!(
                    "config error: provider 'fasttext' requires a model file (--model or sentiment.model_path)"
                )
            })?;
            load_fasttext(path)
        }
        ProviderKind::Fake => Ok(Arc::new(fake::FakeModel::keyword())),
    }
}

#[cfg(feature = "fasttext")]
fn load_fasttext(path: &std::path::Path) -> anyhow::Result<Arc<dyn SentimentModel>> {
    Ok(Arc::new(fasttext_model::FastTextModel::load(path)?))
}

#[cfg(not(feature = "fasttext"))]
fn load_fasttext(_path: &std::path::Path) -> anyhow::Result<Arc<dyn SentimentModel>> {
    anyhow::bail!("config error: chatlog was built without the 'fasttext' feature")
}
