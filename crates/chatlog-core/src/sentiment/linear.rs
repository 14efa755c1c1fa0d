//! Pretrained bag-of-n-grams linear classifier.
//!
//! Weights are shipped as JSON:
//!
//! ```json
//! {
//!   "name": "social-ru",
//!   "version": "3",
//!   "ngrams": 2,
//!   "bias": { "neutral": 0.4, "skip": 0.1 },
//!   "weights": { "отлично": { "positive": 2.1 }, "not good": { "negative": 1.7 } }
//! }
//! ```
//!
//! Logits are `bias + mean(weights of known features)`, turned into
//! probabilities with a softmax over [`SentimentLabel::ALL`].

use super::tokenizer::RegexTokenizer;
use super::{Prediction, SentimentLabel, SentimentModel};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearWeights {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_ngrams")]
    pub ngrams: usize,
    #[serde(default)]
    pub bias: BTreeMap<SentimentLabel, f64>,
    pub weights: BTreeMap<String, BTreeMap<SentimentLabel, f64>>,
}

fn default_version() -> String {
    "1".to_string()
}

fn default_ngrams() -> usize {
    1
}

pub struct LinearModel {
    weights: LinearWeights,
    tokenizer: RegexTokenizer,
    fingerprint: String,
}

impl LinearModel {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError(format!("failed to read model weights {}: {}", path.display(), e))
        })?;
        let weights: LinearWeights = serde_json::from_str(&raw).map_err(|e| {
            ConfigError(format!("failed to parse model weights {}: {}", path.display(), e))
        })?;

        let mut h = Sha256::new();
        h.update(raw.as_bytes());
        let fingerprint = format!("linear|{}|{}", weights.name, hex::encode(h.finalize()));

        tracing::debug!(
            event = "linear_weights_parsed",
            name = %weights.name,
            version = %weights.version,
            features = weights.weights.len(),
            path = %path.display()
        );

        Self::build(weights, fingerprint)
    }

    pub fn from_weights(weights: LinearWeights) -> anyhow::Result<Self> {
        let canonical = serde_json::to_string(&weights)?;
        let mut h = Sha256::new();
        h.update(canonical.as_bytes());
        let fingerprint = format!("linear|{}|{}", weights.name, hex::encode(h.finalize()));
        Self::build(weights, fingerprint)
    }

    fn build(weights: LinearWeights, fingerprint: String) -> anyhow::Result<Self> {
        if weights.ngrams == 0 {
            anyhow::bail!("config error: model '{}' has ngrams = 0", weights.name);
        }
        Ok(Self {
            weights,
            tokenizer: RegexTokenizer::new()?,
            fingerprint,
        })
    }

    fn predict_one(&self, text: &str) -> Prediction {
        let mut sums: BTreeMap<SentimentLabel, f64> = BTreeMap::new();
        let mut known = 0usize;

        for feature in self.tokenizer.features(text, self.weights.ngrams) {
            // Out-of-vocabulary features are skipped, not averaged in as zeros.
            let Some(w) = self.weights.weights.get(&feature) else {
                continue;
            };
            known += 1;
            for (label, v) in w {
                *sums.entry(*label).or_insert(0.0) += v;
            }
        }

        let logits: Vec<(SentimentLabel, f64)> = SentimentLabel::ALL
            .iter()
            .map(|label| {
                let bias = self.weights.bias.get(label).copied().unwrap_or(0.0);
                let mean = if known > 0 {
                    sums.get(label).copied().unwrap_or(0.0) / known as f64
                } else {
                    0.0
                };
                (*label, bias + mean)
            })
            .collect();

        Prediction::new(softmax(&logits))
    }
}

fn softmax(logits: &[(SentimentLabel, f64)]) -> Vec<(SentimentLabel, f64)> {
    let max = logits
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<(SentimentLabel, f64)> =
        logits.iter().map(|(l, v)| (*l, (v - max).exp())).collect();
    let total: f64 = exps.iter().map(|(_, v)| v).sum();
    exps.into_iter().map(|(l, v)| (l, v / total)).collect()
}

impl SentimentModel for LinearModel {
    fn predict(&self, texts: &[&str]) -> anyhow::Result<Vec<Prediction>> {
        Ok(texts.iter().map(|t| self.predict_one(t)).collect())
    }

    fn name(&self) -> &str {
        &self.weights.name
    }

    fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }
}

/// Small English/Russian starter model written by `chatlog init`.
pub const SAMPLE_WEIGHTS_JSON: &str = r#"{
  "name": "chatlog-sample",
  "version": "1",
  "ngrams": 2,
  "bias": { "neutral": 0.5, "skip": -0.5, "speech": -1.0 },
  "weights": {
    "good": { "positive": 3.0 },
    "great": { "positive": 3.5 },
    "thanks": { "positive": 2.5, "speech": 1.0 },
    "love": { "positive": 3.5 },
    ":)": { "positive": 2.5 },
    "))": { "positive": 2.0 },
    "bad": { "negative": 3.0 },
    "awful": { "negative": 3.5 },
    "hate": { "negative": 3.5 },
    ":(": { "negative": 2.5 },
    "not good": { "negative": 6.0, "positive": -6.0 },
    "хорошо": { "positive": 3.0 },
    "отлично": { "positive": 3.5 },
    "спасибо": { "positive": 2.5, "speech": 1.0 },
    "плохо": { "negative": 3.0 },
    "ужасно": { "negative": 3.5 },
    "hello": { "speech": 3.0 },
    "привет": { "speech": 3.0 }
  }
}
"#;
