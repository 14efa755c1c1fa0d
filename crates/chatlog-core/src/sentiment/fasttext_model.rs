//! Supervised fastText classifier (`.bin`), e.g. the social-network sentiment
//! models trained with labels `__label__positive`, `__label__negative`, ...

use super::tokenizer::RegexTokenizer;
use super::{Prediction, SentimentModel};
use crate::errors::ConfigError;
use ::fasttext::FastText;
use sha2::{Digest, Sha256};
use std::path::Path;

const LABEL_PREFIX: &str = "__label__";

pub struct FastTextModel {
    inner: FastText,
    tokenizer: RegexTokenizer,
    name: String,
    fingerprint: String,
}

impl FastTextModel {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut file = std::fs::File::open(path).map_err(|e| {
            ConfigError(format!("failed to open fastText model {}: {}", path.display(), e))
        })?;
        let mut h = Sha256::new();
        std::io::copy(&mut file, &mut h)?;

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError(format!("non UTF-8 model path: {}", path.display())))?;
        let mut inner = FastText::new();
        inner.load_model(path_str).map_err(|e| {
            ConfigError(format!("failed to load fastText model {}: {}", path.display(), e))
        })?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "fasttext".to_string());
        let fingerprint = format!("fasttext|{}|{}", name, hex::encode(h.finalize()));

        Ok(Self {
            inner,
            tokenizer: RegexTokenizer::new()?,
            name,
            fingerprint,
        })
    }

    fn predict_one(&self, text: &str) -> anyhow::Result<Prediction> {
        // fastText reads one line per example; tokens joined by spaces never
        // contain a newline.
        let line = self.tokenizer.tokenize(text).join(" ");
        let preds = self
            .inner
            .predict(&line, -1, 0.0)
            .map_err(|e| anyhow::anyhow!("fastText prediction failed: {}", e))?;
        Ok(to_prediction(
            preds.iter().map(|p| (p.label.as_str(), p.prob)),
        ))
    }
}

/// Strips `__label__` and keeps the labels we score with.
fn to_prediction<'a>(preds: impl IntoIterator<Item = (&'a str, f32)>) -> Prediction {
    Prediction::from_named(
        preds
            .into_iter()
            .map(|(label, prob)| (label.strip_prefix(LABEL_PREFIX).unwrap_or(label), prob as f64)),
    )
}

impl SentimentModel for FastTextModel {
    fn predict(&self, texts: &[&str]) -> anyhow::Result<Vec<Prediction>> {
        texts.iter().map(|t| self.predict_one(t)).collect()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::SentimentLabel;

    #[test]
    fn labels_lose_their_prefix() {
        let p = to_prediction([
            ("__label__positive", 0.625),
            ("__label__negative", 0.125),
            ("__label__speech", 0.25),
            ("__label__sarcasm", 0.5),
        ]);
        assert_eq!(p.get(SentimentLabel::Positive), 0.625);
        assert_eq!(p.get(SentimentLabel::Speech), 0.25);
        assert_eq!(p.probs.len(), 3);
        assert!((p.score() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn missing_model_file_is_config_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let err = FastTextModel::load(&dir.path().join("social.bin"))
            .err()
            .unwrap();
        assert!(err.is::<ConfigError>(), "{err:#}");
        Ok(())
    }
}
