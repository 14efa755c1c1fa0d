use super::{Prediction, SentimentLabel, SentimentModel};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic model for tests and dry runs.
///
/// Texts containing "good" lean positive, "bad" lean negative, anything else
/// is neutral.
pub struct FakeModel {
    mode: Mode,
    calls: AtomicUsize,
}

enum Mode {
    Keyword,
    Fixed(Prediction),
    Failing(String),
}

impl FakeModel {
    pub fn keyword() -> Self {
        Self::with_mode(Mode::Keyword)
    }

    pub fn fixed(prediction: Prediction) -> Self {
        Self::with_mode(Mode::Fixed(prediction))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_mode(Mode::Failing(message.into()))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of texts scored so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn keyword_prediction(text: &str) -> Prediction {
        let lower = text.to_lowercase();
        let (pos, neg) = match (lower.contains("good"), lower.contains("bad")) {
            (true, false) => (0.8, 0.1),
            (false, true) => (0.1, 0.7),
            (true, true) => (0.4, 0.4),
            (false, false) => (0.05, 0.05),
        };
        let rest = 1.0 - pos - neg;
        Prediction::new([
            (SentimentLabel::Positive, pos),
            (SentimentLabel::Negative, neg),
            (SentimentLabel::Neutral, rest),
        ])
    }
}

impl SentimentModel for FakeModel {
    fn predict(&self, texts: &[&str]) -> anyhow::Result<Vec<Prediction>> {
        if let Mode::Failing(msg) = &self.mode {
            anyhow::bail!("{}", msg);
        }
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| match &self.mode {
                Mode::Fixed(p) => p.clone(),
                _ => Self::keyword_prediction(t),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn fingerprint(&self) -> String {
        match &self.mode {
            Mode::Keyword => "fake|keyword".to_string(),
            Mode::Fixed(p) => format!("fake|fixed|{:.6}", p.score()),
            Mode::Failing(_) => "fake|failing".to_string(),
        }
    }
}
