use super::{Prediction, SentimentModel};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

/// Classifier served over HTTP.
///
/// Request: `POST {endpoint}` with `{"model": .., "texts": [..]}`.
/// Response: `{"predictions": [{"positive": 0.7, "negative": 0.1, ..}, ..]}`,
/// one object per text.
pub struct HttpModel {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub client: reqwest::blocking::Client,
}

impl HttpModel {
    pub fn new(
        endpoint: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            endpoint,
            model,
            api_key,
            client,
        })
    }
}

pub(crate) fn parse_predictions(
    body: &serde_json::Value,
    expected: usize,
) -> anyhow::Result<Vec<Prediction>> {
    let items = body
        .get("predictions")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("sentiment API response missing 'predictions' array"))?;

    if items.len() != expected {
        anyhow::bail!(
            "sentiment API returned {} predictions for {} texts",
            items.len(),
            expected
        );
    }

    items
        .iter()
        .map(|item| {
            let probs: BTreeMap<String, f64> = serde_json::from_value(item.clone())
                .map_err(|e| anyhow::anyhow!("invalid prediction object {}: {}", item, e))?;
            Ok(Prediction::from_named(
                probs.iter().map(|(k, v)| (k.as_str(), *v)),
            ))
        })
        .collect()
}

impl SentimentModel for HttpModel {
    fn predict(&self, texts: &[&str]) -> anyhow::Result<Vec<Prediction>> {
        let body = json!({
            "model": self.model,
            "texts": texts,
        });

        let mut req = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().unwrap_or_default();
            anyhow::bail!("sentiment API error ({}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json()?;
        parse_predictions(&json, texts.len())
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn fingerprint(&self) -> String {
        format!("http|{}|{}", self.endpoint, self.model)
    }
}
